// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Deadlock detection and stuck-state recovery.
//!
//! Driven by periodic external polling. Both probes sample hardware
//! without the device lock; only the forced-flush recovery path takes it,
//! through the normal flush machinery.

use log::{error, info, warn};
use votf_hw::types::DebugState;

use crate::device::RingDevice;
use crate::resolver::RegCandidates;
use crate::types::{EndpointId, VotfResult};

impl RingDevice {
    /// Detect a token-rendezvous deadlock between `src` and `dst`.
    ///
    /// If both sides report WAIT_CONNECTION simultaneously, each loaded a
    /// token toward a peer that never signalled ready. Recovery rejects
    /// the token on the source side and logs the debug states before and
    /// after for diagnosis. Rendezvous state is left untouched.
    pub fn check_wait_con(&self, src: &EndpointId, dst: &EndpointId) -> VotfResult<()> {
        let (src_entry, _) = self.lookup(src)?;
        self.lookup(dst)?;

        let src_raw = self.get_debug_state(src)?;
        let dst_raw = self.get_debug_state(dst)?;
        let both_waiting = DebugState::from_raw(src_raw) == Some(DebugState::WaitConnection)
            && DebugState::from_raw(dst_raw) == Some(DebugState::WaitConnection);
        if !both_waiting {
            return Ok(());
        }

        error!(
            "{}: connection deadlock {src} ({src_raw:#x}) <-> {dst} ({dst_raw:#x}), \
             rejecting token",
            self.name()
        );
        self.hw().reject_token(src_entry.addr, src_entry.module);

        let src_after = self.get_debug_state(src)?;
        let dst_after = self.get_debug_state(dst)?;
        warn!(
            "{}: debug state after reject: {src} {src_raw:#x} -> {src_after:#x}, \
             {dst} {dst_raw:#x} -> {dst_after:#x}",
            self.name()
        );
        Ok(())
    }

    /// Check both sides for fatal or stuck hardware states.
    ///
    /// WAIT_TOKEN_ACK / WAIT_RESET_ACK trigger a platform debug dump. A
    /// side reporting IDLE with its busy bit still set is wedged; it gets
    /// a forced flush, bypassing the usage-count gate.
    pub fn check_invalid_state(&self, src: &EndpointId, dst: &EndpointId) -> VotfResult<()> {
        for ep in [src, dst] {
            self.lookup(ep)?;
            let raw = self.get_debug_state(ep)?;
            match DebugState::from_raw(raw) {
                Some(DebugState::WaitTokenAck | DebugState::WaitResetAck) => {
                    self.hw().debug_dump(
                        true,
                        &format!("{}: {ep} stuck in debug state {raw:#x}", self.name()),
                    );
                }
                Some(DebugState::Idle) => {
                    if self.get_busy(ep)? {
                        warn!(
                            "{}: {ep} idle but busy still asserted, forcing flush",
                            self.name()
                        );
                        if let Err(err) = self.set_flush_alone(ep) {
                            warn!("{}: forced flush of {ep} failed: {err}", self.name());
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Log the enable, busy and state registers of every populated
    /// endpoint. A coarse capture for bug reports; reads go through the
    /// normal accessors so the dump shows what the manager would see.
    pub fn sfr_dump(&self) {
        for (ep, _) in self.table().populated() {
            let read = |candidates: &RegCandidates| {
                self.reg_addr(&ep, candidates)
                    .map(|addr| self.hw().read(addr))
            };
            let (Ok(enable), Ok(busy), Ok(state)) = (
                read(&RegCandidates::enable()),
                read(&RegCandidates::busy()),
                read(&RegCandidates::debug()),
            ) else {
                continue;
            };
            info!(
                "{}: {ep} enable={enable:#x} busy={busy:#x} state={state:#x}",
                self.name()
            );
        }
    }

    /// Disable every populated endpoint on this device.
    pub fn disable_service(&self) {
        for (ep, _) in self.table().populated() {
            match self.reg_addr(&ep, &RegCandidates::enable()) {
                Ok(addr) => self.hw().write(addr, 0),
                Err(err) => warn!("{}: disable of {ep} failed: {err}", self.name()),
            }
        }
    }
}
