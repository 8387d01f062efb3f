// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Per-channel configuration, flush and reset.
//!
//! [`set_service_cfg`](crate::device::RingDevice::set_service_cfg) runs the
//! two-phase rendezvous: each side independently programs itself and moves
//! to READY; whichever side arrives second promotes both to CONNECTED in
//! one transition under the device lock. Flush is the reference-counted
//! teardown of one channel; reset is the unconditional one.

use std::sync::atomic::Ordering;
use std::thread;

use log::{debug, info, warn};
use votf_hw::types::ModuleFamily;

use crate::device::RingDevice;
use crate::resolver::RegCandidates;
use crate::state::{DeviceState, Slot};
use crate::table::EndpointEntry;
use crate::types::{
    EndpointId, ResetMode, RingPairState, Service, ServiceCfg, TrsLostCfg, VotfError,
    VotfResult,
};

// Token sizes reach the hardware in bytes; agent-family modules take the
// configured size in lines of `width` pixels at `bitwidth` bits each.
fn token_bytes(module: ModuleFamily, cfg: &ServiceCfg) -> u32 {
    match module {
        ModuleFamily::Agent => cfg.bitwidth * cfg.width * cfg.token_size / 8,
        ModuleFamily::Service => cfg.token_size,
    }
}

impl RingDevice {
    /// Configure one side of a channel pair and run the rendezvous.
    ///
    /// The peer is named by `cfg.connected_ip`/`cfg.connected_id`; when
    /// both sides have configured themselves against each other the pair
    /// is promoted to CONNECTED atomically. Requires the device ring to
    /// have been requested.
    pub fn set_service_cfg(&self, ep: &EndpointId, cfg: &ServiceCfg) -> VotfResult<()> {
        let (entry, slot) = self.lookup(ep)?;
        let peer_ep = ep.peer_of(cfg);
        let (_, peer_slot) = self.lookup(&peer_ep)?;

        let mut st = self.lock_state();
        if st.ring_request_count == 0 {
            warn!("{}: set_service_cfg for {ep} with no ring", self.name());
            return Err(VotfError::RingDown(*ep));
        }
        if cfg.option.count {
            self.id_enable_counter(ep).fetch_add(1, Ordering::SeqCst);
        }
        if !cfg.option.change && st.pair(slot) == RingPairState::Connected {
            debug!("{}: {ep} already connected", self.name());
            return Ok(());
        }

        if ep.service == Service::Tws {
            let dest = (cfg.connected_ip << 4) | cfg.connected_id;
            let addr = self.reg_addr(ep, &RegCandidates::dest())?;
            self.hw().write(addr, dest);
        }
        st.record_cfg(slot, cfg.clone());
        st.set_pair(slot, RingPairState::Ready);
        if st.try_promote(slot, ep, peer_slot, &peer_ep) {
            info!("{}: {ep} <-> {peer_ep} connected", self.name());
        }

        self.program_cfg(ep, &entry, cfg)
    }

    /// Single-sided variant of [`set_service_cfg`](Self::set_service_cfg).
    ///
    /// Performs the same register programming but no rendezvous
    /// bookkeeping; used when the peer lives behind another device and
    /// this side cannot observe its state.
    pub fn set_service_cfg_alone(&self, ep: &EndpointId, cfg: &ServiceCfg) -> VotfResult<()> {
        let (entry, slot) = self.lookup(ep)?;

        let mut st = self.lock_state();
        if cfg.option.count {
            self.id_enable_counter(ep).fetch_add(1, Ordering::SeqCst);
        }
        if ep.service == Service::Tws {
            let dest = (cfg.connected_ip << 4) | cfg.connected_id;
            let addr = self.reg_addr(ep, &RegCandidates::dest())?;
            self.hw().write(addr, dest);
        }
        st.record_cfg(slot, cfg.clone());

        self.program_cfg(ep, &entry, cfg)
    }

    // Common register programming for both variants.
    fn program_cfg(
        &self,
        ep: &EndpointId,
        entry: &EndpointEntry,
        cfg: &ServiceCfg,
    ) -> VotfResult<()> {
        let enable_addr = self.reg_addr(ep, &RegCandidates::enable())?;
        self.hw().write(enable_addr, u32::from(cfg.enable));

        let limit_addr = self.reg_addr(ep, &RegCandidates::limit())?;
        self.hw().write(limit_addr, cfg.limit);

        let token = token_bytes(entry.module, cfg);
        if ep.service == Service::Trs {
            let frame_addr = self.reg_addr(ep, &RegCandidates::frame_size())?;
            self.hw().write(frame_addr, cfg.height);
        }
        let token_addr = self.reg_addr(ep, &RegCandidates::token_size())?;
        self.hw().write(token_addr, token);
        if ep.service == Service::Trs {
            let first_addr = self.reg_addr(ep, &RegCandidates::first_token_size())?;
            self.hw().write(first_addr, token);
        }
        Ok(())
    }

    // --- Flush ----------------------------------------------------------

    /// Release one usage of a channel; the last user performs the
    /// hardware flush and disconnects the pair.
    pub fn set_flush(&self, ep: &EndpointId) -> VotfResult<()> {
        let (_, slot) = self.lookup(ep)?;

        let mut st = self.lock_state();
        let counter = self.id_enable_counter(ep);
        let prev = counter.fetch_sub(1, Ordering::SeqCst);
        if prev > 1 {
            debug!(
                "{}: flush of {ep} deferred, {} users remain",
                self.name(),
                prev - 1
            );
            return Ok(());
        }
        if prev <= 0 {
            counter.store(0, Ordering::SeqCst);
            warn!("{}: flush count underflow for {ep}", self.name());
        }
        self.flush_locked(&mut st, ep, slot)
    }

    /// Flush without the usage-count gate. Recovery paths use this to
    /// clear stuck hardware regardless of who still claims the channel.
    pub fn set_flush_alone(&self, ep: &EndpointId) -> VotfResult<()> {
        let (_, slot) = self.lookup(ep)?;
        let mut st = self.lock_state();
        self.flush_locked(&mut st, ep, slot)
    }

    fn flush_locked(
        &self,
        st: &mut DeviceState,
        ep: &EndpointId,
        slot: Slot,
    ) -> VotfResult<()> {
        let busy_addr = self.reg_addr(ep, &RegCandidates::busy())?;
        if self.hw().read(busy_addr) != 0 {
            warn!("{}: flush of {ep} requested while busy", self.name());
        }

        let flush_addr = self.reg_addr(ep, &RegCandidates::flush())?;
        self.hw().write(flush_addr, 0x1);

        let poll = self.flush_poll();
        let mut cleared = false;
        for _ in 0..poll.attempts {
            if self.hw().read(busy_addr) == 0 {
                cleared = true;
                break;
            }
            thread::sleep(poll.interval);
        }

        // Teardown happens even on timeout so a wedged channel cannot
        // keep looking connected.
        let peer = st.cfg(slot).map(|cfg| ep.peer_of(cfg));
        st.set_pair(slot, RingPairState::Disconnected);
        if let Some(peer_ep) = peer {
            if let Ok((_, peer_slot)) = self.lookup(&peer_ep) {
                st.set_pair(peer_slot, RingPairState::Disconnected);
            }
        }

        if cleared {
            debug!("{}: {ep} flushed", self.name());
            Ok(())
        } else {
            warn!(
                "{}: flush of {ep} timed out after {} polls",
                self.name(),
                poll.attempts
            );
            Err(VotfError::FlushTimeout {
                endpoint: *ep,
                attempts: poll.attempts,
            })
        }
    }

    // --- Reset ----------------------------------------------------------

    /// Unconditionally reset a channel's module and its peer's, then
    /// disconnect both sides. Usage counters are left untouched.
    pub fn reset(&self, ep: &EndpointId, mode: ResetMode) -> VotfResult<()> {
        let (entry, slot) = self.lookup(ep)?;

        let mut st = self.lock_state();
        let peer = st.cfg(slot).map(|cfg| ep.peer_of(cfg));

        self.issue_reset(&entry, mode);
        st.set_pair(slot, RingPairState::Disconnected);
        if let Some(peer_ep) = peer {
            if let Ok((peer_entry, peer_slot)) = self.lookup(&peer_ep) {
                self.issue_reset(&peer_entry, mode);
                st.set_pair(peer_slot, RingPairState::Disconnected);
            }
        }
        Ok(())
    }

    fn issue_reset(&self, entry: &EndpointEntry, mode: ResetMode) {
        match mode {
            ResetMode::Module => self.hw().module_reset(entry.addr, entry.module),
            ResetMode::Core => self.hw().core_reset(entry.addr, entry.module),
        }
    }

    // --- Individual register surface ------------------------------------

    pub fn set_enable(&self, ep: &EndpointId, enable: bool) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::enable(), u32::from(enable))
    }

    pub fn set_limit(&self, ep: &EndpointId, limit: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::limit(), limit)
    }

    pub fn set_token_size(&self, ep: &EndpointId, size: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::token_size(), size)
    }

    pub fn set_first_token_size(&self, ep: &EndpointId, size: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::first_token_size(), size)
    }

    pub fn set_frame_size(&self, ep: &EndpointId, size: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::frame_size(), size)
    }

    pub fn set_crop_start(&self, ep: &EndpointId, line: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::crop_start(), line)
    }

    pub fn set_crop_enable(&self, ep: &EndpointId, enable: bool) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::crop_enable(), u32::from(enable))
    }

    pub fn set_threshold(&self, ep: &EndpointId, value: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::threshold(), value)
    }

    pub fn set_read_bytes(&self, ep: &EndpointId, bytes: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::read_bytes(), bytes)
    }

    pub fn set_irq_enable(&self, ep: &EndpointId, mask: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::irq_enable(), mask)
    }

    pub fn set_irq_clear(&self, ep: &EndpointId, mask: u32) -> VotfResult<()> {
        self.write_reg(ep, &RegCandidates::irq_clear(), mask)
    }

    /// Program the receive side's lost-token handling.
    pub fn set_trs_lost_cfg(&self, ep: &EndpointId, cfg: &TrsLostCfg) -> VotfResult<()> {
        let value = (u32::from(cfg.recover) << 1) | u32::from(cfg.flush);
        self.write_reg(ep, &RegCandidates::lost_enable(), value)
    }

    pub fn get_busy(&self, ep: &EndpointId) -> VotfResult<bool> {
        Ok(self.read_reg(ep, &RegCandidates::busy())? != 0)
    }

    pub fn get_fullness(&self, ep: &EndpointId) -> VotfResult<u32> {
        self.read_reg(ep, &RegCandidates::fullness())
    }

    pub fn get_threshold(&self, ep: &EndpointId) -> VotfResult<u32> {
        self.read_reg(ep, &RegCandidates::threshold())
    }

    pub fn get_crop_enable(&self, ep: &EndpointId) -> VotfResult<bool> {
        Ok(self.read_reg(ep, &RegCandidates::crop_enable())? != 0)
    }

    /// Raw value of the channel's low-level debug/state register.
    pub fn get_debug_state(&self, ep: &EndpointId) -> VotfResult<u32> {
        self.read_reg(ep, &RegCandidates::debug())
    }

    fn write_reg(
        &self,
        ep: &EndpointId,
        candidates: &RegCandidates,
        value: u32,
    ) -> VotfResult<()> {
        let addr = self.reg_addr(ep, candidates)?;
        self.hw().write(addr, value);
        Ok(())
    }

    fn read_reg(&self, ep: &EndpointId, candidates: &RegCandidates) -> VotfResult<u32> {
        let addr = self.reg_addr(ep, candidates)?;
        Ok(self.hw().read(addr))
    }
}
