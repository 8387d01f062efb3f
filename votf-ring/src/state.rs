// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Mutable per-device link state.
//!
//! Everything here lives behind the device's single lock. The rendezvous
//! promotion is a single transition over both sides so no caller can ever
//! observe a half-promoted pair.

use crate::types::{
    EndpointId, ID_MAX, IP_MAX, RingPairState, SERVICE_COUNT, ServiceCfg,
};

/// `(service index, table row, channel id)` — a resolved state-matrix
/// position.
pub(crate) type Slot = (usize, usize, usize);

pub(crate) struct DeviceState {
    pair_state: [[[RingPairState; ID_MAX]; IP_MAX]; SERVICE_COUNT],
    cfg_cache: [[[Option<ServiceCfg>; ID_MAX]; IP_MAX]; SERVICE_COUNT],
    /// How many callers currently require the device ring to exist.
    pub(crate) ring_request_count: u32,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            pair_state: [[[RingPairState::Disconnected; ID_MAX]; IP_MAX]; SERVICE_COUNT],
            cfg_cache: std::array::from_fn(|_| {
                std::array::from_fn(|_| std::array::from_fn(|_| None))
            }),
            ring_request_count: 0,
        }
    }
}

impl DeviceState {
    pub(crate) fn pair(&self, slot: Slot) -> RingPairState {
        self.pair_state[slot.0][slot.1][slot.2]
    }

    pub(crate) fn set_pair(&mut self, slot: Slot, state: RingPairState) {
        self.pair_state[slot.0][slot.1][slot.2] = state;
    }

    pub(crate) fn cfg(&self, slot: Slot) -> Option<&ServiceCfg> {
        self.cfg_cache[slot.0][slot.1][slot.2].as_ref()
    }

    pub(crate) fn record_cfg(&mut self, slot: Slot, cfg: ServiceCfg) {
        self.cfg_cache[slot.0][slot.1][slot.2] = Some(cfg);
    }

    /// Promote both sides to CONNECTED iff both are READY and each side's
    /// recorded configuration names the other.
    pub(crate) fn try_promote(
        &mut self,
        me: Slot,
        me_ep: &EndpointId,
        peer: Slot,
        peer_ep: &EndpointId,
    ) -> bool {
        if self.pair(me) != RingPairState::Ready || self.pair(peer) != RingPairState::Ready {
            return false;
        }
        let me_names_peer = self
            .cfg(me)
            .is_some_and(|cfg| cfg.connected_ip == peer_ep.ip && cfg.connected_id == peer_ep.id);
        let peer_names_me = self
            .cfg(peer)
            .is_some_and(|cfg| cfg.connected_ip == me_ep.ip && cfg.connected_id == me_ep.id);
        if !me_names_peer || !peer_names_me {
            return false;
        }

        self.set_pair(me, RingPairState::Connected);
        self.set_pair(peer, RingPairState::Connected);
        true
    }

    /// Reset every pair state and cached configuration.
    pub(crate) fn clear_all(&mut self) {
        for svc in &mut self.pair_state {
            for row in svc {
                row.fill(RingPairState::Disconnected);
            }
        }
        for svc in &mut self.cfg_cache {
            for row in svc {
                row.fill(None);
            }
        }
    }
}
