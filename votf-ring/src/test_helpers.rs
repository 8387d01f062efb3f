// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Helpers for driving a [`RingDevice`] against the simulated hardware.

use std::sync::Arc;
use std::time::Duration;

use votf_hw::test_helpers::SimRingHw;

use crate::device::RingDevice;
use crate::table::EndpointSlot;
use crate::types::{CfgOption, EndpointId, FlushPoll, ModuleType, Service, ServiceCfg};

/// Register window bases of the standard test catalogue.
pub const TWS_WINDOW: u64 = 0x1b04_0000;
pub const TRS_WINDOW: u64 = 0x1b05_0000;
pub const AGENT_TWS_WINDOW: u64 = 0x1b06_0000;
pub const AGENT_TRS_WINDOW: u64 = 0x1b07_0000;

/// The standard test catalogue: one M16S16 service pair (ips 2 and 5)
/// and one M1M13 agent pair (ips 7 and 8).
#[must_use]
pub fn test_slots() -> Vec<EndpointSlot> {
    let mut slots = Vec::new();
    for id in 0..16 {
        slots.push(EndpointSlot {
            service: Service::Tws,
            ip: 2,
            id,
            addr: TWS_WINDOW,
            module_type: ModuleType::M16S16,
        });
        slots.push(EndpointSlot {
            service: Service::Trs,
            ip: 5,
            id,
            addr: TRS_WINDOW,
            module_type: ModuleType::M16S16,
        });
    }
    slots.push(EndpointSlot {
        service: Service::Tws,
        ip: 7,
        id: 0,
        addr: AGENT_TWS_WINDOW,
        module_type: ModuleType::M1M13,
    });
    for id in 0..13 {
        slots.push(EndpointSlot {
            service: Service::Trs,
            ip: 8,
            id,
            addr: AGENT_TRS_WINDOW,
            module_type: ModuleType::M1M13,
        });
    }
    slots
}

/// A device over the standard catalogue, with a zero-interval flush poll
/// so timeout paths stay fast while the attempt budget is unchanged.
#[must_use]
pub fn test_device() -> (Arc<RingDevice>, Arc<SimRingHw>) {
    let hw = Arc::new(SimRingHw::new());
    let device = RingDevice::new(
        "votf-test",
        &test_slots(),
        hw.clone(),
        FlushPoll {
            attempts: 10_000,
            interval: Duration::ZERO,
        },
    )
    .unwrap();
    (Arc::new(device), hw)
}

#[must_use]
pub fn tws(ip: u32, id: u32) -> EndpointId {
    EndpointId::new(Service::Tws, ip, id)
}

#[must_use]
pub fn trs(ip: u32, id: u32) -> EndpointId {
    EndpointId::new(Service::Trs, ip, id)
}

/// A counted, enabled configuration naming `(peer_ip, peer_id)`.
#[must_use]
pub fn cfg_to(peer_ip: u32, peer_id: u32) -> ServiceCfg {
    ServiceCfg {
        enable: true,
        limit: 2,
        token_size: 4,
        connected_ip: peer_ip,
        connected_id: peer_id,
        option: CfgOption {
            count: true,
            change: false,
        },
        width: 1920,
        height: 1080,
        bitwidth: 10,
    }
}
