// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::sync::Arc;
use std::time::Duration;

use votf_hw::hw::RingHw;
use votf_hw::test_helpers::SimRingHw;
use votf_hw::types::ModuleFamily;
use votf_ring::device::RingDevice;
use votf_ring::test_helpers::{TRS_WINDOW, TWS_WINDOW, cfg_to, test_device, trs, tws};
use votf_ring::types::{FlushPoll, RingPairState, VotfError};

// The standard catalogue spans four register windows, so ring-wide
// commands touch four modules.
const MODULE_COUNT: u32 = 4;

/// Request count tracks creates minus destroys; the hardware ring exists
/// iff the count is positive.
#[test]
fn refcount_matches_creates_minus_destroys() {
    let (device, hw) = test_device();

    device.create_ring().unwrap();
    device.create_ring().unwrap();
    device.create_ring().unwrap();
    assert_eq!(device.ring_request_count(), 3);
    assert!(hw.check_ring_active(TWS_WINDOW, ModuleFamily::Service));

    device.destroy_ring().unwrap();
    device.destroy_ring().unwrap();
    assert_eq!(device.ring_request_count(), 1);
    assert!(hw.check_ring_active(TWS_WINDOW, ModuleFamily::Service));

    device.destroy_ring().unwrap();
    assert_eq!(device.ring_request_count(), 0);
    assert!(!hw.check_ring_active(TWS_WINDOW, ModuleFamily::Service));
}

/// Two creates and two destroys: the ring is physically created once and
/// destroyed once, and a destroy beyond zero is a no-op.
#[test]
fn double_create_single_hardware_cycle() {
    let (device, hw) = test_device();

    device.create_ring().unwrap();
    assert_eq!(hw.ring_creates(), MODULE_COUNT);

    // Hardware still active: the second request must not re-create.
    device.create_ring().unwrap();
    assert_eq!(hw.ring_creates(), MODULE_COUNT);

    device.destroy_ring().unwrap();
    assert_eq!(hw.ring_destroys(), 0);

    device.destroy_ring().unwrap();
    assert_eq!(hw.ring_destroys(), MODULE_COUNT);

    // Beyond zero: self-healing no-op.
    device.destroy_ring().unwrap();
    assert_eq!(device.ring_request_count(), 0);
    assert_eq!(hw.ring_destroys(), MODULE_COUNT);
}

/// A ring torn down behind the manager's back is re-created on the next
/// request, with the stale count and all pair states reconciled.
#[test]
fn out_of_band_reset_is_reconciled() {
    let (device, hw) = test_device();

    device.create_ring().unwrap();
    device.create_link(2, 5).unwrap();
    device.set_service_cfg(&tws(2, 0), &cfg_to(5, 0)).unwrap();
    device.set_service_cfg(&trs(5, 0), &cfg_to(2, 0)).unwrap();
    assert_eq!(
        device.pair_state(&tws(2, 0)).unwrap(),
        RingPairState::Connected
    );

    // Surprise reset: every ring vanishes without the manager knowing.
    hw.drop_ring(TWS_WINDOW, ModuleFamily::Service);
    hw.drop_ring(TRS_WINDOW, ModuleFamily::Service);

    device.create_ring().unwrap();
    assert_eq!(device.ring_request_count(), 1);
    assert_eq!(
        device.pair_state(&tws(2, 0)).unwrap(),
        RingPairState::Disconnected
    );
    assert_eq!(
        device.pair_state(&trs(5, 0)).unwrap(),
        RingPairState::Disconnected
    );
    assert_eq!(hw.ring_creates(), 2 * MODULE_COUNT);
}

/// An empty catalogue is an error and must not corrupt the request
/// count.
#[test]
fn empty_table_is_an_error() {
    let hw = Arc::new(SimRingHw::new());
    let device = RingDevice::new(
        "votf-empty",
        &[],
        hw,
        FlushPoll {
            attempts: 10,
            interval: Duration::ZERO,
        },
    )
    .unwrap();

    assert_eq!(device.create_ring(), Err(VotfError::NoEndpoints));
    assert_eq!(device.ring_request_count(), 0);
    device.destroy_ring().unwrap();
    assert_eq!(device.ring_request_count(), 0);
}
