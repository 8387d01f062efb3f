// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use votf_ring::resolver::RegCandidates;
use votf_ring::test_helpers::{cfg_to, test_device, trs, tws};
use votf_ring::types::{RingPairState, VotfError};

/// With k users on a channel, the first k-1 flushes only decrement; the
/// k-th performs the hardware flush and disconnects both sides.
#[test]
fn shared_channel_flushes_on_last_user() {
    let (device, hw) = test_device();
    device.create_ring().unwrap();
    device.create_link(2, 5).unwrap();
    device.set_service_cfg(&tws(2, 0), &cfg_to(5, 0)).unwrap();
    device.set_service_cfg(&trs(5, 0), &cfg_to(2, 0)).unwrap();
    // Second requester shares the transmit channel.
    device.set_service_cfg(&tws(2, 0), &cfg_to(5, 0)).unwrap();
    assert_eq!(device.id_enable_count(2, 0), 2);

    let flush_addr = device
        .reg_addr(&tws(2, 0), &RegCandidates::flush())
        .unwrap();

    device.set_flush(&tws(2, 0)).unwrap();
    assert_eq!(device.id_enable_count(2, 0), 1);
    assert!(hw.writes_to(flush_addr).is_empty());
    assert_eq!(
        device.pair_state(&tws(2, 0)).unwrap(),
        RingPairState::Connected
    );

    device.set_flush(&tws(2, 0)).unwrap();
    assert_eq!(device.id_enable_count(2, 0), 0);
    assert_eq!(hw.writes_to(flush_addr), vec![1]);
    assert_eq!(
        device.pair_state(&tws(2, 0)).unwrap(),
        RingPairState::Disconnected
    );
    assert_eq!(
        device.pair_state(&trs(5, 0)).unwrap(),
        RingPairState::Disconnected
    );
}

/// A busy bit that never clears times the flush out after exactly the
/// poll budget, and the pair is still torn down.
#[test]
fn stuck_busy_times_out_after_poll_budget() {
    let (device, hw) = test_device();
    device.create_ring().unwrap();
    device.create_link(2, 5).unwrap();
    device.set_service_cfg(&tws(2, 0), &cfg_to(5, 0)).unwrap();
    device.set_service_cfg(&trs(5, 0), &cfg_to(2, 0)).unwrap();

    let busy_addr = device
        .reg_addr(&tws(2, 0), &RegCandidates::busy())
        .unwrap();
    hw.force_busy(busy_addr);

    let result = device.set_flush(&tws(2, 0));
    assert_eq!(
        result,
        Err(VotfError::FlushTimeout {
            endpoint: tws(2, 0),
            attempts: 10_000,
        })
    );
    // One pre-flush busy sample plus the full poll budget.
    assert_eq!(hw.reads_of(busy_addr), 10_001);

    // Teardown is unconditional even on timeout.
    assert_eq!(
        device.pair_state(&tws(2, 0)).unwrap(),
        RingPairState::Disconnected
    );
    assert_eq!(
        device.pair_state(&trs(5, 0)).unwrap(),
        RingPairState::Disconnected
    );
}

/// Flushing a channel nobody counted is a bug-guard: the counter is
/// clamped at zero and the flush still runs.
#[test]
fn flush_underflow_clamps_and_flushes() {
    let (device, hw) = test_device();

    device.set_flush(&tws(2, 1)).unwrap();
    assert_eq!(device.id_enable_count(2, 1), 0);

    let flush_addr = device
        .reg_addr(&tws(2, 1), &RegCandidates::flush())
        .unwrap();
    assert_eq!(hw.writes_to(flush_addr), vec![1]);
}

/// The recovery variant ignores the usage count entirely.
#[test]
fn flush_alone_bypasses_usage_count() {
    let (device, hw) = test_device();
    device.create_ring().unwrap();
    device.create_link(2, 5).unwrap();
    device.set_service_cfg(&tws(2, 0), &cfg_to(5, 0)).unwrap();
    device.set_service_cfg(&trs(5, 0), &cfg_to(2, 0)).unwrap();
    device.set_service_cfg(&tws(2, 0), &cfg_to(5, 0)).unwrap();
    assert_eq!(device.id_enable_count(2, 0), 2);

    device.set_flush_alone(&tws(2, 0)).unwrap();
    assert_eq!(device.id_enable_count(2, 0), 2);
    assert_eq!(
        device.pair_state(&tws(2, 0)).unwrap(),
        RingPairState::Disconnected
    );
    assert_eq!(
        device.pair_state(&trs(5, 0)).unwrap(),
        RingPairState::Disconnected
    );

    let flush_addr = device
        .reg_addr(&tws(2, 0), &RegCandidates::flush())
        .unwrap();
    assert_eq!(hw.writes_to(flush_addr), vec![1]);
}
