// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use votf_ring::resolver::RegCandidates;
use votf_ring::test_helpers::{cfg_to, test_device, trs, tws};
use votf_ring::types::{TrsLostCfg, VotfError};

/// The transmit side programs its destination as `(ip << 4) | id`.
#[test]
fn dest_register_encoding() {
    let (device, hw) = test_device();
    device.create_ring().unwrap();
    device.create_link(2, 5).unwrap();

    device.set_service_cfg(&tws(2, 0), &cfg_to(5, 3)).unwrap();

    let dest_addr = device
        .reg_addr(&tws(2, 0), &RegCandidates::dest())
        .unwrap();
    assert_eq!(hw.writes_to(dest_addr), vec![(5 << 4) | 3]);
}

/// Service-family modules take the configured token size as-is.
#[test]
fn service_family_token_size_is_raw() {
    let (device, hw) = test_device();
    device.create_ring().unwrap();
    device.create_link(2, 5).unwrap();

    device.set_service_cfg(&tws(2, 0), &cfg_to(5, 0)).unwrap();

    let token_addr = device
        .reg_addr(&tws(2, 0), &RegCandidates::token_size())
        .unwrap();
    assert_eq!(hw.writes_to(token_addr), vec![4]);
}

/// Agent-family modules express the token size in line terms:
/// `bitwidth * width * lines / 8` bytes.
#[test]
fn agent_family_token_size_is_converted() {
    let (device, hw) = test_device();
    device.create_ring().unwrap();
    device.create_link(7, 8).unwrap();

    // cfg_to: width 1920, bitwidth 10, token_size 4 lines.
    device.set_service_cfg(&tws(7, 0), &cfg_to(8, 0)).unwrap();

    let token_addr = device
        .reg_addr(&tws(7, 0), &RegCandidates::token_size())
        .unwrap();
    assert_eq!(hw.writes_to(token_addr), vec![10 * 1920 * 4 / 8]);
}

/// The receive side also programs frame size and a first-token size
/// mirroring the converted token size.
#[test]
fn trs_programs_frame_and_first_token() {
    let (device, hw) = test_device();
    device.create_ring().unwrap();
    device.create_link(7, 8).unwrap();

    device.set_service_cfg(&trs(8, 2), &cfg_to(7, 0)).unwrap();

    let frame_addr = device
        .reg_addr(&trs(8, 2), &RegCandidates::frame_size())
        .unwrap();
    let first_addr = device
        .reg_addr(&trs(8, 2), &RegCandidates::first_token_size())
        .unwrap();
    assert_eq!(hw.writes_to(frame_addr), vec![1080]);
    assert_eq!(hw.writes_to(first_addr), vec![10 * 1920 * 4 / 8]);
}

/// Receive-side-only registers reject transmit endpoints.
#[test]
fn trs_only_registers_reject_tws() {
    let (device, _hw) = test_device();

    assert!(matches!(
        device.set_frame_size(&tws(2, 0), 1080),
        Err(VotfError::InvalidEndpoint(_))
    ));
    assert!(matches!(
        device.get_fullness(&tws(2, 0)),
        Err(VotfError::InvalidEndpoint(_))
    ));
}

/// The individual setters and getters round-trip through the resolved
/// addresses.
#[test]
fn setters_and_getters() {
    let (device, hw) = test_device();

    device.set_threshold(&trs(5, 1), 12).unwrap();
    assert_eq!(device.get_threshold(&trs(5, 1)).unwrap(), 12);

    device.set_crop_enable(&trs(5, 1), true).unwrap();
    assert!(device.get_crop_enable(&trs(5, 1)).unwrap());

    device.set_irq_enable(&tws(2, 1), 0xf).unwrap();
    let irq_addr = device
        .reg_addr(&tws(2, 1), &RegCandidates::irq_enable())
        .unwrap();
    assert_eq!(hw.peek(irq_addr), 0xf);

    let busy_addr = device
        .reg_addr(&tws(2, 1), &RegCandidates::busy())
        .unwrap();
    hw.poke(busy_addr, 1);
    assert!(device.get_busy(&tws(2, 1)).unwrap());

    let fullness_addr = device
        .reg_addr(&trs(5, 1), &RegCandidates::fullness())
        .unwrap();
    hw.poke(fullness_addr, 7);
    assert_eq!(device.get_fullness(&trs(5, 1)).unwrap(), 7);
}

/// Lost-token handling packs the recover and flush switches into one
/// receive-side register.
#[test]
fn trs_lost_cfg_encoding() {
    let (device, hw) = test_device();

    let cfg = TrsLostCfg {
        recover: true,
        flush: true,
    };
    device.set_trs_lost_cfg(&trs(5, 0), &cfg).unwrap();

    let lost_addr = device
        .reg_addr(&trs(5, 0), &RegCandidates::lost_enable())
        .unwrap();
    assert_eq!(hw.writes_to(lost_addr), vec![0b11]);

    // Transmit endpoints have no lost-token register.
    assert!(matches!(
        device.set_trs_lost_cfg(&tws(2, 0), &cfg),
        Err(VotfError::InvalidEndpoint(_))
    ));
}

/// Operations on unknown endpoints fail without touching hardware.
#[test]
fn unknown_endpoint_is_rejected() {
    let (device, _hw) = test_device();

    assert!(matches!(
        device.set_token_size(&tws(11, 0), 4),
        Err(VotfError::InvalidEndpoint(_))
    ));
    assert!(matches!(
        device.get_busy(&trs(9, 0)),
        Err(VotfError::InvalidEndpoint(_))
    ));
}
