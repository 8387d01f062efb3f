// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! `VOTF` ring interconnect management.
//!
//! The virtual on-the-fly ring lets independent image-processing IP
//! blocks hand tokens directly to each other instead of staging frames
//! through external memory. This crate owns the cross-component protocol
//! state that makes that safe:
//!
//!  - the immutable per-device [endpoint table](table),
//!  - pure [register address resolution](resolver), including the
//!    multiplexed-width layout anomalies,
//!  - the reference-counted device [ring lifecycle](device),
//!  - the two-phase READY/CONNECTED channel rendezvous, flush and reset,
//!  - periodic deadlock and stuck-state diagnostics.
//!
//! All hardware access goes through the
//! [`RingHw`](votf_hw::hw::RingHw) boundary, so everything here can be
//! driven against the simulated hardware in
//! [`votf_hw::test_helpers`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use votf_hw::test_helpers::SimRingHw;
//! use votf_ring::device::RingDevice;
//! use votf_ring::test_helpers::{cfg_to, test_slots, trs, tws};
//! use votf_ring::types::{FlushPoll, RingPairState};
//!
//! let hw = Arc::new(SimRingHw::new());
//! let device =
//!     RingDevice::new("votf0", &test_slots(), hw, FlushPoll::default()).unwrap();
//!
//! device.create_ring().unwrap();
//! device.create_link(2, 5).unwrap();
//! device.set_service_cfg(&tws(2, 0), &cfg_to(5, 0)).unwrap();
//! device.set_service_cfg(&trs(5, 0), &cfg_to(2, 0)).unwrap();
//! assert_eq!(device.pair_state(&tws(2, 0)).unwrap(), RingPairState::Connected);
//! ```

pub mod device;
pub mod resolver;
pub mod table;
pub mod test_helpers;
pub mod types;

mod diag;
mod service;
mod state;
