// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Hardware-control boundary for the VOTF ring interconnect.
//!
//! Everything above this crate works in terms of the [`RingHw`](hw::RingHw)
//! trait: ring-wide commands addressed by a register window base, and raw
//! 32-bit register accesses addressed by resolved byte offsets. A real
//! implementation maps these onto an ioremapped register window; the
//! [`SimRingHw`](test_helpers::SimRingHw) model in [`test_helpers`] keeps the
//! same contract entirely in memory so the manager can be driven without
//! hardware.
//!
//! The register catalogues for the two module families live in [`regs`].

pub mod hw;
pub mod regs;
pub mod test_helpers;
pub mod types;
