// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The primitive hardware-control interface.
//!
//! One implementor fronts one physical register window set. Ring-wide
//! commands are addressed by the register window base of the module they
//! target; per-channel register accesses take the fully resolved byte
//! address (window base + resolved offset). All calls are synchronous and
//! non-blocking; the caller owns any polling loops built on top of
//! [`read`](RingHw::read).

use crate::types::ModuleFamily;

/// Control interface to the VOTF hardware.
///
/// Implementations must be callable from arbitrary threads; the manager
/// invokes them while holding its per-device lock.
pub trait RingHw: Send + Sync {
    /// Create the token ring on the module behind `base`.
    fn ring_create(&self, base: u64, module: ModuleFamily);

    /// Destroy the token ring on the module behind `base`.
    fn ring_destroy(&self, base: u64, module: ModuleFamily);

    /// Select which register bank the module decodes, and its access mode.
    fn set_register_bank(&self, base: u64, set: u32, mode: u32);

    /// Probe whether the module's ring is currently active.
    ///
    /// This reads hardware truth, not software bookkeeping; the ring can
    /// have been torn down out-of-band by a surprise reset.
    fn check_ring_active(&self, base: u64, module: ModuleFamily) -> bool;

    /// Reset the module's VOTF logic.
    fn module_reset(&self, base: u64, module: ModuleFamily);

    /// Stronger reset that also flushes the module's DMA path.
    fn core_reset(&self, base: u64, module: ModuleFamily);

    /// Command the module to reject the token it is currently offering.
    ///
    /// Used to break a mutual wait-connection deadlock.
    fn reject_token(&self, base: u64, module: ModuleFamily);

    /// Write a 32-bit register at a resolved byte address.
    fn write(&self, addr: u64, value: u32);

    /// Read a 32-bit register at a resolved byte address.
    fn read(&self, addr: u64) -> u32;

    /// Capture a platform debug dump. `fatal` requests a full-stop capture
    /// rather than a snapshot.
    fn debug_dump(&self, fatal: bool, msg: &str);
}
