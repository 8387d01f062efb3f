// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A software model of the VOTF hardware.
//!
//! [`SimRingHw`] implements [`RingHw`] over an in-memory register file and
//! records every operation it is asked to perform, so tests and demos can
//! script hardware behavior (stuck busy bits, out-of-band ring resets,
//! debug states) and assert on exactly what the manager drove.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use log::trace;

use crate::hw::RingHw;
use crate::types::ModuleFamily;

#[derive(Default)]
struct SimState {
    regs: HashMap<u64, u32>,
    active: HashSet<(u64, ModuleFamily)>,
    stuck_busy: HashSet<u64>,
    reads: HashMap<u64, u64>,
    writes: HashMap<u64, Vec<u32>>,
    ring_creates: u32,
    ring_destroys: u32,
    bank_selects: u32,
    module_resets: u32,
    core_resets: u32,
    reject_tokens: u32,
    dumps: Vec<String>,
}

/// In-memory stand-in for one device's register windows.
#[derive(Default)]
pub struct SimRingHw {
    inner: Mutex<SimState>,
}

impl SimRingHw {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value directly, bypassing the write log.
    pub fn poke(&self, addr: u64, value: u32) {
        self.inner.lock().unwrap().regs.insert(addr, value);
    }

    /// Read a register value without counting the access.
    #[must_use]
    pub fn peek(&self, addr: u64) -> u32 {
        *self.inner.lock().unwrap().regs.get(&addr).unwrap_or(&0)
    }

    /// Make reads of `addr` report busy forever, regardless of writes.
    pub fn force_busy(&self, addr: u64) {
        self.inner.lock().unwrap().stuck_busy.insert(addr);
    }

    /// Undo a previous [`force_busy`](Self::force_busy).
    pub fn release_busy(&self, addr: u64) {
        self.inner.lock().unwrap().stuck_busy.remove(&addr);
    }

    /// Tear a ring down behind the manager's back, as a surprise hardware
    /// reset would.
    pub fn drop_ring(&self, base: u64, module: ModuleFamily) {
        self.inner.lock().unwrap().active.remove(&(base, module));
    }

    /// Number of reads the manager has issued against `addr`.
    #[must_use]
    pub fn reads_of(&self, addr: u64) -> u64 {
        *self.inner.lock().unwrap().reads.get(&addr).unwrap_or(&0)
    }

    /// Every value written to `addr`, in order.
    #[must_use]
    pub fn writes_to(&self, addr: u64) -> Vec<u32> {
        self.inner
            .lock()
            .unwrap()
            .writes
            .get(&addr)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn ring_creates(&self) -> u32 {
        self.inner.lock().unwrap().ring_creates
    }

    #[must_use]
    pub fn ring_destroys(&self) -> u32 {
        self.inner.lock().unwrap().ring_destroys
    }

    #[must_use]
    pub fn bank_selects(&self) -> u32 {
        self.inner.lock().unwrap().bank_selects
    }

    #[must_use]
    pub fn module_resets(&self) -> u32 {
        self.inner.lock().unwrap().module_resets
    }

    #[must_use]
    pub fn core_resets(&self) -> u32 {
        self.inner.lock().unwrap().core_resets
    }

    #[must_use]
    pub fn reject_tokens(&self) -> u32 {
        self.inner.lock().unwrap().reject_tokens
    }

    /// Debug-dump messages captured so far.
    #[must_use]
    pub fn dumps(&self) -> Vec<String> {
        self.inner.lock().unwrap().dumps.clone()
    }
}

impl RingHw for SimRingHw {
    fn ring_create(&self, base: u64, module: ModuleFamily) {
        trace!("sim: ring_create {base:#x} {module}");
        let mut st = self.inner.lock().unwrap();
        st.active.insert((base, module));
        st.ring_creates += 1;
    }

    fn ring_destroy(&self, base: u64, module: ModuleFamily) {
        trace!("sim: ring_destroy {base:#x} {module}");
        let mut st = self.inner.lock().unwrap();
        st.active.remove(&(base, module));
        st.ring_destroys += 1;
    }

    fn set_register_bank(&self, base: u64, set: u32, mode: u32) {
        trace!("sim: set_register_bank {base:#x} set={set} mode={mode}");
        self.inner.lock().unwrap().bank_selects += 1;
    }

    fn check_ring_active(&self, base: u64, module: ModuleFamily) -> bool {
        self.inner.lock().unwrap().active.contains(&(base, module))
    }

    fn module_reset(&self, base: u64, module: ModuleFamily) {
        trace!("sim: module_reset {base:#x} {module}");
        self.inner.lock().unwrap().module_resets += 1;
    }

    fn core_reset(&self, base: u64, module: ModuleFamily) {
        trace!("sim: core_reset {base:#x} {module}");
        self.inner.lock().unwrap().core_resets += 1;
    }

    fn reject_token(&self, base: u64, module: ModuleFamily) {
        trace!("sim: reject_token {base:#x} {module}");
        self.inner.lock().unwrap().reject_tokens += 1;
    }

    fn write(&self, addr: u64, value: u32) {
        let mut st = self.inner.lock().unwrap();
        st.regs.insert(addr, value);
        st.writes.entry(addr).or_default().push(value);
    }

    fn read(&self, addr: u64) -> u32 {
        let mut st = self.inner.lock().unwrap();
        *st.reads.entry(addr).or_default() += 1;
        if st.stuck_busy.contains(&addr) {
            return 1;
        }
        *st.regs.get(&addr).unwrap_or(&0)
    }

    fn debug_dump(&self, fatal: bool, msg: &str) {
        let mut st = self.inner.lock().unwrap();
        st.dumps.push(format!("fatal={fatal} {msg}"));
    }
}
