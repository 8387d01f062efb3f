// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! One ring interconnect device and the set of them.
//!
//! A [`RingDevice`] owns the endpoint table, the link state and the
//! per-IP/per-channel usage counters for one physical controller. All
//! mutating paths take the device's single lock for their full critical
//! section, register writes included; the usage counters are additionally
//! atomic so diagnostics can sample them without the lock.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use votf_hw::hw::RingHw;

use crate::invalid_endpoint;
use crate::resolver::{RegCandidates, resolve};
use crate::state::{DeviceState, Slot};
use crate::table::{EndpointEntry, EndpointSlot, EndpointTable};
use crate::types::{
    EndpointId, FlushPoll, ID_MAX, IP_MAX, RingPairState, Service, VotfError, VotfResult,
};

// Register bank selection issued alongside ring creation.
const REG_BANK_SET: u32 = 0x1;
const REG_BANK_MODE: u32 = 0x1;

/// One ring interconnect controller.
pub struct RingDevice {
    name: String,
    table: EndpointTable,
    hw: Arc<dyn RingHw>,
    state: Mutex<DeviceState>,
    ip_enable: [AtomicI32; IP_MAX],
    id_enable: [[AtomicI32; ID_MAX]; IP_MAX],
    flush_poll: FlushPoll,
}

impl RingDevice {
    /// Build a device from its platform slot list.
    pub fn new(
        name: &str,
        slots: &[EndpointSlot],
        hw: Arc<dyn RingHw>,
        flush_poll: FlushPoll,
    ) -> VotfResult<Self> {
        let table = EndpointTable::build(slots)?;
        Ok(Self {
            name: name.to_string(),
            table,
            hw,
            state: Mutex::new(DeviceState::default()),
            ip_enable: std::array::from_fn(|_| AtomicI32::new(0)),
            id_enable: std::array::from_fn(|_| std::array::from_fn(|_| AtomicI32::new(0))),
            flush_poll,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table(&self) -> &EndpointTable {
        &self.table
    }

    /// Resolved register window address for `ep` and the applicable
    /// candidate.
    pub fn reg_addr(&self, ep: &EndpointId, candidates: &RegCandidates) -> VotfResult<u64> {
        let Some(entry) = self.table.entry(ep) else {
            return invalid_endpoint!("unknown endpoint {ep}");
        };
        Ok(entry.addr + u64::from(resolve(&self.table, ep, candidates)?))
    }

    /// Current rendezvous state of `ep`.
    pub fn pair_state(&self, ep: &EndpointId) -> VotfResult<RingPairState> {
        let slot = self.slot(ep)?;
        Ok(self.state.lock().unwrap().pair(slot))
    }

    /// How many callers currently hold the device ring.
    #[must_use]
    pub fn ring_request_count(&self) -> u32 {
        self.state.lock().unwrap().ring_request_count
    }

    /// Lock-free sample of an IP's ring-participation count.
    #[must_use]
    pub fn ip_enable_count(&self, ip: u32) -> i32 {
        match self.ip_enable.get(ip as usize) {
            Some(counter) => counter.load(Ordering::SeqCst),
            None => 0,
        }
    }

    /// Lock-free sample of a channel's usage count.
    #[must_use]
    pub fn id_enable_count(&self, ip: u32, id: u32) -> i32 {
        match self
            .id_enable
            .get(ip as usize)
            .and_then(|ids| ids.get(id as usize))
        {
            Some(counter) => counter.load(Ordering::SeqCst),
            None => 0,
        }
    }

    pub(crate) fn hw(&self) -> &dyn RingHw {
        self.hw.as_ref()
    }

    pub(crate) fn flush_poll(&self) -> FlushPoll {
        self.flush_poll
    }

    // Only called with endpoints the table has already validated.
    pub(crate) fn id_enable_counter(&self, ep: &EndpointId) -> &AtomicI32 {
        &self.id_enable[ep.ip as usize][ep.id as usize]
    }

    /// Table entry plus state-matrix slot for `ep`.
    pub(crate) fn lookup(&self, ep: &EndpointId) -> VotfResult<(EndpointEntry, Slot)> {
        let Some(entry) = self.table.entry(ep) else {
            return invalid_endpoint!("unknown endpoint {ep}");
        };
        let entry = *entry;
        let slot = self.slot(ep)?;
        Ok((entry, slot))
    }

    fn slot(&self, ep: &EndpointId) -> VotfResult<Slot> {
        let Some(row) = self.table.ip_index(ep.service, ep.ip) else {
            return invalid_endpoint!("no table row for {ep}");
        };
        if ep.id as usize >= ID_MAX {
            return invalid_endpoint!("id {} out of range for {ep}", ep.id);
        }
        Ok((ep.service.index(), row, ep.id as usize))
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap()
    }

    // --- Ring lifecycle -------------------------------------------------

    /// Request the device ring, creating it on the first request.
    ///
    /// If the software count says the ring already exists but the hardware
    /// disagrees (torn down by an out-of-band reset), the count is
    /// reconciled to a fresh first request and the ring re-created.
    pub fn create_ring(&self) -> VotfResult<()> {
        if self.table.is_empty() {
            warn!("{}: create_ring with an empty endpoint table", self.name);
            return Err(VotfError::NoEndpoints);
        }

        let mut st = self.lock_state();
        st.ring_request_count += 1;
        if st.ring_request_count > 1 {
            // Trust hardware over the stale software count.
            let (base, module) = self.table.first_module().unwrap();
            if self.hw.check_ring_active(base, module) {
                debug!(
                    "{}: ring already active, request count {}",
                    self.name, st.ring_request_count
                );
                return Ok(());
            }
            warn!(
                "{}: ring vanished with request count {}, reconciling",
                self.name, st.ring_request_count
            );
            st.ring_request_count = 1;
            st.clear_all();
        }

        for (base, module) in self.table.modules() {
            self.hw.ring_create(base, module);
            self.hw.set_register_bank(base, REG_BANK_SET, REG_BANK_MODE);
        }
        info!("{}: ring created", self.name);
        Ok(())
    }

    /// Release one ring request, tearing the ring down on the last one.
    pub fn destroy_ring(&self) -> VotfResult<()> {
        let mut st = self.lock_state();
        if st.ring_request_count == 0 {
            warn!("{}: destroy_ring without a matching create", self.name);
            return Ok(());
        }
        st.ring_request_count -= 1;
        if st.ring_request_count > 0 {
            return Ok(());
        }

        for (base, module) in self.table.modules() {
            self.hw.ring_destroy(base, module);
        }
        st.clear_all();
        info!("{}: ring destroyed", self.name);
        Ok(())
    }

    // --- IP-pair links --------------------------------------------------

    /// Make the transmit side of `src_ip` and the receive side of
    /// `dst_ip` physically reachable, creating either side's ring if the
    /// hardware shows it down.
    ///
    /// Freshly activated sides get every populated channel explicitly
    /// disabled before use. Does not touch rendezvous state; that is
    /// [`set_service_cfg`](Self::set_service_cfg)'s job.
    pub fn create_link(&self, src_ip: u32, dst_ip: u32) -> VotfResult<()> {
        let sides = [(Service::Tws, src_ip), (Service::Trs, dst_ip)];
        for (service, ip) in sides {
            if self.table.ip_index(service, ip).is_none() {
                return invalid_endpoint!("no {service} entries for ip {ip}");
            }
        }

        let _st = self.lock_state();
        for (service, ip) in sides {
            let entry = self.side_entry(service, ip)?;
            let already = self.hw.check_ring_active(entry.addr, entry.module);
            if already {
                debug!("{}: {service} ring of ip {ip} already active", self.name);
            } else {
                self.hw.ring_create(entry.addr, entry.module);
                self.hw
                    .set_register_bank(entry.addr, REG_BANK_SET, REG_BANK_MODE);
            }
            self.ip_enable[ip as usize].fetch_add(1, Ordering::SeqCst);

            if !already {
                // A fresh ring must start with all channels off.
                for id in self.table.ids_of(service, ip) {
                    let ep = EndpointId::new(service, ip, id);
                    let addr = self.reg_addr(&ep, &RegCandidates::enable())?;
                    self.hw.write(addr, 0);
                }
            }
        }
        debug!("{}: link {src_ip} -> {dst_ip} created", self.name);
        Ok(())
    }

    /// Drop one usage of the `src_ip`/`dst_ip` link; a side whose count
    /// reaches zero has its ring torn down and its module reset.
    pub fn destroy_link(&self, src_ip: u32, dst_ip: u32) -> VotfResult<()> {
        let sides = [(Service::Tws, src_ip), (Service::Trs, dst_ip)];
        for (service, ip) in sides {
            if self.table.ip_index(service, ip).is_none() {
                return invalid_endpoint!("no {service} entries for ip {ip}");
            }
        }

        let _st = self.lock_state();
        for (service, ip) in sides {
            let counter = &self.ip_enable[ip as usize];
            let prev = counter.fetch_sub(1, Ordering::SeqCst);
            if prev <= 0 {
                counter.store(0, Ordering::SeqCst);
                warn!("{}: enable count underflow for ip {ip}", self.name);
                continue;
            }
            if prev == 1 {
                let entry = self.side_entry(service, ip)?;
                self.hw.ring_destroy(entry.addr, entry.module);
                self.hw.module_reset(entry.addr, entry.module);
                for id in 0..ID_MAX {
                    self.id_enable[ip as usize][id].store(0, Ordering::SeqCst);
                }
                debug!("{}: {service} ring of ip {ip} torn down", self.name);
            }
        }
        Ok(())
    }

    // First populated entry of a (service, ip) row; carries the module
    // window for ring-wide commands.
    fn side_entry(&self, service: Service, ip: u32) -> VotfResult<EndpointEntry> {
        let ids = self.table.ids_of(service, ip);
        let Some(id) = ids.first() else {
            return invalid_endpoint!("no {service} entries for ip {ip}");
        };
        let ep = EndpointId::new(service, ip, *id);
        self.lookup(&ep).map(|(entry, _)| entry)
    }
}

/// The fixed set of ring devices one platform carries.
#[derive(Default)]
pub struct DeviceSet {
    devices: Vec<Arc<RingDevice>>,
}

impl DeviceSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, device: Arc<RingDevice>) {
        self.devices.push(device);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<RingDevice>> {
        self.devices.iter().find(|dev| dev.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RingDevice>> {
        self.devices.iter()
    }

    /// Emergency mass-disable of every populated endpoint on every
    /// device.
    pub fn disable_service(&self) {
        for device in &self.devices {
            device.disable_service();
        }
    }

    /// Register dump of every device.
    pub fn sfr_dump(&self) {
        for device in &self.devices {
            device.sfr_dump();
        }
    }
}
