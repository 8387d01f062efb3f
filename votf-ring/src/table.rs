// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The per-device endpoint catalogue.
//!
//! Populated once at device bring-up from the platform description and
//! never mutated afterwards. Lookup follows the hardware convention: the
//! owning IP is found by a linear scan for its table row, then the entry
//! is indexed `[service][row][id]`.

use votf_hw::types::ModuleFamily;

use crate::invalid_endpoint;
use crate::types::{
    EndpointId, ID_MAX, IP_MAX, ModuleType, SERVICE_COUNT, Service, VotfResult,
};

/// One catalogued channel, immutable after build.
#[derive(Copy, Clone, Debug, Default)]
pub struct EndpointEntry {
    pub used: bool,
    /// Register window base of the owning module.
    pub addr: u64,
    pub ip: u32,
    pub module: ModuleFamily,
    pub module_type: ModuleType,
}

/// Input description of one channel, as the platform config provides it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EndpointSlot {
    pub service: Service,
    pub ip: u32,
    pub id: u32,
    pub addr: u64,
    pub module_type: ModuleType,
}

/// The immutable `[service][row][id]` endpoint table of one device.
pub struct EndpointTable {
    entries: [[[EndpointEntry; ID_MAX]; IP_MAX]; SERVICE_COUNT],
}

impl EndpointTable {
    /// Build the table from the platform's slot list.
    ///
    /// Slots of one `(service, ip)` pair share a row; rows are assigned in
    /// first-seen order. Rejects out-of-range identifiers and duplicate
    /// slots.
    pub fn build(slots: &[EndpointSlot]) -> VotfResult<Self> {
        let mut entries =
            [[[EndpointEntry::default(); ID_MAX]; IP_MAX]; SERVICE_COUNT];

        for slot in slots {
            if slot.ip as usize >= IP_MAX {
                return invalid_endpoint!("ip {} out of range", slot.ip);
            }
            if slot.id as usize >= ID_MAX {
                return invalid_endpoint!("id {} out of range for ip {}", slot.id, slot.ip);
            }

            let svc = slot.service.index();
            let row = match Self::scan_rows(&entries[svc], slot.ip) {
                Some(row) => row,
                None => return invalid_endpoint!("no free table row for ip {}", slot.ip),
            };

            let entry = &mut entries[svc][row][slot.id as usize];
            if entry.used {
                return invalid_endpoint!(
                    "duplicate slot {}:{}.{}",
                    slot.service,
                    slot.ip,
                    slot.id
                );
            }
            *entry = EndpointEntry {
                used: true,
                addr: slot.addr,
                ip: slot.ip,
                module: slot.module_type.family(),
                module_type: slot.module_type,
            };
        }

        Ok(Self { entries })
    }

    // First row already holding this ip, or the first empty row.
    fn scan_rows(rows: &[[EndpointEntry; ID_MAX]; IP_MAX], ip: u32) -> Option<usize> {
        let mut free = None;
        for (row, ids) in rows.iter().enumerate() {
            let mut any_used = false;
            for entry in ids {
                if entry.used {
                    any_used = true;
                    if entry.ip == ip {
                        return Some(row);
                    }
                    break;
                }
            }
            if !any_used && free.is_none() {
                free = Some(row);
            }
        }
        free
    }

    /// Table row owning `ip` for `service`, found by linear scan.
    #[must_use]
    pub fn ip_index(&self, service: Service, ip: u32) -> Option<usize> {
        let rows = &self.entries[service.index()];
        for (row, ids) in rows.iter().enumerate() {
            if ids.iter().any(|entry| entry.used && entry.ip == ip) {
                return Some(row);
            }
        }
        None
    }

    /// The populated entry for `ep`, if any.
    #[must_use]
    pub fn entry(&self, ep: &EndpointId) -> Option<&EndpointEntry> {
        if ep.id as usize >= ID_MAX {
            return None;
        }
        let row = self.ip_index(ep.service, ep.ip)?;
        let entry = &self.entries[ep.service.index()][row][ep.id as usize];
        entry.used.then_some(entry)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self
            .entries
            .iter()
            .flatten()
            .flatten()
            .any(|entry| entry.used)
    }

    /// Every populated entry, with its identity.
    #[must_use]
    pub fn populated(&self) -> Vec<(EndpointId, EndpointEntry)> {
        let mut out = Vec::new();
        for service in [Service::Tws, Service::Trs] {
            for ids in &self.entries[service.index()] {
                for (id, entry) in ids.iter().enumerate() {
                    if entry.used {
                        out.push((
                            EndpointId::new(service, entry.ip, id as u32),
                            *entry,
                        ));
                    }
                }
            }
        }
        out
    }

    /// Unique `(window base, module family)` pairs, for ring-wide
    /// commands that address whole modules.
    #[must_use]
    pub fn modules(&self) -> Vec<(u64, ModuleFamily)> {
        let mut out: Vec<(u64, ModuleFamily)> = Vec::new();
        for (_, entry) in self.populated() {
            let key = (entry.addr, entry.module);
            if !out.contains(&key) {
                out.push(key);
            }
        }
        out
    }

    /// One populated module to probe for ring liveness.
    #[must_use]
    pub fn first_module(&self) -> Option<(u64, ModuleFamily)> {
        self.modules().first().copied()
    }

    /// Populated channel ids of `(service, ip)`.
    #[must_use]
    pub fn ids_of(&self, service: Service, ip: u32) -> Vec<u32> {
        match self.ip_index(service, ip) {
            Some(row) => self.entries[service.index()][row]
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.used)
                .map(|(id, _)| id as u32)
                .collect(),
            None => Vec::new(),
        }
    }
}
