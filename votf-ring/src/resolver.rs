// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Register address resolution.
//!
//! Pure computation over the immutable endpoint table: an endpoint
//! identity plus up to four candidate register constants (one per module
//! family and service half) map to a byte offset inside the owning
//! module's register window.
//!
//! The `M16S16` multiplexed width has two layout anomalies that must be
//! reproduced bit-exact: the transmit side gains an extra 0x4 once
//! `id >= 9`, and the receive side steps by an extra 0x24 at ids 5, 10
//! and 15. Both are kept in explicit delta tables rather than inline
//! arithmetic so they stay independently testable.

use votf_hw::regs::{AgentReg, ServiceReg};
use votf_hw::types::ModuleFamily;

use crate::invalid_endpoint;
use crate::table::EndpointTable;
use crate::types::{EndpointId, ModuleType, Service, VotfResult};

/// Candidate register constants for one resolution.
///
/// Two apply when the owning module is service-family, two when it is
/// agent-family; `None` marks a candidate that does not apply to the
/// caller's use case.
#[derive(Copy, Clone, Debug)]
pub struct RegCandidates {
    pub service_tws: Option<ServiceReg>,
    pub service_trs: Option<ServiceReg>,
    pub agent_tws: Option<AgentReg>,
    pub agent_trs: Option<AgentReg>,
}

impl RegCandidates {
    #[must_use]
    pub fn new(
        service_tws: Option<ServiceReg>,
        service_trs: Option<ServiceReg>,
        agent_tws: Option<AgentReg>,
        agent_trs: Option<AgentReg>,
    ) -> Self {
        Self {
            service_tws,
            service_trs,
            agent_tws,
            agent_trs,
        }
    }

    /// All four candidates apply.
    #[must_use]
    pub fn all(
        service_tws: ServiceReg,
        service_trs: ServiceReg,
        agent_tws: AgentReg,
        agent_trs: AgentReg,
    ) -> Self {
        Self::new(
            Some(service_tws),
            Some(service_trs),
            Some(agent_tws),
            Some(agent_trs),
        )
    }

    /// A transmit-side-only register.
    #[must_use]
    pub fn tws_only(service_tws: ServiceReg, agent_tws: AgentReg) -> Self {
        Self::new(Some(service_tws), None, Some(agent_tws), None)
    }

    /// A receive-side-only register.
    #[must_use]
    pub fn trs_only(service_trs: ServiceReg, agent_trs: AgentReg) -> Self {
        Self::new(None, Some(service_trs), None, Some(agent_trs))
    }

    // Named candidate sets for the registers the manager touches.

    #[must_use]
    pub fn enable() -> Self {
        Self::all(
            ServiceReg::TwsEnable,
            ServiceReg::TrsEnable,
            AgentReg::TwsEnable,
            AgentReg::TrsEnable,
        )
    }

    #[must_use]
    pub fn limit() -> Self {
        Self::all(
            ServiceReg::TwsLimit,
            ServiceReg::TrsLimit,
            AgentReg::TwsLimit,
            AgentReg::TrsLimit,
        )
    }

    #[must_use]
    pub fn dest() -> Self {
        Self::tws_only(ServiceReg::TwsDest, AgentReg::TwsDest)
    }

    #[must_use]
    pub fn token_size() -> Self {
        Self::all(
            ServiceReg::TwsTokenSize,
            ServiceReg::TrsTokenSize,
            AgentReg::TwsTokenSize,
            AgentReg::TrsTokenSize,
        )
    }

    #[must_use]
    pub fn first_token_size() -> Self {
        Self::trs_only(ServiceReg::TrsFirstTokenSize, AgentReg::TrsFirstTokenSize)
    }

    #[must_use]
    pub fn frame_size() -> Self {
        Self::trs_only(ServiceReg::TrsFrameSize, AgentReg::TrsFrameSize)
    }

    #[must_use]
    pub fn flush() -> Self {
        Self::all(
            ServiceReg::TwsFlush,
            ServiceReg::TrsFlush,
            AgentReg::TwsFlush,
            AgentReg::TrsFlush,
        )
    }

    #[must_use]
    pub fn busy() -> Self {
        Self::all(
            ServiceReg::TwsBusy,
            ServiceReg::TrsBusy,
            AgentReg::TwsBusy,
            AgentReg::TrsBusy,
        )
    }

    #[must_use]
    pub fn fullness() -> Self {
        Self::trs_only(ServiceReg::TrsFullness, AgentReg::TrsFullness)
    }

    #[must_use]
    pub fn threshold() -> Self {
        Self::trs_only(ServiceReg::TrsThreshold, AgentReg::TrsThreshold)
    }

    #[must_use]
    pub fn crop_start() -> Self {
        Self::trs_only(ServiceReg::TrsCropStart, AgentReg::TrsCropStart)
    }

    #[must_use]
    pub fn crop_enable() -> Self {
        Self::trs_only(ServiceReg::TrsCropEnable, AgentReg::TrsCropEnable)
    }

    #[must_use]
    pub fn read_bytes() -> Self {
        Self::trs_only(ServiceReg::TrsReadBytes, AgentReg::TrsReadBytes)
    }

    #[must_use]
    pub fn irq_enable() -> Self {
        Self::all(
            ServiceReg::TwsIrqEnable,
            ServiceReg::TrsIrqEnable,
            AgentReg::TwsIrqEnable,
            AgentReg::TrsIrqEnable,
        )
    }

    #[must_use]
    pub fn irq_clear() -> Self {
        Self::all(
            ServiceReg::TwsIrqClear,
            ServiceReg::TrsIrqClear,
            AgentReg::TwsIrqClear,
            AgentReg::TrsIrqClear,
        )
    }

    #[must_use]
    pub fn lost_enable() -> Self {
        Self::trs_only(ServiceReg::TrsLostEnable, AgentReg::TrsLostEnable)
    }

    #[must_use]
    pub fn debug() -> Self {
        Self::all(
            ServiceReg::TwsDebug,
            ServiceReg::TrsDebug,
            AgentReg::TwsDebug,
            AgentReg::TrsDebug,
        )
    }
}

// Layout anomaly tables, keyed by (module type, service): every
// (threshold, delta) row whose threshold the channel id has reached
// contributes its delta.
const M16S16_TWS_DELTAS: &[(u32, u32)] = &[(9, 0x4)];
const M16S16_TRS_DELTAS: &[(u32, u32)] = &[(5, 0x24), (10, 0x24), (15, 0x24)];

fn quirk_rows(module_type: ModuleType, service: Service) -> &'static [(u32, u32)] {
    match (module_type, service) {
        (ModuleType::M16S16, Service::Tws) => M16S16_TWS_DELTAS,
        (ModuleType::M16S16, Service::Trs) => M16S16_TRS_DELTAS,
        _ => &[],
    }
}

fn quirk_delta(module_type: ModuleType, service: Service, id: u32) -> u32 {
    quirk_rows(module_type, service)
        .iter()
        .filter(|(threshold, _)| id >= *threshold)
        .map(|(_, delta)| delta)
        .sum()
}

/// Byte offset of the first channel group for `(module type, service)`.
fn module_base(module_type: ModuleType, service: Service) -> u32 {
    match (module_type, service) {
        (ModuleType::M16S16, Service::Tws) => 0x0100,
        (ModuleType::M16S16, Service::Trs) => 0x0500,
        (ModuleType::M2M2, Service::Tws) => 0x0100,
        (ModuleType::M2M2, Service::Trs) => 0x0180,
        (ModuleType::M3M3, Service::Tws) => 0x0100,
        (ModuleType::M3M3, Service::Trs) => 0x0200,
        (ModuleType::M1M13, Service::Tws) => 0x0800,
        (ModuleType::M1M13, Service::Trs) => 0x0900,
    }
}

/// Distance between consecutive channel groups.
fn id_gap(module_type: ModuleType, service: Service) -> u32 {
    match (module_type, service) {
        (ModuleType::M16S16, Service::Tws) => 0x24,
        (ModuleType::M16S16, Service::Trs) => 0x40,
        (ModuleType::M2M2 | ModuleType::M3M3, _) => 0x40,
        (ModuleType::M1M13, Service::Tws) => 0x30,
        (ModuleType::M1M13, Service::Trs) => 0x50,
    }
}

/// Resolve `ep` plus the applicable candidate to a window byte offset.
///
/// Fails if the endpoint is not catalogued or the candidate that applies
/// to its module family and service half was passed as `None`.
pub fn resolve(
    table: &EndpointTable,
    ep: &EndpointId,
    candidates: &RegCandidates,
) -> VotfResult<u32> {
    let Some(entry) = table.entry(ep) else {
        return invalid_endpoint!("unknown endpoint {ep}");
    };

    let sfr_offset = match (entry.module, ep.service) {
        (ModuleFamily::Service, Service::Tws) => match candidates.service_tws {
            Some(reg) => reg.sfr_offset(),
            None => return invalid_endpoint!("no service TWS register for {ep}"),
        },
        (ModuleFamily::Service, Service::Trs) => match candidates.service_trs {
            Some(reg) => reg.sfr_offset(),
            None => return invalid_endpoint!("no service TRS register for {ep}"),
        },
        (ModuleFamily::Agent, Service::Tws) => match candidates.agent_tws {
            Some(reg) => reg.sfr_offset(),
            None => return invalid_endpoint!("no agent TWS register for {ep}"),
        },
        (ModuleFamily::Agent, Service::Trs) => match candidates.agent_trs {
            Some(reg) => reg.sfr_offset(),
            None => return invalid_endpoint!("no agent TRS register for {ep}"),
        },
    };

    let module_type = entry.module_type;
    Ok(module_base(module_type, ep.service)
        + ep.id * id_gap(module_type, ep.service)
        + sfr_offset
        + quirk_delta(module_type, ep.service, ep.id))
}

#[cfg(test)]
mod tests {
    use votf_hw::regs::{AgentReg, ServiceReg};

    use crate::resolver::{RegCandidates, resolve};
    use crate::table::{EndpointSlot, EndpointTable};
    use crate::types::{EndpointId, ModuleType, Service};

    fn m16s16_table() -> EndpointTable {
        let mut slots = Vec::new();
        for id in 0..16 {
            slots.push(EndpointSlot {
                service: Service::Tws,
                ip: 2,
                id,
                addr: 0x1b04_0000,
                module_type: ModuleType::M16S16,
            });
            slots.push(EndpointSlot {
                service: Service::Trs,
                ip: 3,
                id,
                addr: 0x1b05_0000,
                module_type: ModuleType::M16S16,
            });
        }
        EndpointTable::build(&slots).unwrap()
    }

    fn enable_candidates() -> RegCandidates {
        RegCandidates::all(
            ServiceReg::TwsEnable,
            ServiceReg::TrsEnable,
            AgentReg::TwsEnable,
            AgentReg::TrsEnable,
        )
    }

    #[test]
    fn deterministic() {
        let table = m16s16_table();
        let ep = EndpointId::new(Service::Tws, 2, 3);
        let a = resolve(&table, &ep, &enable_candidates()).unwrap();
        let b = resolve(&table, &ep, &enable_candidates()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tws_gap_anomaly_at_id_9() {
        let table = m16s16_table();
        let offset = |id| {
            resolve(
                &table,
                &EndpointId::new(Service::Tws, 2, id),
                &enable_candidates(),
            )
            .unwrap()
        };

        // Below the threshold the stride is uniform.
        assert_eq!(offset(8) - offset(7), 0x24);
        // Crossing id 9 adds the one-off 0x4.
        assert_eq!(offset(9) - offset(8), 0x24 + 0x4);
        // Above it the stride is uniform again.
        assert_eq!(offset(10) - offset(9), 0x24);
    }

    #[test]
    fn trs_step_anomalies_at_5_10_15() {
        let table = m16s16_table();
        let offset = |id| {
            resolve(
                &table,
                &EndpointId::new(Service::Trs, 3, id),
                &enable_candidates(),
            )
            .unwrap()
        };

        assert_eq!(offset(4) - offset(3), 0x40);
        assert_eq!(offset(5) - offset(4), 0x40 + 0x24);
        assert_eq!(offset(9) - offset(8), 0x40);
        assert_eq!(offset(10) - offset(9), 0x40 + 0x24);
        assert_eq!(offset(15) - offset(14), 0x40 + 0x24);
    }

    #[test]
    fn quirks_do_not_leak_to_other_module_types() {
        let slots: Vec<EndpointSlot> = (0..2)
            .map(|id| EndpointSlot {
                service: Service::Tws,
                ip: 1,
                id,
                addr: 0x1000,
                module_type: ModuleType::M2M2,
            })
            .collect();
        let table = EndpointTable::build(&slots).unwrap();
        let offset = |id| {
            resolve(
                &table,
                &EndpointId::new(Service::Tws, 1, id),
                &enable_candidates(),
            )
            .unwrap()
        };
        assert_eq!(offset(1) - offset(0), 0x40);
    }

    #[test]
    fn missing_candidate_is_an_error() {
        let table = m16s16_table();
        let ep = EndpointId::new(Service::Trs, 3, 0);
        // Dest is transmit-side-only.
        let result = resolve(
            &table,
            &ep,
            &RegCandidates::tws_only(ServiceReg::TwsDest, AgentReg::TwsDest),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_endpoint_is_an_error() {
        let table = m16s16_table();
        let ep = EndpointId::new(Service::Tws, 9, 0);
        assert!(resolve(&table, &ep, &enable_candidates()).is_err());
    }
}
