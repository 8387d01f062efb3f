// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Maximum number of distinct IP blocks one device can catalogue, per
/// service. Also bounds the raw IP identifier so a destination fits the
/// hardware's `(ip << 4) | id` encoding.
pub const IP_MAX: usize = 16;

/// Maximum channel index per IP.
pub const ID_MAX: usize = 16;

/// Number of service halves (TWS and TRS).
pub const SERVICE_COUNT: usize = 2;

/// The two halves of a directional ring link.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Service {
    /// Transmit-write-service: the sending half.
    Tws,
    /// Transmit-read-service: the receiving half.
    Trs,
}

impl Service {
    /// The opposite half of the link.
    #[must_use]
    pub fn peer(self) -> Self {
        match self {
            Service::Tws => Service::Trs,
            Service::Trs => Service::Tws,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Service::Tws => 0,
            Service::Trs => 1,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Service::Tws => write!(f, "TWS"),
            Service::Trs => write!(f, "TRS"),
        }
    }
}

/// Address-arithmetic sub-variant of a module.
///
/// The name encodes the channel multiplex width (`M16S16` = 16 TWS and 16
/// TRS channels behind one window). `M16S16` is the variant that carries
/// the hardware's address-gap anomalies; see the resolver.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum ModuleType {
    #[default]
    M16S16,
    M2M2,
    M3M3,
    M1M13,
}

impl ModuleType {
    /// The register family this sub-variant belongs to.
    #[must_use]
    pub fn family(self) -> votf_hw::types::ModuleFamily {
        match self {
            ModuleType::M16S16 | ModuleType::M2M2 | ModuleType::M3M3 => {
                votf_hw::types::ModuleFamily::Service
            }
            ModuleType::M1M13 => votf_hw::types::ModuleFamily::Agent,
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModuleType::M16S16 => write!(f, "M16S16"),
            ModuleType::M2M2 => write!(f, "M2M2"),
            ModuleType::M3M3 => write!(f, "M3M3"),
            ModuleType::M1M13 => write!(f, "M1M13"),
        }
    }
}

/// Identity of one configurable channel on the ring.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct EndpointId {
    pub service: Service,
    pub ip: u32,
    pub id: u32,
}

impl EndpointId {
    #[must_use]
    pub fn new(service: Service, ip: u32, id: u32) -> Self {
        Self { service, ip, id }
    }

    /// The endpoint a configuration names as this one's partner.
    #[must_use]
    pub fn peer_of(&self, cfg: &ServiceCfg) -> EndpointId {
        EndpointId {
            service: self.service.peer(),
            ip: cfg.connected_ip,
            id: cfg.connected_id,
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}.{}", self.service, self.ip, self.id)
    }
}

/// Caller intent flags for [`ServiceCfg`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CfgOption {
    /// Count this requester against the channel's usage counter.
    pub count: bool,
    /// Reprogram even if the channel is already connected.
    pub change: bool,
}

/// One side's channel configuration.
///
/// `width`, `height` and `bitwidth` describe the image line geometry;
/// agent-family modules express token sizes in those terms while
/// service-family modules take `token_size` as raw lines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceCfg {
    pub enable: bool,
    pub limit: u32,
    pub token_size: u32,
    pub connected_ip: u32,
    pub connected_id: u32,
    pub option: CfgOption,
    pub width: u32,
    pub height: u32,
    pub bitwidth: u32,
}

/// Receive-side lost-token handling switches.
///
/// `recover` lets the channel resynchronize after a lost token; `flush`
/// drops the frame in flight instead of waiting for it to complete.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TrsLostCfg {
    pub recover: bool,
    pub flush: bool,
}

/// Two-sided rendezvous state of one endpoint.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum RingPairState {
    #[default]
    Disconnected,
    Ready,
    Connected,
}

impl fmt::Display for RingPairState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RingPairState::Disconnected => write!(f, "DISCONNECTED"),
            RingPairState::Ready => write!(f, "READY"),
            RingPairState::Connected => write!(f, "CONNECTED"),
        }
    }
}

/// Strength of a [`reset`](crate::device::RingDevice::reset).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResetMode {
    /// Reset the module's VOTF logic only.
    Module,
    /// Also flush the module's DMA path.
    Core,
}

/// Busy-poll budget for flush completion.
///
/// The defaults reproduce the hardware bring-up values (10 000 polls of
/// 10 µs, about 100 ms worst case). Tests shrink the interval to zero to
/// keep the poll count observable without the wall-clock cost.
#[derive(Copy, Clone, Debug)]
pub struct FlushPoll {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for FlushPoll {
    fn default() -> Self {
        Self {
            attempts: 10_000,
            interval: Duration::from_micros(10),
        }
    }
}

// Manager errors

/// Build an `Err(VotfError::InvalidEndpoint)` from a format string.
#[macro_export]
macro_rules! invalid_endpoint {
    ($($arg:tt)*) => {
        Err($crate::types::VotfError::InvalidEndpoint(format!($($arg)*)))
    };
}

/// The error type returned by all fallible manager operations.
#[derive(Clone, Debug, PartialEq)]
pub enum VotfError {
    /// Unknown endpoint, no owning IP entry, or a register candidate that
    /// does not apply to the caller's use case.
    InvalidEndpoint(String),
    /// The device's endpoint table has no populated entries.
    NoEndpoints,
    /// The operation needs the device ring up, but no caller has
    /// requested it.
    RingDown(EndpointId),
    /// A flush busy-poll exhausted its attempt budget.
    FlushTimeout { endpoint: EndpointId, attempts: u32 },
}

impl fmt::Display for VotfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VotfError::InvalidEndpoint(msg) => write!(f, "Error: invalid endpoint: {msg}"),
            VotfError::NoEndpoints => write!(f, "Error: no populated endpoints"),
            VotfError::RingDown(ep) => {
                write!(f, "Error: ring not requested for endpoint {ep}")
            }
            VotfError::FlushTimeout { endpoint, attempts } => {
                write!(f, "Error: flush of {endpoint} timed out after {attempts} polls")
            }
        }
    }
}

impl Error for VotfError {}

/// The result type for most manager functions.
pub type VotfResult<T> = Result<T, VotfError>;
