// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Platform configuration for the VOTF devices.
//!
//! The endpoint catalogue of each device — which IPs sit on its ring,
//! behind which register windows, with which module layout — comes from
//! the platform description rather than code. This crate loads that
//! description from a TOML file, with `VOTF_`-prefixed environment
//! variables layered on top, and converts it into the slot lists
//! `votf_ring` builds its tables from.
//!
//! # Schema
//!
//! ```toml
//! [[devices]]
//! name = "votf0"
//!
//! [[devices.endpoints]]
//! service = "tws"          # "tws" | "trs"
//! ip = 2
//! ids = [0, 1, 2]          # populated channel indices
//! addr = 0x1b040000        # register window base
//! module = "service"       # "service" | "agent"
//! module_type = "m16s16"   # "m16s16" | "m2m2" | "m3m3" | "m1m13"
//! ```

use std::error::Error;
use std::fmt;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use votf_ring::table::EndpointSlot;
use votf_ring::types::{ModuleType, Service};

/// Build an `Err(ConfError::Invalid)` from a format string.
#[macro_export]
macro_rules! conf_error {
    ($($arg:tt)*) => {
        Err($crate::ConfError::Invalid(format!($($arg)*)))
    };
}

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfError {
    /// The file or environment failed to parse.
    Parse(figment::Error),
    /// The description parsed but names something the hardware model
    /// cannot express.
    Invalid(String),
}

impl fmt::Display for ConfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfError::Parse(err) => write!(f, "Error: parsing configuration: {err}"),
            ConfError::Invalid(msg) => write!(f, "Error: invalid configuration: {msg}"),
        }
    }
}

impl Error for ConfError {}

/// One endpoint group: a run of channel ids sharing a service half, an
/// owning IP and a register window.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EndpointConf {
    pub service: String,
    pub ip: u32,
    pub ids: Vec<u32>,
    pub addr: u64,
    pub module: String,
    pub module_type: String,
}

impl EndpointConf {
    fn service(&self) -> Result<Service, ConfError> {
        match self.service.to_lowercase().as_str() {
            "tws" => Ok(Service::Tws),
            "trs" => Ok(Service::Trs),
            other => conf_error!("unknown service '{other}' for ip {}", self.ip),
        }
    }

    fn module_type(&self) -> Result<ModuleType, ConfError> {
        match self.module_type.to_lowercase().as_str() {
            "m16s16" => Ok(ModuleType::M16S16),
            "m2m2" => Ok(ModuleType::M2M2),
            "m3m3" => Ok(ModuleType::M3M3),
            "m1m13" => Ok(ModuleType::M1M13),
            other => conf_error!("unknown module_type '{other}' for ip {}", self.ip),
        }
    }

    // The module family is implied by the module type; the explicit field
    // exists to catch copy-paste mistakes in the platform description.
    fn check_module(&self, module_type: ModuleType) -> Result<(), ConfError> {
        let family = format!("{}", module_type.family());
        if self.module.to_lowercase() != family {
            return conf_error!(
                "module '{}' does not match module_type '{}' (expected '{family}') for ip {}",
                self.module,
                self.module_type,
                self.ip
            );
        }
        Ok(())
    }
}

/// One device's catalogue.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DeviceConf {
    pub name: String,
    pub endpoints: Vec<EndpointConf>,
}

impl DeviceConf {
    /// Expand the endpoint groups into the slot list a
    /// [`RingDevice`](votf_ring::device::RingDevice) is built from.
    pub fn slots(&self) -> Result<Vec<EndpointSlot>, ConfError> {
        let mut slots = Vec::new();
        for endpoint in &self.endpoints {
            let service = endpoint.service()?;
            let module_type = endpoint.module_type()?;
            endpoint.check_module(module_type)?;
            if endpoint.ids.is_empty() {
                return conf_error!(
                    "empty ids for {} ip {} on device {}",
                    endpoint.service,
                    endpoint.ip,
                    self.name
                );
            }
            for &id in &endpoint.ids {
                slots.push(EndpointSlot {
                    service,
                    ip: endpoint.ip,
                    id,
                    addr: endpoint.addr,
                    module_type,
                });
            }
        }
        Ok(slots)
    }
}

/// The whole platform description.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RingConf {
    pub devices: Vec<DeviceConf>,
}

impl RingConf {
    /// Load from a TOML file with `VOTF_`-prefixed environment variables
    /// layered on top.
    pub fn from_file(path: &Path) -> Result<Self, ConfError> {
        Self::extract(Figment::from(Toml::file(path)))
    }

    /// Load from an in-memory TOML string, environment included.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfError> {
        Self::extract(Figment::from(Toml::string(toml)))
    }

    fn extract(figment: Figment) -> Result<Self, ConfError> {
        let conf: RingConf = figment
            .merge(Env::prefixed("VOTF_").split("__"))
            .extract()
            .map_err(ConfError::Parse)?;
        for device in &conf.devices {
            // Surface slot-expansion problems at load time, not device
            // bring-up.
            device.slots()?;
        }
        Ok(conf)
    }

    #[must_use]
    pub fn device(&self, name: &str) -> Option<&DeviceConf> {
        self.devices.iter().find(|device| device.name == name)
    }
}
