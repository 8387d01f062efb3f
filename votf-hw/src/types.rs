// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared hardware-level types.

use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};

/// The two register-layout families a VOTF module can belong to.
///
/// "Service" modules multiplex many TWS/TRS channels behind one register
/// window; "agent" modules front a DMA engine and express token sizes in
/// pixel terms rather than bytes.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum ModuleFamily {
    #[default]
    Service,
    Agent,
}

impl fmt::Display for ModuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModuleFamily::Service => write!(f, "service"),
            ModuleFamily::Agent => write!(f, "agent"),
        }
    }
}

/// Decoded value of a channel's low-level debug/state register.
///
/// The raw register carries the token-handshake state machine of one
/// channel. Only the states the diagnostics care about are named; anything
/// else is reported raw by the caller.
#[derive(Copy, Clone, Debug, Default, Eq, FromPrimitive, PartialEq, ToPrimitive)]
pub enum DebugState {
    #[default]
    Idle = 0,
    WaitConnection = 1,
    Processing = 2,
    WaitTokenAck = 3,
    WaitResetAck = 4,
}

impl DebugState {
    /// Decode a raw debug-register value. Returns `None` for states this
    /// layer does not name.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        num_traits::FromPrimitive::from_u32(raw)
    }
}

impl fmt::Display for DebugState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DebugState::Idle => write!(f, "IDLE"),
            DebugState::WaitConnection => write!(f, "WAIT_CONNECTION"),
            DebugState::Processing => write!(f, "PROCESSING"),
            DebugState::WaitTokenAck => write!(f, "WAIT_TOKEN_ACK"),
            DebugState::WaitResetAck => write!(f, "WAIT_RESET_ACK"),
        }
    }
}
