// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Register catalogues for the two VOTF module families.
//!
//! Each variant names one per-channel register and maps to its SFR byte
//! offset inside the channel's register group. The address resolver in
//! `votf-ring` combines these with the module base address and the
//! per-channel gap to produce the final window offset, so the values here
//! are group-relative only.

/// Per-channel registers of a "service"-family module.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ServiceReg {
    TwsEnable,
    TwsLimit,
    TwsDest,
    TwsTokenSize,
    TwsFlush,
    TwsBusy,
    TwsIrqEnable,
    TwsIrqClear,
    TwsDebug,
    TrsEnable,
    TrsLimit,
    TrsTokenSize,
    TrsFirstTokenSize,
    TrsFrameSize,
    TrsFlush,
    TrsBusy,
    TrsFullness,
    TrsThreshold,
    TrsCropStart,
    TrsCropEnable,
    TrsReadBytes,
    TrsIrqEnable,
    TrsIrqClear,
    TrsDebug,
    TrsLostEnable,
}

impl ServiceReg {
    /// SFR byte offset of this register within its channel group.
    #[must_use]
    pub fn sfr_offset(self) -> u32 {
        match self {
            ServiceReg::TwsEnable => 0x00,
            ServiceReg::TwsLimit => 0x04,
            ServiceReg::TwsDest => 0x08,
            ServiceReg::TwsTokenSize => 0x0c,
            ServiceReg::TwsFlush => 0x10,
            ServiceReg::TwsBusy => 0x14,
            ServiceReg::TwsIrqEnable => 0x18,
            ServiceReg::TwsIrqClear => 0x1c,
            ServiceReg::TwsDebug => 0x20,
            ServiceReg::TrsEnable => 0x00,
            ServiceReg::TrsLimit => 0x04,
            ServiceReg::TrsTokenSize => 0x08,
            ServiceReg::TrsFirstTokenSize => 0x0c,
            ServiceReg::TrsFrameSize => 0x10,
            ServiceReg::TrsFlush => 0x14,
            ServiceReg::TrsBusy => 0x18,
            ServiceReg::TrsFullness => 0x1c,
            ServiceReg::TrsThreshold => 0x20,
            ServiceReg::TrsCropStart => 0x24,
            ServiceReg::TrsCropEnable => 0x28,
            ServiceReg::TrsReadBytes => 0x2c,
            ServiceReg::TrsIrqEnable => 0x30,
            ServiceReg::TrsIrqClear => 0x34,
            ServiceReg::TrsDebug => 0x38,
            ServiceReg::TrsLostEnable => 0x3c,
        }
    }
}

/// Per-channel registers of an "agent"-family module.
///
/// Agent modules pack the same verbs in a different order and add nothing
/// new; the distinct catalogue exists because the two families are free to
/// diverge between hardware revisions.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AgentReg {
    TwsEnable,
    TwsDest,
    TwsLimit,
    TwsTokenSize,
    TwsBusy,
    TwsFlush,
    TwsIrqEnable,
    TwsIrqClear,
    TwsDebug,
    TrsEnable,
    TrsLimit,
    TrsTokenSize,
    TrsFirstTokenSize,
    TrsFrameSize,
    TrsBusy,
    TrsFlush,
    TrsFullness,
    TrsThreshold,
    TrsCropStart,
    TrsCropEnable,
    TrsReadBytes,
    TrsIrqEnable,
    TrsIrqClear,
    TrsDebug,
    TrsLostEnable,
}

impl AgentReg {
    /// SFR byte offset of this register within its channel group.
    #[must_use]
    pub fn sfr_offset(self) -> u32 {
        match self {
            AgentReg::TwsEnable => 0x00,
            AgentReg::TwsDest => 0x04,
            AgentReg::TwsLimit => 0x08,
            AgentReg::TwsTokenSize => 0x0c,
            AgentReg::TwsBusy => 0x10,
            AgentReg::TwsFlush => 0x14,
            AgentReg::TwsIrqEnable => 0x18,
            AgentReg::TwsIrqClear => 0x1c,
            AgentReg::TwsDebug => 0x20,
            AgentReg::TrsEnable => 0x00,
            AgentReg::TrsLimit => 0x04,
            AgentReg::TrsTokenSize => 0x08,
            AgentReg::TrsFirstTokenSize => 0x0c,
            AgentReg::TrsFrameSize => 0x10,
            AgentReg::TrsBusy => 0x14,
            AgentReg::TrsFlush => 0x18,
            AgentReg::TrsFullness => 0x1c,
            AgentReg::TrsThreshold => 0x20,
            AgentReg::TrsCropStart => 0x24,
            AgentReg::TrsCropEnable => 0x28,
            AgentReg::TrsReadBytes => 0x2c,
            AgentReg::TrsIrqEnable => 0x30,
            AgentReg::TrsIrqClear => 0x34,
            AgentReg::TrsDebug => 0x38,
            AgentReg::TrsLostEnable => 0x3c,
        }
    }
}
