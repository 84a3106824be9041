use crate::Fault;

/// Execution-state machine of the hart as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to fetch the next instruction.
    #[default]
    Running,
    /// Stopped by `ECALL`/`EBREAK`; every step is a no-op until reset.
    Jammed,
    /// A decode or execution fault is latched; no progress until reset.
    FaultLatched(Fault),
}

impl RunState {
    /// Returns the latched fault, if this state is fault-latched.
    #[must_use]
    pub const fn latched_fault(self) -> Option<Fault> {
        match self {
            Self::FaultLatched(fault) => Some(fault),
            Self::Running | Self::Jammed => None,
        }
    }

    /// Returns `true` when the hart was halted by an instruction.
    #[must_use]
    pub const fn is_jammed(self) -> bool {
        matches!(self, Self::Jammed)
    }
}
