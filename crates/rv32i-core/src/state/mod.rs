//! Architectural hart state model primitives.

/// Register file, register identifiers and reset defaults.
pub mod registers;
/// Host-observable run/halt/fault state machine.
pub mod run_state;

pub use registers::{
    ArchitecturalState, Register, ABI_REGISTER_NAMES, DEFAULT_RESET_REGISTER_VALUE,
    GENERAL_REGISTER_COUNT,
};
pub use run_state::RunState;
