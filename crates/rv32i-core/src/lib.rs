//! Single-hart RV32I emulator core.
//!
//! The core fetches, decodes and executes base-integer instructions against a
//! host-supplied [`AddressSpace`]. It owns no memory and no devices.

/// Address-space port and little-endian access helpers.
pub mod memory;
pub use memory::{read_u16_le, read_u32_le, write_u16_le, write_u32_le, AddressSpace, FlatMemory};

/// Register file, reset defaults and run state.
pub mod state;
pub use state::{
    ArchitecturalState, Register, RunState, ABI_REGISTER_NAMES, DEFAULT_RESET_REGISTER_VALUE,
    GENERAL_REGISTER_COUNT,
};

/// Decode and execution fault taxonomy.
pub mod fault;
pub use fault::{Fault, FaultKind};

/// Opcode-shape and dispatch tables plus word encoders.
pub mod encoding;
pub use encoding::{
    classify_opcode, encode_b, encode_i, encode_j, encode_r, encode_s, encode_u,
    resolve_operation, Funct7Select, Operation, Shape, OPCODE_SHAPE_TABLE, OPERATION_TABLE,
};

/// Fetch and field extraction.
pub mod decoder;
pub use decoder::{fetch, sign_extend, DecodedInstruction, Decoder, Operands};

/// Instruction execution and stepping loop.
pub mod execute;
pub use execute::{execute, run_batch, run_batch_with, step_one, ExecuteOutcome};

/// Mnemonic rendering.
pub mod disasm;
pub use disasm::{disassemble, disassemble_listing, DisassemblyRow, RegisterNaming};

/// Register-file trace line.
pub mod dump;
pub use dump::dump_state;

/// Host-facing configuration and driving types.
pub mod api;
pub use api::{CoreConfig, Hart, ProcessorState, RunOutcome, StepOutcome, DEFAULT_RESET_PC};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
