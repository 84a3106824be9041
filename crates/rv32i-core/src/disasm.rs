//! Textual rendering of decoded instructions.
//!
//! Output is upper-case mnemonic followed by comma-separated operands, e.g.
//! `ADD t0, t1, t2`, `LW a0, -4(sp)` or `SW ra, 12(sp)`.

use std::fmt;

use crate::decoder::{DecodedInstruction, Decoder, Operands};
use crate::encoding::{Operation, OPCODE_JALR, OPCODE_LOAD, OPCODE_OP_IMM};
use crate::state::Register;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How register operands are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RegisterNaming {
    /// Calling-convention names (`zero`, `ra`, `sp`, `t0`, ...).
    #[default]
    Abi,
    /// Raw register numbers (`x0` .. `x31`).
    Numeric,
}

impl RegisterNaming {
    /// Returns a displayable name for `reg`.
    #[must_use]
    pub const fn name(self, reg: Register) -> RegisterName {
        RegisterName { reg, naming: self }
    }
}

/// A register rendered under a [`RegisterNaming`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterName {
    reg: Register,
    naming: RegisterNaming,
}

impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.naming {
            RegisterNaming::Abi => f.write_str(self.reg.abi_name()),
            RegisterNaming::Numeric => write!(f, "x{}", self.reg.number()),
        }
    }
}

/// Mnemonic shown for words whose `(opcode, funct3)` has no operation.
pub const UNDEFINED_MNEMONIC: &str = "UNDEFINED";

fn mnemonic(instr: &DecodedInstruction) -> &'static str {
    match instr.operation() {
        Some(Operation::Environment) if instr.raw & (1 << 20) != 0 => "EBREAK",
        Some(operation) => operation.mnemonic(),
        None => UNDEFINED_MNEMONIC,
    }
}

const fn is_shift_immediate(instr: &DecodedInstruction) -> bool {
    matches!(
        instr.operands,
        Operands::I {
            funct3: 1 | 5,
            ..
        }
    ) && instr.opcode == OPCODE_OP_IMM
}

const fn uses_base_offset(opcode: u8) -> bool {
    matches!(opcode, OPCODE_LOAD | OPCODE_JALR)
}

/// Renders one decoded instruction.
///
/// Shift-immediates show only the 5-bit shift amount. Upper immediates are
/// shown in hex with their low 12 bits already cleared.
#[must_use]
pub fn disassemble(instr: &DecodedInstruction, naming: RegisterNaming) -> String {
    let op = mnemonic(instr);
    let reg = |r: Register| naming.name(r);

    match instr.operands {
        Operands::R { rd, rs1, rs2, .. } => {
            format!("{op} {}, {}, {}", reg(rd), reg(rs1), reg(rs2))
        }
        Operands::I { rd, rs1, imm, .. } if uses_base_offset(instr.opcode) => {
            format!("{op} {}, {imm}({})", reg(rd), reg(rs1))
        }
        Operands::I { rd, rs1, imm, .. } if is_shift_immediate(instr) => {
            format!("{op} {}, {}, {}", reg(rd), reg(rs1), imm & 0x1F)
        }
        Operands::I { rd, rs1, imm, .. } => {
            format!("{op} {}, {}, {imm}", reg(rd), reg(rs1))
        }
        Operands::S { rs1, rs2, imm, .. } => {
            format!("{op} {}, {imm}({})", reg(rs2), reg(rs1))
        }
        Operands::B { rs1, rs2, imm, .. } => {
            format!("{op} {}, {}, {imm}", reg(rs1), reg(rs2))
        }
        Operands::U { rd, imm } => format!("{op} {}, {imm:#x}", reg(rd)),
        Operands::J { rd, imm } => format!("{op} {}, {imm}", reg(rd)),
        Operands::Fence | Operands::System => op.to_owned(),
    }
}

/// A single row of a linear listing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the word.
    pub addr: u32,
    /// Raw little-endian word.
    pub raw: u32,
    /// Rendered text, or `None` when the opcode does not decode.
    pub text: Option<String>,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}: {:08x}  ", self.addr, self.raw)?;
        match &self.text {
            Some(text) => f.write_str(text),
            None => f.write_str("<unknown>"),
        }
    }
}

/// Disassembles `image` word by word as if loaded at `base`.
///
/// A trailing partial word is zero-padded.
#[must_use]
pub fn disassemble_listing(
    base: u32,
    image: &[u8],
    naming: RegisterNaming,
) -> Vec<DisassemblyRow> {
    (0_u32..)
        .step_by(4)
        .zip(image.chunks(4))
        .map(|(offset, chunk)| {
            let mut bytes = [0_u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            let raw = u32::from_le_bytes(bytes);
            DisassemblyRow {
                addr: base.wrapping_add(offset),
                raw,
                text: Decoder::decode(raw)
                    .ok()
                    .map(|instr| disassemble(&instr, naming)),
            }
        })
        .collect()
}
