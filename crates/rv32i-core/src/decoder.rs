//! Instruction fetch and field extraction.
//!
//! Decoding only classifies the opcode into a [`Shape`] and pulls out the
//! fields that shape defines, sign-extending immediates. Whether the
//! `(opcode, funct3)` pair names a real operation is decided at dispatch.

use crate::encoding::{
    classify_opcode, encode_b, encode_i, encode_j, encode_r, encode_s, encode_u,
    resolve_operation, Operation, Shape, OPCODE_BRANCH, OPCODE_JAL,
};
use crate::fault::Fault;
use crate::memory::{read_u32_le, AddressSpace};
use crate::state::{ArchitecturalState, Register};

/// Operand fields of a decoded instruction, one variant per shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Operands {
    R {
        rd: Register,
        funct3: u8,
        rs1: Register,
        rs2: Register,
        funct7: u8,
    },
    /// `funct7` is bits 31:25 of the word; only shift-immediates consult it.
    I {
        rd: Register,
        funct3: u8,
        rs1: Register,
        imm: i32,
        funct7: u8,
    },
    S {
        funct3: u8,
        rs1: Register,
        rs2: Register,
        imm: i32,
    },
    B {
        funct3: u8,
        rs1: Register,
        rs2: Register,
        imm: i32,
    },
    /// `imm` already has its low 12 bits cleared.
    U { rd: Register, imm: u32 },
    J { rd: Register, imm: i32 },
    Fence,
    System,
}

/// A fetched word split into its shape-specific fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Raw little-endian word as fetched.
    pub raw: u32,
    /// Low seven bits of `raw`.
    pub opcode: u8,
    /// Shape-specific fields.
    pub operands: Operands,
}

impl DecodedInstruction {
    /// Returns the encoding shape implied by the operand variant.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        match self.operands {
            Operands::R { .. } => Shape::R,
            Operands::I { .. } => Shape::I,
            Operands::S { .. } => Shape::S,
            Operands::B { .. } => Shape::B,
            Operands::U { .. } => Shape::U,
            Operands::J { .. } => Shape::J,
            Operands::Fence => Shape::F,
            Operands::System => Shape::E,
        }
    }

    /// Returns the dispatch `funct3`. Shapes without the field report 0.
    #[must_use]
    pub const fn funct3(&self) -> u8 {
        match self.operands {
            Operands::R { funct3, .. }
            | Operands::I { funct3, .. }
            | Operands::S { funct3, .. }
            | Operands::B { funct3, .. } => funct3,
            Operands::U { .. } | Operands::J { .. } | Operands::Fence | Operands::System => 0,
        }
    }

    /// Returns the `funct7` tiebreak. Shapes without the field report 0.
    #[must_use]
    pub const fn funct7(&self) -> u8 {
        match self.operands {
            Operands::R { funct7, .. } | Operands::I { funct7, .. } => funct7,
            _ => 0,
        }
    }

    /// Looks up the operation in the dispatch table.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        resolve_operation(self.opcode, self.funct3(), self.funct7())
    }

    /// Re-encodes the operand fields into a word.
    ///
    /// Bits a shape does not carry come back as zero, so `FENCE` and
    /// `EBREAK` re-encode to their bare opcode.
    #[must_use]
    pub const fn encode(&self) -> u32 {
        match self.operands {
            Operands::R {
                rd,
                funct3,
                rs1,
                rs2,
                funct7,
            } => encode_r(self.opcode, rd, funct3, rs1, rs2, funct7),
            Operands::I {
                rd,
                funct3,
                rs1,
                imm,
                ..
            } => encode_i(self.opcode, rd, funct3, rs1, imm),
            Operands::S {
                funct3,
                rs1,
                rs2,
                imm,
            } => encode_s(self.opcode, funct3, rs1, rs2, imm),
            Operands::B {
                funct3,
                rs1,
                rs2,
                imm,
            } => {
                debug_assert!(self.opcode == OPCODE_BRANCH);
                encode_b(funct3, rs1, rs2, imm)
            }
            Operands::U { rd, imm } => encode_u(self.opcode, rd, imm),
            Operands::J { rd, imm } => {
                debug_assert!(self.opcode == OPCODE_JAL);
                encode_j(rd, imm)
            }
            Operands::Fence | Operands::System => (self.opcode & 0x7F) as u32,
        }
    }
}

/// Sign-extends the low `bits` bits of `value`.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

#[allow(clippy::cast_possible_truncation)]
const fn field(word: u32, lsb: u32, mask: u32) -> u8 {
    ((word >> lsb) & mask) as u8
}

/// Extracts the sign-extended I-shape immediate (`word[31:20]`).
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn imm_i(word: u32) -> i32 {
    (word as i32) >> 20
}

/// Extracts the sign-extended S-shape immediate (`word[31:25] ++ word[11:7]`).
#[must_use]
pub const fn imm_s(word: u32) -> i32 {
    let value = ((word >> 20) & 0xFE0) | ((word >> 7) & 0x1F);
    sign_extend(value, 12)
}

/// Extracts the sign-extended B-shape immediate. Bit 0 is always zero.
#[must_use]
pub const fn imm_b(word: u32) -> i32 {
    let value = ((word >> 19) & 0x1000)
        | ((word << 4) & 0x800)
        | ((word >> 20) & 0x7E0)
        | ((word >> 7) & 0x1E);
    sign_extend(value, 13)
}

/// Extracts the U-shape immediate with its low 12 bits cleared.
#[must_use]
pub const fn imm_u(word: u32) -> u32 {
    word & 0xFFFF_F000
}

/// Extracts the sign-extended J-shape immediate. Bit 0 is always zero.
#[must_use]
pub const fn imm_j(word: u32) -> i32 {
    let value = ((word >> 11) & 0x10_0000)
        | (word & 0xF_F000)
        | ((word >> 9) & 0x800)
        | ((word >> 20) & 0x7FE);
    sign_extend(value, 21)
}

/// Stateless instruction-word decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes one 32-bit word.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Decode`] when the opcode has no shape.
    pub fn decode(word: u32) -> Result<DecodedInstruction, Fault> {
        let opcode = field(word, 0, 0x7F);
        let Some(shape) = classify_opcode(opcode) else {
            return Err(Fault::Decode { word, opcode });
        };

        let rd = Register::from_field(word, 7);
        let rs1 = Register::from_field(word, 15);
        let rs2 = Register::from_field(word, 20);
        let funct3 = field(word, 12, 0x7);
        let funct7 = field(word, 25, 0x7F);

        let operands = match shape {
            Shape::R => Operands::R {
                rd,
                funct3,
                rs1,
                rs2,
                funct7,
            },
            Shape::I => Operands::I {
                rd,
                funct3,
                rs1,
                imm: imm_i(word),
                funct7,
            },
            Shape::S => Operands::S {
                funct3,
                rs1,
                rs2,
                imm: imm_s(word),
            },
            Shape::B => Operands::B {
                funct3,
                rs1,
                rs2,
                imm: imm_b(word),
            },
            Shape::U => Operands::U {
                rd,
                imm: imm_u(word),
            },
            Shape::J => Operands::J {
                rd,
                imm: imm_j(word),
            },
            Shape::F => Operands::Fence,
            Shape::E => Operands::System,
        };

        Ok(DecodedInstruction {
            raw: word,
            opcode,
            operands,
        })
    }
}

/// Reads the word at `pc`, advances `pc` by 4, then decodes.
///
/// The program counter moves even when decoding fails, so after a fault
/// `pc - 4` still names the offending instruction.
///
/// # Errors
///
/// Returns [`Fault::Decode`] for an unknown opcode.
pub fn fetch<B: AddressSpace + ?Sized>(
    state: &mut ArchitecturalState,
    bus: &mut B,
) -> Result<DecodedInstruction, Fault> {
    let pc = state.pc();
    let word = read_u32_le(bus, pc);
    state.set_pc(pc.wrapping_add(4));
    Decoder::decode(word)
}
