//! Opcode-to-shape and operation dispatch tables, plus word encoders.

use crate::state::Register;

/// `LUI` opcode (`0110111`).
pub const OPCODE_LUI: u8 = 0x37;
/// `AUIPC` opcode (`0010111`).
pub const OPCODE_AUIPC: u8 = 0x17;
/// `JAL` opcode (`1101111`).
pub const OPCODE_JAL: u8 = 0x6F;
/// `JALR` opcode (`1100111`).
pub const OPCODE_JALR: u8 = 0x67;
/// Conditional branch opcode (`1100011`).
pub const OPCODE_BRANCH: u8 = 0x63;
/// Load opcode (`0000011`).
pub const OPCODE_LOAD: u8 = 0x03;
/// Store opcode (`0100011`).
pub const OPCODE_STORE: u8 = 0x23;
/// Register-immediate ALU and constant-shift opcode (`0010011`).
pub const OPCODE_OP_IMM: u8 = 0x13;
/// Register-register ALU opcode (`0110011`).
pub const OPCODE_OP: u8 = 0x33;
/// `FENCE` opcode (`0001111`).
pub const OPCODE_MISC_MEM: u8 = 0x0F;
/// `ECALL`/`EBREAK` opcode (`1110011`).
pub const OPCODE_SYSTEM: u8 = 0x73;

/// Fixed field layouts of a 32-bit instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Shape {
    /// Register-register: `rd, funct3, rs1, rs2, funct7`.
    R,
    /// Register-immediate: `rd, funct3, rs1, imm[11:0]`.
    I,
    /// Store: `funct3, rs1, rs2, imm[11:5|4:0]`.
    S,
    /// Branch: `funct3, rs1, rs2, imm[12|10:5|4:1|11]`.
    B,
    /// Upper immediate: `rd, imm[31:12]`.
    U,
    /// Jump: `rd, imm[20|10:1|11|19:12]`.
    J,
    /// `FENCE`; no operand fields are used.
    F,
    /// `ECALL`/`EBREAK`; no operand fields are used.
    E,
}

/// Single source-of-truth opcode-to-shape table.
///
/// Any opcode not present here is a decode fault.
pub const OPCODE_SHAPE_TABLE: &[(u8, Shape)] = &[
    (OPCODE_LUI, Shape::U),
    (OPCODE_AUIPC, Shape::U),
    (OPCODE_JAL, Shape::J),
    (OPCODE_BRANCH, Shape::B),
    (OPCODE_JALR, Shape::I),
    (OPCODE_LOAD, Shape::I),
    (OPCODE_OP_IMM, Shape::I),
    (OPCODE_STORE, Shape::S),
    (OPCODE_OP, Shape::R),
    (OPCODE_MISC_MEM, Shape::F),
    (OPCODE_SYSTEM, Shape::E),
];

/// Returns the encoding shape for a 7-bit opcode. `None` means undecodable.
#[must_use]
pub fn classify_opcode(opcode: u8) -> Option<Shape> {
    OPCODE_SHAPE_TABLE
        .iter()
        .find_map(|(entry, shape)| (*entry == opcode).then_some(*shape))
}

/// Base-integer operations reachable through the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Operation {
    Lui,
    Auipc,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Fence,
    /// `ECALL` and `EBREAK` share one behaviour: jam the hart.
    Environment,
}

impl Operation {
    /// Upper-case mnemonic used by the disassembler.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Lui => "LUI",
            Self::Auipc => "AUIPC",
            Self::Jal => "JAL",
            Self::Jalr => "JALR",
            Self::Beq => "BEQ",
            Self::Bne => "BNE",
            Self::Blt => "BLT",
            Self::Bge => "BGE",
            Self::Bltu => "BLTU",
            Self::Bgeu => "BGEU",
            Self::Lb => "LB",
            Self::Lh => "LH",
            Self::Lw => "LW",
            Self::Lbu => "LBU",
            Self::Lhu => "LHU",
            Self::Sb => "SB",
            Self::Sh => "SH",
            Self::Sw => "SW",
            Self::Addi => "ADDI",
            Self::Slti => "SLTI",
            Self::Sltiu => "SLTIU",
            Self::Xori => "XORI",
            Self::Ori => "ORI",
            Self::Andi => "ANDI",
            Self::Slli => "SLLI",
            Self::Srli => "SRLI",
            Self::Srai => "SRAI",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Sll => "SLL",
            Self::Slt => "SLT",
            Self::Sltu => "SLTU",
            Self::Xor => "XOR",
            Self::Srl => "SRL",
            Self::Sra => "SRA",
            Self::Or => "OR",
            Self::And => "AND",
            Self::Fence => "FENCE",
            Self::Environment => "ECALL",
        }
    }
}

/// How `funct7` bit 5 selects between operations sharing `(opcode, funct3)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Funct7Select {
    /// `funct7` is not consulted.
    Any,
    /// Bit 5 of `funct7` is clear (`ADD`, `SRL`, `SRLI`).
    Base,
    /// Bit 5 of `funct7` is set (`SUB`, `SRA`, `SRAI`).
    Alternate,
}

impl Funct7Select {
    const fn accepts(self, funct7: u8) -> bool {
        match self {
            Self::Any => true,
            Self::Base => funct7 & 0x20 == 0,
            Self::Alternate => funct7 & 0x20 != 0,
        }
    }
}

/// Two-level dispatch table keyed by `(opcode, funct3)` with a `funct7` tiebreak.
///
/// Any combination not present here is an execution fault.
pub const OPERATION_TABLE: &[(u8, u8, Funct7Select, Operation)] = &[
    (OPCODE_LUI, 0, Funct7Select::Any, Operation::Lui),
    (OPCODE_AUIPC, 0, Funct7Select::Any, Operation::Auipc),
    (OPCODE_JAL, 0, Funct7Select::Any, Operation::Jal),
    (OPCODE_JALR, 0, Funct7Select::Any, Operation::Jalr),
    (OPCODE_BRANCH, 0, Funct7Select::Any, Operation::Beq),
    (OPCODE_BRANCH, 1, Funct7Select::Any, Operation::Bne),
    (OPCODE_BRANCH, 4, Funct7Select::Any, Operation::Blt),
    (OPCODE_BRANCH, 5, Funct7Select::Any, Operation::Bge),
    (OPCODE_BRANCH, 6, Funct7Select::Any, Operation::Bltu),
    (OPCODE_BRANCH, 7, Funct7Select::Any, Operation::Bgeu),
    (OPCODE_LOAD, 0, Funct7Select::Any, Operation::Lb),
    (OPCODE_LOAD, 1, Funct7Select::Any, Operation::Lh),
    (OPCODE_LOAD, 2, Funct7Select::Any, Operation::Lw),
    (OPCODE_LOAD, 4, Funct7Select::Any, Operation::Lbu),
    (OPCODE_LOAD, 5, Funct7Select::Any, Operation::Lhu),
    (OPCODE_STORE, 0, Funct7Select::Any, Operation::Sb),
    (OPCODE_STORE, 1, Funct7Select::Any, Operation::Sh),
    (OPCODE_STORE, 2, Funct7Select::Any, Operation::Sw),
    (OPCODE_OP_IMM, 0, Funct7Select::Any, Operation::Addi),
    (OPCODE_OP_IMM, 1, Funct7Select::Any, Operation::Slli),
    (OPCODE_OP_IMM, 2, Funct7Select::Any, Operation::Slti),
    (OPCODE_OP_IMM, 3, Funct7Select::Any, Operation::Sltiu),
    (OPCODE_OP_IMM, 4, Funct7Select::Any, Operation::Xori),
    (OPCODE_OP_IMM, 5, Funct7Select::Base, Operation::Srli),
    (OPCODE_OP_IMM, 5, Funct7Select::Alternate, Operation::Srai),
    (OPCODE_OP_IMM, 6, Funct7Select::Any, Operation::Ori),
    (OPCODE_OP_IMM, 7, Funct7Select::Any, Operation::Andi),
    (OPCODE_OP, 0, Funct7Select::Base, Operation::Add),
    (OPCODE_OP, 0, Funct7Select::Alternate, Operation::Sub),
    (OPCODE_OP, 1, Funct7Select::Any, Operation::Sll),
    (OPCODE_OP, 2, Funct7Select::Any, Operation::Slt),
    (OPCODE_OP, 3, Funct7Select::Any, Operation::Sltu),
    (OPCODE_OP, 4, Funct7Select::Any, Operation::Xor),
    (OPCODE_OP, 5, Funct7Select::Base, Operation::Srl),
    (OPCODE_OP, 5, Funct7Select::Alternate, Operation::Sra),
    (OPCODE_OP, 6, Funct7Select::Any, Operation::Or),
    (OPCODE_OP, 7, Funct7Select::Any, Operation::And),
    (OPCODE_MISC_MEM, 0, Funct7Select::Any, Operation::Fence),
    (OPCODE_SYSTEM, 0, Funct7Select::Any, Operation::Environment),
];

/// Looks up the operation for a dispatch key. `None` means undefined.
#[must_use]
pub fn resolve_operation(opcode: u8, funct3: u8, funct7: u8) -> Option<Operation> {
    OPERATION_TABLE
        .iter()
        .find_map(|(entry_opcode, entry_funct3, select, operation)| {
            (*entry_opcode == opcode && *entry_funct3 == funct3 && select.accepts(funct7))
                .then_some(*operation)
        })
}

const fn opcode_bits(opcode: u8) -> u32 {
    (opcode & 0x7F) as u32
}

const fn funct3_bits(funct3: u8) -> u32 {
    ((funct3 & 0x7) as u32) << 12
}

const fn reg_bits(reg: Register, lsb: u32) -> u32 {
    (reg.number() as u32) << lsb
}

/// Encodes an R-shape word.
#[must_use]
pub const fn encode_r(
    opcode: u8,
    rd: Register,
    funct3: u8,
    rs1: Register,
    rs2: Register,
    funct7: u8,
) -> u32 {
    opcode_bits(opcode)
        | reg_bits(rd, 7)
        | funct3_bits(funct3)
        | reg_bits(rs1, 15)
        | reg_bits(rs2, 20)
        | (((funct7 & 0x7F) as u32) << 25)
}

/// Encodes an I-shape word. Only the low 12 bits of `imm` are kept.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_i(opcode: u8, rd: Register, funct3: u8, rs1: Register, imm: i32) -> u32 {
    opcode_bits(opcode)
        | reg_bits(rd, 7)
        | funct3_bits(funct3)
        | reg_bits(rs1, 15)
        | (((imm as u32) & 0xFFF) << 20)
}

/// Encodes an S-shape word, splitting `imm[11:5]` and `imm[4:0]`.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_s(opcode: u8, funct3: u8, rs1: Register, rs2: Register, imm: i32) -> u32 {
    let imm = imm as u32;
    opcode_bits(opcode)
        | ((imm & 0x1F) << 7)
        | funct3_bits(funct3)
        | reg_bits(rs1, 15)
        | reg_bits(rs2, 20)
        | (((imm >> 5) & 0x7F) << 25)
}

/// Encodes a B-shape word, scattering `imm[12|10:5|4:1|11]`. Bit 0 is dropped.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_b(funct3: u8, rs1: Register, rs2: Register, imm: i32) -> u32 {
    let imm = imm as u32;
    opcode_bits(OPCODE_BRANCH)
        | (((imm >> 11) & 0x1) << 7)
        | (((imm >> 1) & 0xF) << 8)
        | funct3_bits(funct3)
        | reg_bits(rs1, 15)
        | reg_bits(rs2, 20)
        | (((imm >> 5) & 0x3F) << 25)
        | (((imm >> 12) & 0x1) << 31)
}

/// Encodes a U-shape word. Only `imm[31:12]` is kept.
#[must_use]
pub const fn encode_u(opcode: u8, rd: Register, imm: u32) -> u32 {
    opcode_bits(opcode) | reg_bits(rd, 7) | (imm & 0xFFFF_F000)
}

/// Encodes a `JAL` word, scattering `imm[20|10:1|11|19:12]`. Bit 0 is dropped.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn encode_j(rd: Register, imm: i32) -> u32 {
    let imm = imm as u32;
    opcode_bits(OPCODE_JAL)
        | reg_bits(rd, 7)
        | (imm & 0x000F_F000)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 1) & 0x3FF) << 21)
        | (((imm >> 20) & 0x1) << 31)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        classify_opcode, encode_b, encode_i, encode_j, encode_r, encode_s, encode_u,
        resolve_operation, Operation, Shape, OPCODE_BRANCH, OPCODE_JALR, OPCODE_LUI, OPCODE_OP,
        OPCODE_OP_IMM, OPCODE_SHAPE_TABLE, OPCODE_STORE, OPCODE_SYSTEM, OPERATION_TABLE,
    };
    use crate::state::Register;

    fn x(n: u8) -> Register {
        Register::from_u5(n).expect("register number in range")
    }

    #[test]
    fn shape_table_contains_unique_opcodes() {
        let opcodes: HashSet<_> = OPCODE_SHAPE_TABLE.iter().map(|(op, _)| *op).collect();
        assert_eq!(opcodes.len(), OPCODE_SHAPE_TABLE.len());
    }

    #[test]
    fn every_dispatch_entry_has_a_shape() {
        for (opcode, _, _, _) in OPERATION_TABLE {
            assert!(classify_opcode(*opcode).is_some(), "opcode {opcode:#04X}");
        }
    }

    #[test]
    fn unknown_opcodes_have_no_shape() {
        assert_eq!(classify_opcode(0x00), None);
        assert_eq!(classify_opcode(0x7F), None);
        assert_eq!(classify_opcode(0x07), None);
        assert_eq!(classify_opcode(OPCODE_JALR), Some(Shape::I));
    }

    #[test]
    fn funct7_bit_five_breaks_ties() {
        assert_eq!(resolve_operation(OPCODE_OP, 0, 0x00), Some(Operation::Add));
        assert_eq!(resolve_operation(OPCODE_OP, 0, 0x20), Some(Operation::Sub));
        assert_eq!(resolve_operation(OPCODE_OP, 5, 0x00), Some(Operation::Srl));
        assert_eq!(resolve_operation(OPCODE_OP, 5, 0x20), Some(Operation::Sra));
        assert_eq!(resolve_operation(OPCODE_OP_IMM, 5, 0x00), Some(Operation::Srli));
        assert_eq!(resolve_operation(OPCODE_OP_IMM, 5, 0x20), Some(Operation::Srai));
        assert_eq!(resolve_operation(OPCODE_OP_IMM, 0, 0x7F), Some(Operation::Addi));
    }

    #[test]
    fn unassigned_funct3_values_are_undefined() {
        assert_eq!(resolve_operation(OPCODE_BRANCH, 2, 0), None);
        assert_eq!(resolve_operation(OPCODE_BRANCH, 3, 0), None);
        assert_eq!(resolve_operation(OPCODE_STORE, 3, 0), None);
        assert_eq!(resolve_operation(OPCODE_LUI, 1, 0), None);
        assert_eq!(resolve_operation(OPCODE_SYSTEM, 0, 0), Some(Operation::Environment));
    }

    #[test]
    fn encoders_match_reference_words() {
        // add t0, t1, t2
        assert_eq!(encode_r(OPCODE_OP, x(5), 0, x(6), x(7), 0), 0x0073_02B3);
        // addi a0, zero, -1
        assert_eq!(encode_i(OPCODE_OP_IMM, x(10), 0, x(0), -1), 0xFFF0_0513);
        // sw a1, 8(sp)
        assert_eq!(encode_s(OPCODE_STORE, 2, x(2), x(11), 8), 0x00B1_2423);
        // beq zero, zero, -4
        assert_eq!(encode_b(0, x(0), x(0), -4), 0xFE00_0EE3);
        // lui a0, 0x12345
        assert_eq!(encode_u(OPCODE_LUI, x(10), 0x1234_5000), 0x1234_5537);
        // jal ra, 2048
        assert_eq!(encode_j(x(1), 2048), 0x0010_00EF);
    }
}
