//! Per-category operation kernels shared by register and immediate forms.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use crate::encoding::Operation;
use crate::memory::{read_u16_le, read_u32_le, write_u16_le, write_u32_le, AddressSpace};

/// Applies an integer ALU operation. `b` is `rs2` or the sign-extended immediate.
///
/// Shift amounts use only the low five bits of `b` for every shift form.
#[must_use]
pub const fn alu(operation: Operation, a: u32, b: u32) -> Option<u32> {
    let shamt = b & 0x1F;
    let value = match operation {
        Operation::Add | Operation::Addi => a.wrapping_add(b),
        Operation::Sub => a.wrapping_sub(b),
        Operation::Sll | Operation::Slli => a << shamt,
        Operation::Slt | Operation::Slti => ((a as i32) < (b as i32)) as u32,
        Operation::Sltu | Operation::Sltiu => (a < b) as u32,
        Operation::Xor | Operation::Xori => a ^ b,
        Operation::Srl | Operation::Srli => a >> shamt,
        Operation::Sra | Operation::Srai => ((a as i32) >> shamt) as u32,
        Operation::Or | Operation::Ori => a | b,
        Operation::And | Operation::Andi => a & b,
        _ => return None,
    };
    Some(value)
}

/// Evaluates a branch condition.
#[must_use]
pub const fn branch_taken(operation: Operation, a: u32, b: u32) -> Option<bool> {
    let taken = match operation {
        Operation::Beq => a == b,
        Operation::Bne => a != b,
        Operation::Blt => (a as i32) < (b as i32),
        Operation::Bge => (a as i32) >= (b as i32),
        Operation::Bltu => a < b,
        Operation::Bgeu => a >= b,
        _ => return None,
    };
    Some(taken)
}

/// Performs a load, sign- or zero-extending to 32 bits.
pub fn load<B: AddressSpace + ?Sized>(operation: Operation, bus: &mut B, addr: u32) -> Option<u32> {
    let value = match operation {
        Operation::Lb => i32::from(bus.read_byte(addr) as i8) as u32,
        Operation::Lh => i32::from(read_u16_le(bus, addr) as i16) as u32,
        Operation::Lw => read_u32_le(bus, addr),
        Operation::Lbu => u32::from(bus.read_byte(addr)),
        Operation::Lhu => u32::from(read_u16_le(bus, addr)),
        _ => return None,
    };
    Some(value)
}

/// Stores the low 1, 2 or 4 bytes of `value`. Returns `false` for non-stores.
#[allow(clippy::cast_possible_truncation)]
pub fn store<B: AddressSpace + ?Sized>(
    operation: Operation,
    bus: &mut B,
    addr: u32,
    value: u32,
) -> bool {
    match operation {
        Operation::Sb => bus.write_byte(addr, value as u8),
        Operation::Sh => write_u16_le(bus, addr, value as u16),
        Operation::Sw => write_u32_le(bus, addr, value),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{alu, branch_taken, load, store};
    use crate::encoding::Operation;
    use crate::memory::FlatMemory;

    #[rstest]
    #[case(Operation::Add, 0xFFFF_FFFF, 1, 0)]
    #[case(Operation::Sub, 0, 1, 0xFFFF_FFFF)]
    #[case(Operation::Sll, 1, 33, 2)]
    #[case(Operation::Slli, 1, 31, 0x8000_0000)]
    #[case(Operation::Srl, 0x8000_0000, 31, 1)]
    #[case(Operation::Sra, 0x8000_0000, 31, 0xFFFF_FFFF)]
    #[case(Operation::Srai, 0x8000_0000, 0x404, 0xF800_0000)]
    #[case(Operation::Slt, 0xFFFF_FFFF, 1, 1)]
    #[case(Operation::Sltu, 0xFFFF_FFFF, 1, 0)]
    #[case(Operation::Sltiu, 0, 0xFFFF_FFFF, 1)]
    #[case(Operation::Xori, 0x0F0F, 0xFFFF_FFFF, 0xFFFF_F0F0)]
    #[case(Operation::Or, 0xF0, 0x0F, 0xFF)]
    #[case(Operation::Andi, 0x1234, 0xFF, 0x34)]
    fn alu_kernel_semantics(
        #[case] operation: Operation,
        #[case] a: u32,
        #[case] b: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(alu(operation, a, b), Some(expected));
    }

    #[test]
    fn alu_rejects_non_alu_operations() {
        assert_eq!(alu(Operation::Beq, 1, 1), None);
        assert_eq!(branch_taken(Operation::Add, 1, 1), None);
    }

    #[rstest]
    #[case(Operation::Beq, 5, 5, true)]
    #[case(Operation::Bne, 5, 5, false)]
    #[case(Operation::Blt, 0xFFFF_FFFF, 1, true)]
    #[case(Operation::Bltu, 0xFFFF_FFFF, 1, false)]
    #[case(Operation::Bge, 1, 0xFFFF_FFFF, true)]
    #[case(Operation::Bgeu, 1, 0xFFFF_FFFF, false)]
    fn branch_conditions(
        #[case] operation: Operation,
        #[case] a: u32,
        #[case] b: u32,
        #[case] expected: bool,
    ) {
        assert_eq!(branch_taken(operation, a, b), Some(expected));
    }

    #[test]
    fn loads_extend_by_signedness() {
        let mut memory = FlatMemory::new(8);
        assert!(store(Operation::Sw, &mut memory, 0, 0x8001_80FF));

        assert_eq!(load(Operation::Lb, &mut memory, 0), Some(0xFFFF_FFFF));
        assert_eq!(load(Operation::Lbu, &mut memory, 0), Some(0xFF));
        assert_eq!(load(Operation::Lh, &mut memory, 0), Some(0xFFFF_80FF));
        assert_eq!(load(Operation::Lhu, &mut memory, 0), Some(0x80FF));
        assert_eq!(load(Operation::Lw, &mut memory, 0), Some(0x8001_80FF));
        assert_eq!(load(Operation::Sw, &mut memory, 0), None);
    }

    #[test]
    fn narrow_stores_touch_only_their_bytes() {
        let mut memory = FlatMemory::new(8);
        assert!(store(Operation::Sw, &mut memory, 0, 0xFFFF_FFFF));
        assert!(store(Operation::Sb, &mut memory, 0, 0x1234_5678));
        assert!(store(Operation::Sh, &mut memory, 2, 0xABCD_EF01));
        assert!(!store(Operation::Lw, &mut memory, 0, 0));

        assert_eq!(memory.as_slice()[..4], [0x78, 0xFF, 0x01, 0xEF]);
    }
}
