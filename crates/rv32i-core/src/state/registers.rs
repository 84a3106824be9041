/// Number of architecturally visible general-purpose registers (`x0..x31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;

/// Reset value loaded into every general register except `x0`.
///
/// This is the top of the 1 MiB RAM window minus one. It is applied to all
/// registers, not only `sp`, and programs may rely on that.
pub const DEFAULT_RESET_REGISTER_VALUE: u32 = 0x000F_FFFF;

/// Calling-convention names indexed by register number.
pub const ABI_REGISTER_NAMES: [&str; GENERAL_REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// General-purpose register identifier, always in `0..32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Register(u8);

impl Register {
    /// Hardwired zero register `x0`.
    pub const ZERO: Self = Self(0);
    /// Return-address register `x1`.
    pub const RA: Self = Self(1);
    /// Stack-pointer register `x2`.
    pub const SP: Self = Self(2);

    /// Builds a register from a 5-bit encoding field.
    #[must_use]
    pub const fn from_u5(bits: u8) -> Option<Self> {
        if bits < 32 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Extracts the 5-bit register field starting at bit `lsb` of `word`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_field(word: u32, lsb: u32) -> Self {
        Self(((word >> lsb) & 0x1F) as u8)
    }

    /// Returns the register number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the calling-convention name (`zero`, `ra`, `sp`, ...).
    #[must_use]
    pub const fn abi_name(self) -> &'static str {
        ABI_REGISTER_NAMES[self.index()]
    }

    /// Iterates `x0..=x31` in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0_u8..32).map(Self)
    }
}

/// Register file and program counter of the single hart.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u32; GENERAL_REGISTER_COUNT],
    pc: u32,
}

impl Default for ArchitecturalState {
    fn default() -> Self {
        Self::with_reset(0, DEFAULT_RESET_REGISTER_VALUE)
    }
}

impl ArchitecturalState {
    /// Builds the reset image: `pc = reset_pc`, `x1..x31 = register_value`.
    #[must_use]
    pub const fn with_reset(reset_pc: u32, register_value: u32) -> Self {
        let mut gpr = [register_value; GENERAL_REGISTER_COUNT];
        gpr[0] = 0;
        Self { gpr, pc: reset_pc }
    }

    /// Reads a general-purpose register. `x0` always reads zero.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> u32 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register. Writes to `x0` are discarded.
    pub const fn set_gpr(&mut self, reg: Register, value: u32) {
        if reg.0 != 0 {
            self.gpr[reg.index()] = value;
        }
    }

    /// Returns all 32 register values in index order.
    #[must_use]
    pub const fn gprs(&self) -> &[u32; GENERAL_REGISTER_COUNT] {
        &self.gpr
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }
}
