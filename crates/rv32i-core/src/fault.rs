use thiserror::Error;

/// Fault classes used to tell decode failures from dispatch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultKind {
    /// Opcode has no entry in the encoding-shape table.
    Decode,
    /// Opcode/funct3 combination has no entry in the dispatch table.
    Execution,
}

/// Faults raised by a single fetch/decode/execute step.
///
/// Both kinds stop forward progress. Neither is the same thing as the hart
/// jamming on `ECALL`/`EBREAK`, which is a deliberate halt and not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// The fetched word carries an opcode outside the shape table.
    #[error("decode fault: unknown opcode 0x{opcode:02X} in word 0x{word:08X}")]
    Decode {
        /// Raw little-endian instruction word.
        word: u32,
        /// Low seven bits of `word`.
        opcode: u8,
    },
    /// The decoded instruction has no operation for its opcode and `funct3`.
    #[error(
        "execution fault: undefined instruction 0x{word:08X} (opcode 0x{opcode:02X}, funct3 {funct3})"
    )]
    Execution {
        /// Raw little-endian instruction word.
        word: u32,
        /// Low seven bits of `word`.
        opcode: u8,
        /// Dispatch `funct3` value of the decoded shape.
        funct3: u8,
    },
}

impl Fault {
    /// Returns the classification of this fault.
    #[must_use]
    pub const fn kind(self) -> FaultKind {
        match self {
            Self::Decode { .. } => FaultKind::Decode,
            Self::Execution { .. } => FaultKind::Execution,
        }
    }

    /// Returns the raw instruction word that caused the fault.
    #[must_use]
    pub const fn word(self) -> u32 {
        match self {
            Self::Decode { word, .. } | Self::Execution { word, .. } => word,
        }
    }
}
