//! Host-facing configuration, state and driving entry points.

use crate::decoder::DecodedInstruction;
use crate::disasm::RegisterNaming;
use crate::dump::dump_state;
use crate::execute::{run_batch_with, step_one};
use crate::memory::AddressSpace;
use crate::state::{ArchitecturalState, Register, RunState, DEFAULT_RESET_REGISTER_VALUE};
use crate::Fault;

/// Default entry point: the start of the ROM window at 1 MiB + 16.
pub const DEFAULT_RESET_PC: u32 = 0x0010_0010;

/// Immutable configuration for a hart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Program counter loaded on reset.
    pub reset_pc: u32,
    /// Value loaded into `x1..x31` on reset.
    pub reset_register_value: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            reset_pc: DEFAULT_RESET_PC,
            reset_register_value: DEFAULT_RESET_REGISTER_VALUE,
        }
    }
}

/// Complete host-visible hart state used by the stepping entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProcessorState {
    /// Register file and program counter.
    pub arch: ArchitecturalState,
    /// Running, jammed or fault-latched.
    pub run_state: RunState,
    reset_register_value: u32,
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self::new(&CoreConfig::default())
    }
}

impl ProcessorState {
    /// Creates a state already reset to `config.reset_pc`.
    #[must_use]
    pub const fn new(config: &CoreConfig) -> Self {
        Self {
            arch: ArchitecturalState::with_reset(config.reset_pc, config.reset_register_value),
            run_state: RunState::Running,
            reset_register_value: config.reset_register_value,
        }
    }

    /// Resets to `reset_pc`: reloads every register with the configured reset
    /// value, clears the halt flag and drops any latched fault.
    pub const fn initialize(&mut self, reset_pc: u32) {
        self.arch = ArchitecturalState::with_reset(reset_pc, self.reset_register_value);
        self.run_state = RunState::Running;
    }

    /// Reads a general-purpose register.
    #[must_use]
    pub const fn reg(&self, reg: Register) -> u32 {
        self.arch.gpr(reg)
    }

    /// Writes a general-purpose register. Writes to `x0` are discarded.
    pub const fn set_reg(&mut self, reg: Register, value: u32) {
        self.arch.set_gpr(reg, value);
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.arch.pc()
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.arch.set_pc(value);
    }

    /// Returns `true` once `ECALL`/`EBREAK` has jammed the hart.
    ///
    /// A latched fault also stops progress but is not reported here.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.run_state.is_jammed()
    }

    /// Returns the fault that stopped the hart, if any.
    #[must_use]
    pub const fn latched_fault(&self) -> Option<Fault> {
        self.run_state.latched_fault()
    }
}

/// Output status from one step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The instruction at `pc` retired normally.
    Retired {
        /// Address of the retired instruction.
        pc: u32,
        /// The decoded instruction.
        instruction: DecodedInstruction,
    },
    /// The instruction at `pc` was `ECALL`/`EBREAK` and the hart is now jammed.
    Jammed {
        /// Address of the jamming instruction.
        pc: u32,
        /// The decoded instruction.
        instruction: DecodedInstruction,
    },
    /// The hart was already jammed; nothing happened.
    Idle,
}

impl StepOutcome {
    /// Returns the instruction executed by this step, if one was.
    #[must_use]
    pub const fn instruction(&self) -> Option<&DecodedInstruction> {
        match self {
            Self::Retired { instruction, .. } | Self::Jammed { instruction, .. } => {
                Some(instruction)
            }
            Self::Idle => None,
        }
    }

    /// Returns the address and instruction executed by this step, if one was.
    #[must_use]
    pub const fn executed(&self) -> Option<(u32, DecodedInstruction)> {
        match *self {
            Self::Retired { pc, instruction } | Self::Jammed { pc, instruction } => {
                Some((pc, instruction))
            }
            Self::Idle => None,
        }
    }
}

/// Aggregated outcome of a batch of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of instructions executed, including a final jamming one.
    pub steps: u32,
    /// Last step-level status observed before returning.
    pub final_step: StepOutcome,
}

/// Owns a hart's state together with the address space it runs against.
#[derive(Debug)]
pub struct Hart<B: AddressSpace> {
    config: CoreConfig,
    state: ProcessorState,
    bus: B,
    last: Option<(u32, DecodedInstruction)>,
}

impl<B: AddressSpace> Hart<B> {
    /// Creates a hart reset to `config.reset_pc`.
    pub const fn new(config: CoreConfig, bus: B) -> Self {
        Self {
            config,
            state: ProcessorState::new(&config),
            bus,
            last: None,
        }
    }

    /// Resets the hart to `reset_pc`. Memory is left untouched.
    pub const fn initialize(&mut self, reset_pc: u32) {
        self.state.initialize(reset_pc);
        self.last = None;
    }

    /// Resets the hart to the configured entry point.
    pub const fn reset(&mut self) {
        self.initialize(self.config.reset_pc);
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// Returns the decode or execution fault raised by this step, or the
    /// fault latched by an earlier one.
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        let result = step_one(&mut self.state, &mut self.bus);
        match &result {
            Ok(outcome) => {
                if let Some(executed) = outcome.executed() {
                    self.last = Some(executed);
                }
            }
            Err(_) => self.last = None,
        }
        result
    }

    /// Executes up to `max_steps` instructions, stopping early on a jam.
    ///
    /// # Errors
    ///
    /// Returns the first fault raised; steps already executed stay applied.
    pub fn run_batch(&mut self, max_steps: u32) -> Result<RunOutcome, Fault> {
        let mut last = self.last;
        let result = run_batch_with(&mut self.state, &mut self.bus, max_steps, |outcome| {
            if let Some(executed) = outcome.executed() {
                last = Some(executed);
            }
        });
        self.last = if result.is_ok() { last } else { None };
        result
    }

    /// Returns `true` once the hart is jammed.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    /// Borrows the hart state.
    #[must_use]
    pub const fn state(&self) -> &ProcessorState {
        &self.state
    }

    /// Mutably borrows the hart state.
    pub const fn state_mut(&mut self) -> &mut ProcessorState {
        &mut self.state
    }

    /// Borrows the address space.
    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrows the address space.
    pub const fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Returns the configuration this hart was built with.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Renders the last executed instruction and the register file.
    ///
    /// Returns `None` until an instruction has executed since reset, and
    /// after a step faults.
    #[must_use]
    pub fn dump(&self, naming: RegisterNaming) -> Option<String> {
        self.last
            .as_ref()
            .map(|(addr, instruction)| dump_state(*addr, &self.state.arch, instruction, naming))
    }

    /// Consumes the hart and returns its address space.
    pub fn into_bus(self) -> B {
        self.bus
    }
}
