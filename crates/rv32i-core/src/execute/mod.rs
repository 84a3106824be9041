//! Instruction execution and the stepping loop.
//!
//! Fetch has already advanced `pc` by 4 when [`execute`] runs, so the
//! instruction's own address is `pc - 4`. PC-relative targets (`AUIPC`,
//! `JAL`, taken branches) are computed from that address; link registers
//! receive the post-fetch `pc`.

#![allow(clippy::cast_sign_loss)]

mod alu;

pub use alu::{alu, branch_taken, load, store};

use crate::decoder::{fetch, DecodedInstruction, Operands};
use crate::encoding::Operation;
use crate::memory::AddressSpace;
use crate::state::{ArchitecturalState, RunState};
use crate::{Fault, ProcessorState, RunOutcome, StepOutcome};

/// Outcome of executing one decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecuteOutcome {
    /// The instruction completed and the hart keeps running.
    Retired,
    /// `ECALL`/`EBREAK` executed; the caller must jam the hart.
    Jammed,
}

/// Executes one decoded instruction against `state` and `bus`.
///
/// # Errors
///
/// Returns [`Fault::Execution`] when `(opcode, funct3[, funct7])` has no
/// entry in the dispatch table. Nothing is modified in that case.
pub fn execute<B: AddressSpace + ?Sized>(
    state: &mut ArchitecturalState,
    instr: &DecodedInstruction,
    bus: &mut B,
) -> Result<ExecuteOutcome, Fault> {
    let undefined = || Fault::Execution {
        word: instr.raw,
        opcode: instr.opcode,
        funct3: instr.funct3(),
    };
    let operation = instr.operation().ok_or_else(undefined)?;

    let next_pc = state.pc();
    let inst_pc = next_pc.wrapping_sub(4);

    match instr.operands {
        Operands::R { rd, rs1, rs2, .. } => {
            let value = alu(operation, state.gpr(rs1), state.gpr(rs2)).ok_or_else(undefined)?;
            state.set_gpr(rd, value);
        }
        Operands::I { rd, rs1, imm, .. } => {
            let base = state.gpr(rs1);
            let offset = imm as u32;
            match operation {
                Operation::Jalr => {
                    let target = base.wrapping_add(offset) & !1;
                    state.set_gpr(rd, next_pc);
                    state.set_pc(target);
                }
                Operation::Lb
                | Operation::Lh
                | Operation::Lw
                | Operation::Lbu
                | Operation::Lhu => {
                    let value = load(operation, bus, base.wrapping_add(offset))
                        .ok_or_else(undefined)?;
                    state.set_gpr(rd, value);
                }
                _ => {
                    let value = alu(operation, base, offset).ok_or_else(undefined)?;
                    state.set_gpr(rd, value);
                }
            }
        }
        Operands::S { rs1, rs2, imm, .. } => {
            let addr = state.gpr(rs1).wrapping_add(imm as u32);
            if !store(operation, bus, addr, state.gpr(rs2)) {
                return Err(undefined());
            }
        }
        Operands::B { rs1, rs2, imm, .. } => {
            let taken =
                branch_taken(operation, state.gpr(rs1), state.gpr(rs2)).ok_or_else(undefined)?;
            if taken {
                state.set_pc(inst_pc.wrapping_add(imm as u32));
            }
        }
        Operands::U { rd, imm } => match operation {
            Operation::Lui => state.set_gpr(rd, imm),
            Operation::Auipc => state.set_gpr(rd, inst_pc.wrapping_add(imm)),
            _ => return Err(undefined()),
        },
        Operands::J { rd, imm } => {
            state.set_gpr(rd, next_pc);
            state.set_pc(inst_pc.wrapping_add(imm as u32));
        }
        Operands::Fence => {
            log::debug!("FENCE at {inst_pc:#010x} ignored");
        }
        Operands::System => {
            log::info!("hart jammed by {} at {inst_pc:#010x}", system_mnemonic(instr.raw));
            return Ok(ExecuteOutcome::Jammed);
        }
    }

    Ok(ExecuteOutcome::Retired)
}

const fn system_mnemonic(raw: u32) -> &'static str {
    if raw & (1 << 20) == 0 {
        "ECALL"
    } else {
        "EBREAK"
    }
}

/// Fetches, decodes and executes one instruction.
///
/// A jammed hart does nothing and reports [`StepOutcome::Idle`]. A
/// fault-latched hart reports its latched fault again without fetching.
/// A new fault is latched before it is returned.
///
/// # Errors
///
/// Returns the decode or execution fault raised by this step, or the one
/// latched earlier.
pub fn step_one<B: AddressSpace + ?Sized>(
    state: &mut ProcessorState,
    bus: &mut B,
) -> Result<StepOutcome, Fault> {
    match state.run_state {
        RunState::FaultLatched(fault) => return Err(fault),
        RunState::Jammed => return Ok(StepOutcome::Idle),
        RunState::Running => {}
    }

    let pc = state.arch.pc();
    let result = fetch(&mut state.arch, bus).and_then(|instruction| {
        execute(&mut state.arch, &instruction, bus).map(|outcome| (instruction, outcome))
    });

    match result {
        Ok((instruction, ExecuteOutcome::Retired)) => {
            log::trace!("{pc:#010x}: {:#010x}", instruction.raw);
            Ok(StepOutcome::Retired { pc, instruction })
        }
        Ok((instruction, ExecuteOutcome::Jammed)) => {
            state.run_state = RunState::Jammed;
            Ok(StepOutcome::Jammed { pc, instruction })
        }
        Err(fault) => {
            log::warn!("{fault} at {pc:#010x}");
            state.run_state = RunState::FaultLatched(fault);
            Err(fault)
        }
    }
}

/// Steps until `max_steps` instructions have executed or the hart jams.
///
/// # Errors
///
/// Returns the first fault raised. Instructions executed before it stay
/// applied.
pub fn run_batch<B: AddressSpace + ?Sized>(
    state: &mut ProcessorState,
    bus: &mut B,
    max_steps: u32,
) -> Result<RunOutcome, Fault> {
    run_batch_with(state, bus, max_steps, |_| {})
}

/// Like [`run_batch`], calling `observe` after every executed instruction.
///
/// # Errors
///
/// Returns the first fault raised.
pub fn run_batch_with<B, F>(
    state: &mut ProcessorState,
    bus: &mut B,
    max_steps: u32,
    mut observe: F,
) -> Result<RunOutcome, Fault>
where
    B: AddressSpace + ?Sized,
    F: FnMut(&StepOutcome),
{
    let mut steps = 0;
    let mut final_step = StepOutcome::Idle;

    while steps < max_steps {
        final_step = step_one(state, bus)?;
        match final_step {
            StepOutcome::Retired { .. } => {
                steps += 1;
                observe(&final_step);
            }
            StepOutcome::Jammed { .. } => {
                steps += 1;
                observe(&final_step);
                break;
            }
            StepOutcome::Idle => break,
        }
    }

    Ok(RunOutcome { steps, final_step })
}
