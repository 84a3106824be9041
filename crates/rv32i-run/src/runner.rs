//! Batch loop driving a [`Hart`] until it jams, faults or runs out of steps.

use std::io::Write;

use rv32i_core::{AddressSpace, Fault, Hart, RegisterNaming, StepOutcome};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// ECALL or EBREAK at `pc`.
    Jammed {
        /// Address of the halting instruction.
        pc: u32,
    },
    /// The step limit was reached.
    StepLimit,
    /// Decode or execution fault.
    Fault(Fault),
}

/// Result of [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Instructions executed, including a final ECALL/EBREAK.
    pub steps: u64,
    /// Batches started.
    pub batches: u64,
    /// Why the loop ended.
    pub reason: StopReason,
}

/// Options for [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Steps per batch.
    pub batch: u32,
    /// Overall step limit.
    pub max_steps: Option<u64>,
    /// Register naming used for trace lines.
    pub naming: RegisterNaming,
}

/// Runs `hart` in batches.
///
/// With a `trace` sink, the hart is stepped one instruction at a time and a
/// state dump is written after each one.
pub fn run<B: AddressSpace>(
    hart: &mut Hart<B>,
    options: RunOptions,
    trace: Option<&mut dyn Write>,
) -> RunReport {
    run_with(hart, options, trace, |_| {})
}

/// Like [`run`], but calls `before_batch` with the bus ahead of every batch.
///
/// The host uses this to hand newly arrived keys to the guest.
pub fn run_with<B, F>(
    hart: &mut Hart<B>,
    options: RunOptions,
    mut trace: Option<&mut dyn Write>,
    mut before_batch: F,
) -> RunReport
where
    B: AddressSpace,
    F: FnMut(&mut B),
{
    let batch = options.batch.max(1);
    let mut steps = 0_u64;
    let mut batches = 0_u64;

    let reason = loop {
        let remaining = options
            .max_steps
            .map_or(u64::from(batch), |max| max.saturating_sub(steps));
        if remaining == 0 {
            break StopReason::StepLimit;
        }
        let chunk = u32::try_from(remaining).map_or(batch, |r| r.min(batch));
        batches += 1;
        before_batch(hart.bus_mut());

        let result = match trace.as_deref_mut() {
            Some(sink) => traced_batch(hart, chunk, options.naming, sink),
            None => hart
                .run_batch(chunk)
                .map(|outcome| (outcome.steps, outcome.final_step)),
        };

        match result {
            Ok((done, last)) => {
                steps += u64::from(done);
                if let StepOutcome::Jammed { pc, .. } = last {
                    break StopReason::Jammed { pc };
                }
                if done < chunk {
                    // A halted hart idles without retiring anything.
                    break StopReason::Jammed {
                        pc: hart.state().pc().wrapping_sub(4),
                    };
                }
            }
            Err(fault) => break StopReason::Fault(fault),
        }
    };

    log::debug!("run stopped after {steps} steps in {batches} batches: {reason:?}");
    RunReport {
        steps,
        batches,
        reason,
    }
}

fn traced_batch<B: AddressSpace>(
    hart: &mut Hart<B>,
    chunk: u32,
    naming: RegisterNaming,
    sink: &mut dyn Write,
) -> Result<(u32, StepOutcome), Fault> {
    let mut done = 0;
    let mut last = StepOutcome::Idle;
    while done < chunk {
        last = hart.step()?;
        if last == StepOutcome::Idle {
            break;
        }
        done += 1;
        if let Some(line) = hart.dump(naming) {
            if let Err(err) = writeln!(sink, "{line}") {
                log::warn!("trace write failed: {err}");
            }
        }
        if matches!(last, StepOutcome::Jammed { .. }) {
            break;
        }
    }
    Ok((done, last))
}
