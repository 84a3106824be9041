//! Throughput harness for rv32i-core.
//!
//! Runs small endless loops through `run_batch` in the same 2000-step
//! batches a display-driven host uses, on several threads at once.
//!
//! ```sh
//! cargo run --release -p rv32i-core --example throughput
//! ```
//!
//! Reported per loop: instructions per second, and how many 60 Hz hosts
//! running 2000 instructions per frame that rate could sustain.

#![allow(clippy::pedantic)]

use log as _;
use proptest as _;
use rstest as _;
use rv32i_core::{
    encode_b, encode_i, encode_j, encode_r, encode_s, run_batch, CoreConfig, FlatMemory,
    ProcessorState, Register,
};
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const BATCH_STEPS: u32 = 2000;
const FRAMES_PER_SECOND: f64 = 60.0;
const NUM_THREADS: usize = 4;
const RUN_DURATION: Duration = Duration::from_secs(2);

const OP_IMM: u8 = 0x13;
const OP: u8 = 0x33;
const LOAD: u8 = 0x03;
const STORE: u8 = 0x23;

fn x(n: u8) -> Register {
    Register::from_u5(n).unwrap()
}

#[derive(Debug, Clone, Copy)]
struct BenchmarkResult {
    name: &'static str,
    instructions_per_second: f64,
    hosts_at_60hz: f64,
}

fn alu_loop() -> Vec<u32> {
    vec![
        encode_i(OP_IMM, x(1), 0, x(1), 1),
        encode_r(OP, x(2), 0, x(2), x(1), 0),
        encode_r(OP, x(3), 4, x(2), x(1), 0),
        encode_i(OP_IMM, x(4), 5, x(3), 0x400 | 3),
        encode_j(Register::ZERO, -16),
    ]
}

fn memory_loop() -> Vec<u32> {
    vec![
        encode_s(STORE, 2, Register::SP, x(1), -4),
        encode_i(LOAD, x(2), 2, Register::SP, -4),
        encode_i(LOAD, x(3), 4, Register::SP, -3),
        encode_s(STORE, 0, Register::SP, x(3), -8),
        encode_j(Register::ZERO, -16),
    ]
}

fn branch_loop() -> Vec<u32> {
    vec![
        encode_i(OP_IMM, x(1), 0, x(1), -1),
        encode_b(1, x(1), Register::ZERO, -4),
        encode_i(OP_IMM, x(1), 0, Register::ZERO, 1000),
        encode_j(Register::ZERO, -12),
    ]
}

fn benchmark(name: &'static str, program: fn() -> Vec<u32>) -> BenchmarkResult {
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let tx = tx.clone();
            thread::spawn(move || {
                let mut memory = FlatMemory::new(0x10_0000);
                let image: Vec<u8> = program().iter().flat_map(|w| w.to_le_bytes()).collect();
                memory.load(0, &image);

                let config = CoreConfig {
                    reset_pc: 0,
                    ..CoreConfig::default()
                };
                let mut state = ProcessorState::new(&config);

                let mut total_instructions = 0u64;
                let start = Instant::now();

                while start.elapsed() < RUN_DURATION {
                    match run_batch(&mut state, &mut memory, BATCH_STEPS) {
                        Ok(outcome) => total_instructions += u64::from(outcome.steps),
                        Err(fault) => {
                            eprintln!("{name}: {fault}");
                            break;
                        }
                    }
                }

                tx.send(total_instructions).ok();
            })
        })
        .collect();

    for h in handles {
        h.join().ok();
    }

    drop(tx);

    let total_instructions: u64 = rx.iter().sum();
    let instructions_per_second = total_instructions as f64 / RUN_DURATION.as_secs_f64();

    BenchmarkResult {
        name,
        instructions_per_second,
        hosts_at_60hz: instructions_per_second / (f64::from(BATCH_STEPS) * FRAMES_PER_SECOND),
    }
}

fn format_number(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.2}", n)
    }
}

fn main() {
    let results = [
        benchmark("alu_loop", alu_loop),
        benchmark("memory_loop", memory_loop),
        benchmark("branch_loop", branch_loop),
    ];

    println!(
        "threads: {NUM_THREADS}, batch: {BATCH_STEPS} steps, duration: {:?}",
        RUN_DURATION
    );
    println!("{:12} | {:>12} | {:>12}", "loop", "instr/sec", "hosts@60Hz");
    for result in &results {
        println!(
            "{:12} | {:>12} | {:>12.1}",
            result.name,
            format_number(result.instructions_per_second),
            result.hosts_at_60hz
        );
    }
}
