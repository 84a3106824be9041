//! CLI entry point for the rv32i-run host.

use std::io::{self, ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use rv32i_core::{disassemble_listing, CoreConfig, Hart, RegisterNaming};
use rv32i_run::{
    key_codes, load_image, parse_number, run_with, DeviceBus, HostConfig, KeyDecoder, RunOptions,
    StopReason, ROM_BASE,
};
#[cfg(test)]
use rstest as _;
use serde as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use toml as _;

/// Run a raw RV32I program image against the terminal device map
#[derive(Parser)]
#[command(name = "rv32i-run")]
#[command(version, about, long_about = None)]
struct Args {
    /// Raw program image, mapped at 0x100010
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Reset program counter (decimal or 0x-hex)
    #[arg(long, value_parser = parse_number)]
    entry: Option<u32>,

    /// Instructions per batch
    #[arg(long)]
    batch: Option<u32>,

    /// Stop after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print a register dump after every instruction to stderr
    #[arg(long)]
    trace: bool,

    /// Print a disassembly listing of the image and exit
    #[arg(long)]
    disassemble: bool,

    /// Name registers x0..x31 instead of ABI names
    #[arg(long)]
    reg_nums: bool,

    /// Keys to queue for the keyboard register ahead of stdin
    #[arg(long)]
    input: Option<String>,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    fn host_config(&self) -> Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)?,
            None => HostConfig::default(),
        };
        if let Some(entry) = self.entry {
            config.entry = entry;
        }
        if let Some(batch) = self.batch {
            config.batch = batch;
        }
        if self.max_steps.is_some() {
            config.max_steps = self.max_steps;
        }
        Ok(config)
    }

    const fn naming(&self) -> RegisterNaming {
        if self.reg_nums {
            RegisterNaming::Numeric
        } else {
            RegisterNaming::Abi
        }
    }
}

/// Forwards stdin to the run loop as it arrives.
///
/// A terminal hands over input a line at a time; a pipe as soon as it is
/// written. The thread ends at EOF or when the receiver is dropped.
fn spawn_key_reader() -> Result<Receiver<Vec<u8>>> {
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-keys".into())
        .spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut decoder = KeyDecoder::new();
            let mut buf = [0_u8; 256];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let keys = decoder.feed(&buf[..n]);
                        if !keys.is_empty() && sender.send(keys).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == ErrorKind::Interrupted => {}
                    Err(err) => {
                        log::warn!("stopped reading keys from stdin: {err}");
                        break;
                    }
                }
            }
        })
        .context("failed to start the stdin reader")?;
    Ok(receiver)
}

fn print_listing(image: &[u8], naming: RegisterNaming) -> Result<()> {
    let mut out = io::stdout().lock();
    for row in disassemble_listing(ROM_BASE, image, naming) {
        writeln!(out, "{row}")?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = args.host_config()?;
    let image = load_image(&args.image)?;

    if args.disassemble {
        print_listing(&image, args.naming())?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut bus = DeviceBus::new(image, io::stdout().lock(), &config);
    if let Some(input) = &args.input {
        bus.push_keys(&key_codes(input.as_bytes()));
    }
    let keys = spawn_key_reader()?;

    let core_config = CoreConfig {
        reset_pc: config.entry,
        ..CoreConfig::default()
    };
    let mut hart = Hart::new(core_config, bus);
    log::info!("starting at {:#010x}", config.entry);

    let options = RunOptions {
        batch: config.batch,
        max_steps: config.max_steps,
        naming: args.naming(),
    };
    let mut stderr = io::stderr().lock();
    let trace: Option<&mut dyn Write> = if args.trace {
        Some(&mut stderr)
    } else {
        None
    };
    let report = run_with(&mut hart, options, trace, |bus| {
        for chunk in keys.try_iter() {
            bus.push_keys(&chunk);
        }
    });
    hart.bus_mut()
        .flush_console()
        .context("failed to flush console")?;

    match report.reason {
        StopReason::Jammed { pc } => {
            log::info!("Jammed! at {pc:#010x} after {} instructions", report.steps);
            Ok(ExitCode::SUCCESS)
        }
        StopReason::StepLimit => {
            log::info!("step limit reached after {} instructions", report.steps);
            Ok(ExitCode::SUCCESS)
        }
        StopReason::Fault(fault) => {
            log::error!(
                "{fault} at {:#010x} after {} instructions",
                hart.state().pc().wrapping_sub(4),
                report.steps
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
