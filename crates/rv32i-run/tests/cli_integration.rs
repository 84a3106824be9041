//! Integration tests for the rv32i-run CLI.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow as _;
use clap as _;
use env_logger as _;
use log as _;
use rstest::rstest;
use rv32i_core::{encode_b, encode_i, encode_j, encode_s, encode_u, Register};
use rv32i_run::RAM_SIZE;
use serde as _;
use thiserror as _;
use toml as _;

const LUI: u8 = 0x37;
const LOAD: u8 = 0x03;
const STORE: u8 = 0x23;
const OP_IMM: u8 = 0x13;
const ECALL: u32 = 0x0000_0073;

fn x(n: u8) -> Register {
    Register::from_u5(n).expect("register number in range")
}

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rv32i-run"))
}

fn write_image(dir: &Path, name: &str, words: &[u32]) -> PathBuf {
    let path = dir.join(name);
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    fs::write(&path, bytes).unwrap();
    path
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run rv32i-run")
}

fn run_cli_with_stdin(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(binary_path())
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start rv32i-run");
    let mut pipe = child.stdin.take().expect("stdin is piped");
    pipe.write_all(stdin).unwrap();
    drop(pipe);
    child.wait_with_output().expect("failed to wait for rv32i-run")
}

/// Echoes `count` keys, spinning on the keyboard register until each arrives.
fn wait_and_echo_program(count: usize) -> Vec<u32> {
    let mut words = vec![encode_u(LUI, x(1), RAM_SIZE)];
    for _ in 0..count {
        words.push(encode_i(LOAD, x(2), 4, x(1), 1));
        words.push(encode_b(0, x(2), Register::ZERO, -4));
        words.push(encode_s(STORE, 0, x(1), x(2), 0));
    }
    words.push(ECALL);
    words
}

/// `x1 = console base`, then one `sb` per byte of `text`, then `ECALL`.
fn print_program(text: &[u8]) -> Vec<u32> {
    let mut words = vec![encode_u(LUI, x(1), RAM_SIZE)];
    for &byte in text {
        words.push(encode_i(OP_IMM, x(2), 0, Register::ZERO, i32::from(byte)));
        words.push(encode_s(STORE, 0, x(1), x(2), 0));
    }
    words.push(ECALL);
    words
}

#[test]
fn prints_to_the_console_and_exits_cleanly() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(temp_dir.path(), "hello.bin", &print_program(b"hi\n"));

    let output = run_cli(&[image.to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"hi\n");
}

#[test]
fn echoes_queued_keys() {
    let temp_dir = tempfile::tempdir().unwrap();
    // lui x1, console ; lbu x2, 1(x1) ; sb x2, 0(x1) ; lbu x2, 1(x1) ; sb x2, 0(x1) ; ecall
    let image = write_image(
        temp_dir.path(),
        "echo.bin",
        &[
            encode_u(LUI, x(1), RAM_SIZE),
            encode_i(LOAD, x(2), 4, x(1), 1),
            encode_s(STORE, 0, x(1), x(2), 0),
            encode_i(LOAD, x(2), 4, x(1), 1),
            encode_s(STORE, 0, x(1), x(2), 0),
            ECALL,
        ],
    );

    let output = run_cli(&[image.to_str().unwrap(), "--input", "k\r\n"]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"k\n");
}

#[test]
fn keys_piped_on_stdin_reach_a_waiting_program() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(temp_dir.path(), "wait.bin", &wait_and_echo_program(3));

    let output = run_cli_with_stdin(
        &[image.to_str().unwrap(), "--max-steps", "2000000000"],
        b"hi\r\n",
    );

    assert!(output.status.success());
    assert_eq!(output.stdout, b"hi\n");
}

#[test]
fn input_flag_keys_come_before_stdin_keys() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(temp_dir.path(), "wait.bin", &wait_and_echo_program(2));

    let output = run_cli_with_stdin(
        &[
            image.to_str().unwrap(),
            "--input",
            "a",
            "--max-steps",
            "2000000000",
        ],
        b"b",
    );

    assert!(output.status.success());
    assert_eq!(output.stdout, b"ab");
}

#[test]
fn running_off_the_image_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(
        temp_dir.path(),
        "short.bin",
        &[encode_i(OP_IMM, x(1), 0, Register::ZERO, 1)],
    );

    let output = run_cli(&[image.to_str().unwrap()]);

    assert!(!output.status.success());
}

#[test]
fn step_limit_stops_an_endless_loop() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(temp_dir.path(), "spin.bin", &[encode_j(Register::ZERO, 0)]);

    let output = run_cli(&[
        image.to_str().unwrap(),
        "--max-steps",
        "5000",
        "--batch",
        "64",
    ]);

    assert!(output.status.success());
}

#[rstest]
#[case::abi(&[][..], "ADDI ra, zero, 1")]
#[case::numeric(&["--reg-nums"][..], "ADDI x1, x0, 1")]
fn disassembly_listing(#[case] extra: &[&str], #[case] expected: &str) {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(
        temp_dir.path(),
        "listing.bin",
        &[encode_i(OP_IMM, x(1), 0, Register::ZERO, 1), 0, ECALL],
    );

    let mut args = vec![image.to_str().unwrap(), "--disassemble"];
    args.extend_from_slice(extra);
    let output = run_cli(&args);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("00100010: 00100093  {expected}"));
    assert_eq!(lines[1], "00100014: 00000000  <unknown>");
    assert_eq!(lines[2], "00100018: 00000073  ECALL");
}

#[test]
fn trace_dumps_every_step_to_stderr() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(
        temp_dir.path(),
        "trace.bin",
        &[encode_i(OP_IMM, x(10), 0, Register::ZERO, 7), ECALL],
    );

    let output = run_cli(&[image.to_str().unwrap(), "--trace"]);

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    let lines: Vec<&str> = stderr.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("100010: ADDI a0, zero, 7 "));
    assert!(lines[0].contains("a0: 7"));
    assert!(lines[0].contains("sp: 1048575"));
    assert!(lines[1].starts_with("100014: ECALL "));
}

#[test]
fn config_file_sets_the_entry_point() {
    let temp_dir = tempfile::tempdir().unwrap();
    // The first word faults; the config skips it.
    let mut words = vec![0];
    words.extend(print_program(b"ok"));
    let image = write_image(temp_dir.path(), "entry.bin", &words);
    let config = temp_dir.path().join("host.toml");
    fs::write(&config, "entry = 0x100014\nbatch = 16\n").unwrap();

    let output = run_cli(&[
        image.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"ok");
}

#[test]
fn entry_flag_overrides_the_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut words = vec![0];
    words.extend(print_program(b"ok"));
    let image = write_image(temp_dir.path(), "entry.bin", &words);
    let config = temp_dir.path().join("host.toml");
    fs::write(&config, "entry = 0x100014\n").unwrap();

    let output = run_cli(&[
        image.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--entry",
        "0x100010",
    ]);

    assert!(!output.status.success());
}

#[test]
fn empty_image_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = write_image(temp_dir.path(), "empty.bin", &[]);

    let output = run_cli(&[image.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_image_is_rejected() {
    let output = run_cli(&["/nonexistent/rv32i-run/image.bin"]);
    assert!(!output.status.success());
}
