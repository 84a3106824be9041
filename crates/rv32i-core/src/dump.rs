//! One-line trace of the last executed instruction and the register file.

use std::fmt::Write as _;

use crate::decoder::DecodedInstruction;
use crate::disasm::{disassemble, RegisterNaming};
use crate::state::{ArchitecturalState, Register};

/// Column width used to align register entries.
pub const DUMP_TAB_WIDTH: usize = 8;

/// Pads `line` with spaces up to the next tab stop. At least one space is
/// always added.
fn pad_to_tab_stop(line: &mut String) {
    let target = (line.len() / DUMP_TAB_WIDTH + 1) * DUMP_TAB_WIDTH;
    while line.len() < target {
        line.push(' ');
    }
}

/// Renders `instr`, executed from `addr`, and then every register.
///
/// Layout: `<addr hex>: <disassembly>` followed by `<name>: <value>` for
/// `x0..x31`, each entry starting on the next 8-column tab stop. Values are
/// signed decimal. The instruction text always uses ABI names; `naming`
/// only applies to the register list.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn dump_state(
    addr: u32,
    state: &ArchitecturalState,
    instr: &DecodedInstruction,
    naming: RegisterNaming,
) -> String {
    let mut line = format!("{addr:x}: {}", disassemble(instr, RegisterNaming::Abi));

    for reg in Register::all() {
        pad_to_tab_stop(&mut line);
        // Writing into a String cannot fail.
        let _ = write!(line, "{}: {}", naming.name(reg), state.gpr(reg) as i32);
    }

    line
}
