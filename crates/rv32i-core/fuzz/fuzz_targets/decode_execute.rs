#![no_main]

use libfuzzer_sys::fuzz_target;
use rv32i_core::{
    disassemble, read_u32_le, run_batch, CoreConfig, Decoder, FlatMemory, ProcessorState,
    RegisterNaming,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if let Ok(instr) = Decoder::decode(word) {
        let _ = disassemble(&instr, RegisterNaming::Abi);
        assert_eq!(Decoder::decode(instr.encode()).map(|i| i.operation()), Ok(instr.operation()));
    }

    let mut memory = FlatMemory::new(0x1000);
    memory.load(0, data);
    let config = CoreConfig {
        reset_pc: 0,
        ..CoreConfig::default()
    };
    let mut state = ProcessorState::new(&config);
    let _ = run_batch(&mut state, &mut memory, 64);

    assert_eq!(state.reg(rv32i_core::Register::ZERO), 0);
    let _ = read_u32_le(&mut memory, state.pc());
});
