//! Cross-crate invariants: bus round-trips, encoding stability, register
//! aliasing from assembly, and both canonical memory layouts.

use neptune_spec::{InstructionSet, MemoryMap, Opcode, REG_SP};
use neptune_vm::{assemble, assemble_and_load, disassemble, Cpu, System};

fn cpu_with(map: MemoryMap) -> Cpu {
    Cpu::new(map, InstructionSet::neptune())
}

#[test]
fn every_bus_write_reads_back_identically() {
    let mut cpu = cpu_with(MemoryMap::neptune());
    let map = *cpu.memory_map();

    for addr in [
        map.ram_base,
        map.ram_base + 4,
        map.heap_base,
        map.stack_base,
        map.vram_base,
        map.vram_end() - 4,
    ] {
        cpu.bus_mut().write_word(addr, 0x5A5A_A5A5).unwrap();
        assert_eq!(cpu.bus().read_word(addr).unwrap(), 0x5A5A_A5A5);
    }

    for addr in [map.ram_base + 9, map.vram_base + 13] {
        cpu.bus_mut().write_byte(addr, 0x7E).unwrap();
        assert_eq!(cpu.bus().read_byte(addr).unwrap(), 0x7E);
    }
}

#[test]
fn assembled_opcodes_decode_to_the_same_mnemonic() {
    let map = MemoryMap::neptune();
    let source = "MOVI r1, 7\nADD r1, r2\nCMP r1, r3\nJNZ 0x2000\nPUSH r1\nHLT";
    let image = assemble(source, map.ram_base, &map).unwrap();

    let expected = [
        Opcode::Movi,
        Opcode::Add,
        Opcode::Cmp,
        Opcode::Jnz,
        Opcode::Push,
        Opcode::Hlt,
    ];
    for ((_, words), want) in image.code.iter().zip(expected) {
        assert_eq!(Opcode::from_word(words[0]), Some(want));
    }
}

#[test]
fn disassembly_round_trips_assembled_code() {
    let map = MemoryMap::neptune();
    let image = assemble("MOVI r1, 0x2a\nINC r1\nHLT", map.ram_base, &map).unwrap();
    let words: Vec<u32> = image
        .code
        .iter()
        .flat_map(|(_, words)| words.iter().copied())
        .collect();

    let listing = disassemble(&words, map.ram_base).unwrap();
    assert_eq!(
        listing,
        "0x00002000  MOVI r1, 0x2a\n\
         0x00002008  INC r1\n\
         0x0000200c  HLT\n"
    );
}

#[test]
fn both_memory_layouts_run_the_same_program() {
    for map in [MemoryMap::neptune(), MemoryMap::neptune_large()] {
        let mut cpu = cpu_with(map);
        assemble_and_load(
            &mut cpu,
            "MOVI r1, 6\n\
             MULI r1, 7\n\
             HLT",
            map.ram_base,
        )
        .unwrap();
        cpu.run().unwrap();
        assert_eq!(cpu.register(1).unwrap(), 42);
        assert_eq!(cpu.sp(), map.stack_base);
        assert_eq!(cpu.hp(), map.heap_base);
    }
}

#[test]
fn large_layout_heap_sits_half_a_megabyte_in() {
    let map = MemoryMap::neptune_large();
    let mut cpu = cpu_with(map);
    let first = cpu.allocate_heap(16).unwrap();
    assert_eq!(first, map.ram_base + 512 * 1024);
}

#[test]
fn sp_alias_is_visible_to_programs() {
    let mut system = System::new(MemoryMap::neptune());
    system
        .load_program(
            "MOV r1, sp\n\
             PUSH r1\n\
             MOV r2, sp\n\
             HLT",
        )
        .unwrap();
    let sp0 = system.cpu().sp();
    system.run().unwrap();

    assert_eq!(system.cpu().register(1).unwrap(), sp0);
    assert_eq!(system.cpu().register(2).unwrap(), sp0 - 4);
}

#[test]
fn writing_the_sp_alias_moves_the_stack() {
    let mut cpu = cpu_with(MemoryMap::neptune());
    let map = *cpu.memory_map();
    cpu.set_register(REG_SP, map.ram_base + 0x8000).unwrap();
    cpu.push(0x77).unwrap();
    assert_eq!(cpu.sp(), map.ram_base + 0x8000 - 4);
    assert_eq!(cpu.bus().read_word(cpu.sp()).unwrap(), 0x77);
}

#[test]
fn snapshots_capture_flag_state() {
    let mut system = System::new(MemoryMap::neptune());
    system
        .load_program("MOVI r1, 0\nHLT")
        .unwrap();
    system.run().unwrap();

    let snap = system.cpu().snapshot();
    assert!(snap.flags.zero, "MOVI 0 updates Z");
    assert!(snap.halted);
    assert_eq!(snap.registers[1], 0);
    assert_eq!(snap.sp, system.cpu().sp());
}

#[test]
fn timer_device_time_advances_through_the_bus() {
    let system = System::new(MemoryMap::neptune());
    let timer_base = system.cpu().memory_map().io_base + 20;
    let t0 = system.cpu().bus().read_word(timer_base).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let t1 = system.cpu().bus().read_word(timer_base).unwrap();
    assert!(t1 > t0);
}

#[test]
fn rom_stays_read_only_to_programs() {
    let mut system = System::new(MemoryMap::neptune());
    system
        .load_program(
            "MOVI r1, 1\n\
             STORI r1, 0x10\n\
             HLT",
        )
        .unwrap();
    system.step().unwrap();
    let err = system.step().unwrap_err();
    assert!(matches!(err, neptune_vm::RuntimeError::RomWrite { .. }));
}
