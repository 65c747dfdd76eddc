//! End-to-end scenarios for the Neptune toolchain
//!
//! Each test assembles source, loads it through the bus, drives the CPU to
//! halt, and checks the architectural state the program must leave behind.

use neptune_spec::MemoryMap;
use neptune_vm::{RuntimeError, System};
use std::sync::{Arc, Mutex};

fn system() -> System {
    System::new(MemoryMap::neptune())
}

#[test]
fn countdown_loop_stores_zero() {
    let mut system = system();
    system
        .load_program(
            "MOVI r1, 5\n\
             MOVI r2, 1\n\
             MOVI r3, 0\n\
             loop: SUB r1, r2\n\
             CMP r1, r3\n\
             JNZ loop\n\
             STORI r1, 0x00004100\n\
             HLT",
        )
        .unwrap();
    system.run().unwrap();

    let cpu = system.cpu();
    assert_eq!(cpu.bus().read_word(0x0000_4100).unwrap(), 0);
    assert_eq!(cpu.register(1).unwrap(), 0);
    assert!(cpu.flags().zero);
}

#[test]
fn stack_round_trip_restores_sp() {
    let mut system = system();
    let sp0 = system.cpu().sp();
    system
        .load_program(
            "MOVI r0, 0xDEADBEEF\n\
             PUSH r0\n\
             MOVI r0, 0\n\
             POP r1\n\
             HLT",
        )
        .unwrap();
    system.run().unwrap();

    assert_eq!(system.cpu().register(1).unwrap(), 0xDEAD_BEEF);
    assert_eq!(system.cpu().sp(), sp0);
}

#[test]
fn bump_heap_allocates_until_collision() {
    let mut system = system();
    let cpu = system.cpu_mut();
    let heap_base = cpu.memory_map().heap_base;

    let mut previous = None;
    loop {
        match cpu.allocate_heap(4096) {
            Ok(addr) => {
                assert_eq!(addr % 4, 0);
                if let Some(prev) = previous {
                    assert!(addr > prev, "allocations must be monotonic");
                }
                previous = Some(addr);
            }
            Err(err) => {
                assert!(matches!(err, RuntimeError::HeapStackCollision { .. }));
                break;
            }
        }
    }
    assert!(previous.is_some(), "at least one allocation must succeed");
    assert!(cpu.hp() >= heap_base);
    assert!(cpu.hp() < cpu.sp());
}

#[test]
fn syscall_dispatch_calls_through_the_rom_table() {
    let mut system = system();
    system
        .load_boot_rom(
            "syscall 1 info: MOVI r1, 0x1234\n\
             RET",
        )
        .unwrap();
    system
        .load_program(
            "MOVI r0, 1\n\
             SYSCALL\n\
             HLT",
        )
        .unwrap();

    let sp0 = system.cpu().sp();
    system.run().unwrap();

    assert_eq!(system.cpu().register(1).unwrap(), 0x1234);
    assert_eq!(system.cpu().sp(), sp0, "RET must pop the pushed PC");
}

#[test]
fn unimplemented_syscall_faults() {
    let mut system = system();
    system
        .load_program(
            "MOVI r0, 9\n\
             SYSCALL\n\
             HLT",
        )
        .unwrap();

    system.step().unwrap();
    let err = system.step().unwrap_err();
    assert_eq!(err, RuntimeError::SyscallNotImplemented { number: 9 });
}

#[test]
fn division_by_zero_faults_and_preserves_state() {
    let mut system = system();
    system
        .load_program(
            "MOVI r1, 10\n\
             MOVI r2, 0\n\
             DIV r1, r2\n\
             HLT",
        )
        .unwrap();

    system.step().unwrap();
    system.step().unwrap();
    // MOVI r2, 0 set Z; the faulting DIV must leave it.
    assert!(system.cpu().flags().zero);

    let err = system.step().unwrap_err();
    assert!(matches!(err, RuntimeError::DivisionByZero { .. }));
    assert_eq!(system.cpu().register(1).unwrap(), 10);
    assert!(system.cpu().flags().zero);
    assert!(!system.cpu().is_halted());
}

#[test]
fn keyboard_buffer_scenario() {
    let mut system = system();
    let kb = system.cpu().memory_map().io_base;
    const FIRST_CHAR: u32 = 0;
    const BUFFER_READY: u32 = 4;
    const CURRENT_CHAR: u32 = 8;
    const CONTROL: u32 = 12;

    for c in ['A', 'B', 'C'] {
        system.keyboard().push_char(c);
    }

    let bus = system.cpu().bus();
    assert_eq!(bus.read_word(kb + FIRST_CHAR).unwrap(), 0x41);
    assert_eq!(bus.read_word(kb + BUFFER_READY).unwrap(), 1);
    assert_eq!(bus.read_word(kb + CURRENT_CHAR).unwrap(), 0x43);

    system.cpu_mut().bus_mut().write_word(kb + CONTROL, 1).unwrap();
    let bus = system.cpu().bus();
    assert_eq!(bus.read_word(kb + FIRST_CHAR).unwrap(), 0x42);
    assert_eq!(bus.read_word(kb + BUFFER_READY).unwrap(), 1);

    system.cpu_mut().bus_mut().write_word(kb + CONTROL, 1).unwrap();
    system.cpu_mut().bus_mut().write_word(kb + CONTROL, 1).unwrap();
    let bus = system.cpu().bus();
    assert_eq!(bus.read_word(kb + FIRST_CHAR).unwrap(), 0);
    assert_eq!(bus.read_word(kb + BUFFER_READY).unwrap(), 0);
    assert_eq!(bus.read_word(kb + CURRENT_CHAR).unwrap(), 0);
}

#[test]
fn console_output_prints_bytes() {
    let sink: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let mut system = System::with_console_writer(MemoryMap::neptune(), sink.clone());
    let console = system.cpu().memory_map().io_base + 16;

    system
        .load_program(&format!(
            "MOVI r1, 72\n\
             STORI r1, {console}\n\
             MOVI r1, 105\n\
             STORI r1, {console}\n\
             HLT"
        ))
        .unwrap();
    system.run().unwrap();

    assert_eq!(&*sink.lock().unwrap(), b"Hi");
}

#[test]
fn vram_writes_land_at_pixel_addresses() {
    let mut system = system();
    let map = *system.cpu().memory_map();
    let pixel = map.vram_pixel_addr(2, 1);

    system
        .load_program(&format!(
            "MOVI r1, 0xFF0000FF\n\
             STORI r1, {pixel}\n\
             HLT"
        ))
        .unwrap();
    system.run().unwrap();

    let bus = system.cpu().bus();
    assert_eq!(bus.read_word(pixel).unwrap(), 0xFF00_00FF);
    assert_eq!(bus.read_byte(pixel).unwrap(), 0xFF);
    assert_eq!(bus.read_byte(pixel + 1).unwrap(), 0x00);
    assert_eq!(bus.read_byte(pixel + 3).unwrap(), 0xFF);
}

#[test]
fn block_ops_fill_and_copy() {
    let mut system = system();
    system
        .load_program(
            "MOVI r1, 3\n\
             MOVI r2, 0x5000\n\
             MOVI r3, 0xAB\n\
             MSET r2, r3\n\
             MOVI r4, 0x5100\n\
             MCPY r4, r2\n\
             HLT",
        )
        .unwrap();
    system.run().unwrap();

    let bus = system.cpu().bus();
    for i in 0..3 {
        assert_eq!(bus.read_word(0x5000 + i * 4).unwrap(), 0xAB);
        assert_eq!(bus.read_word(0x5100 + i * 4).unwrap(), 0xAB);
    }
    assert_eq!(bus.read_word(0x500C).unwrap(), 0, "fill stops at the count");
}

#[test]
fn data_section_program_reads_its_own_data() {
    let mut system = system();
    system
        .load_program(
            ".data\n\
             int answer = 42\n\
             .code\n\
             main: MOVI r2, answer\n\
             LOAD r1, r2\n\
             HLT",
        )
        .unwrap();
    system.run().unwrap();
    assert_eq!(system.cpu().register(1).unwrap(), 42);
}

#[test]
fn call_ret_nest() {
    let mut system = system();
    system
        .load_program(
            "main: MOVI r1, 1\n\
             CALL addtwo\n\
             CALL addtwo\n\
             HLT\n\
             addtwo: ADDI r1, 2\n\
             RET",
        )
        .unwrap();
    let sp0 = system.cpu().sp();
    system.run().unwrap();
    assert_eq!(system.cpu().register(1).unwrap(), 5);
    assert_eq!(system.cpu().sp(), sp0);
}
