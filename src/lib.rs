//! # Neptune VM
//!
//! A little-endian 32-bit register machine with a statically partitioned
//! address space (boot ROM with a syscall table, RAM with heap and stack, an
//! RGBA32 framebuffer, and memory-mapped I/O), plus a two-pass assembler.
//!
//! The workspace crates do the work; this facade re-exports them and wires
//! the canonical machine:
//!
//! ```no_run
//! use neptune_vm::System;
//! use neptune_spec::MemoryMap;
//!
//! let mut system = System::new(MemoryMap::neptune());
//! system.load_program("main: MOVI r1, 42\nHLT").unwrap();
//! system.run().unwrap();
//! assert_eq!(system.cpu().register(1).unwrap(), 42);
//! ```

pub use neptune_assembler::{assemble, assemble_and_load, load, AssemblerError, ProgramImage};
pub use neptune_disassembler::{disassemble, format_instruction, DisassemblerError};
pub use neptune_runtime::{
    ConsoleDevice, Cpu, CpuSnapshot, IoDevice, KeyEvent, KeyboardDevice, KeyboardHandle,
    MemoryBus, RuntimeError, TimerDevice,
};
pub use neptune_spec::{
    Flags, Instruction, InstructionSet, MemoryMap, Opcode, SpecError, Word,
};

use std::io::Write;
use std::sync::{Arc, Mutex};

/// A fully wired Neptune machine: CPU plus the keyboard, console-out, and
/// timer devices on the I/O bus, in that order.
pub struct System {
    cpu: Cpu,
    keyboard: KeyboardHandle,
}

impl System {
    /// Machine with the console printing to standard output.
    pub fn new(map: MemoryMap) -> Self {
        Self::build(map, ConsoleDevice::new())
    }

    /// Machine with console output captured by `sink` (tests, embedders).
    pub fn with_console_writer(map: MemoryMap, sink: Arc<Mutex<dyn Write + Send>>) -> Self {
        Self::build(map, ConsoleDevice::with_writer(sink))
    }

    fn build(map: MemoryMap, console: ConsoleDevice) -> Self {
        let mut cpu = Cpu::new(map, InstructionSet::neptune());
        let keyboard_device = KeyboardDevice::new();
        let keyboard = keyboard_device.handle();

        let io = cpu.bus_mut().io_mut();
        io.register(Box::new(keyboard_device));
        io.register(Box::new(console));
        io.register(Box::new(TimerDevice::new()));

        System { cpu, keyboard }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Host-side handle feeding the keyboard buffer.
    pub fn keyboard(&self) -> &KeyboardHandle {
        &self.keyboard
    }

    /// Assemble boot-ROM source into the syscall-code area.
    pub fn load_boot_rom(&mut self, source: &str) -> neptune_assembler::Result<ProgramImage> {
        let base = self.cpu.memory_map().syscall_code_base;
        assemble_and_load(&mut self.cpu, source, base)
    }

    /// Assemble a user program into RAM at the program start.
    pub fn load_program(&mut self, source: &str) -> neptune_assembler::Result<ProgramImage> {
        let base = self.cpu.memory_map().program_start;
        assemble_and_load(&mut self.cpu, source, base)
    }

    pub fn step(&mut self) -> neptune_runtime::Result<()> {
        self.cpu.step()
    }

    /// Step until HLT. Errors propagate from the failing step.
    pub fn run(&mut self) -> neptune_runtime::Result<()> {
        self.cpu.run()
    }
}
