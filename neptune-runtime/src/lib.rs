//! # Neptune VM Runtime
//!
//! Execution core of the Neptune virtual machine: byte-array memory regions
//! behind a region-aware bus, memory-mapped I/O devices (keyboard, console
//! out, timer), and the CPU with its fetch/decode/execute loop, stack, and
//! bump-allocated heap.
//!
//! The host drives execution:
//!
//! ```no_run
//! use neptune_runtime::Cpu;
//! use neptune_spec::{InstructionSet, MemoryMap};
//!
//! let mut cpu = Cpu::new(MemoryMap::neptune(), InstructionSet::neptune());
//! // ... load a program through the bus, then:
//! while !cpu.is_halted() {
//!     cpu.step().expect("execution fault");
//! }
//! ```

pub mod bus;
pub mod cpu;
pub mod error;
mod execute;
pub mod io;
pub mod region;
mod syscall;

pub use bus::MemoryBus;
pub use cpu::{Cpu, CpuSnapshot};
pub use error::{Result, RuntimeError};
pub use io::{
    ConsoleDevice, DeviceInfo, IoBus, IoDevice, KeyEvent, KeyboardDevice, KeyboardHandle,
    TimerDevice,
};
pub use region::MemoryRegion;
