//! # Neptune VM Assembler
//!
//! Two-pass assembler for the Neptune instruction set. The first pass
//! expands macros, lays out `.data` declarations, and binds labels and
//! `syscall` table entries; the second resolves arguments and encodes. The
//! result is a [`ProgramImage`] that [`load`] writes into machine memory
//! through the bus's load path, which may target boot ROM.
//!
//! ```no_run
//! use neptune_assembler::assemble_and_load;
//! use neptune_runtime::Cpu;
//! use neptune_spec::{InstructionSet, MemoryMap};
//!
//! let mut cpu = Cpu::new(MemoryMap::neptune(), InstructionSet::neptune());
//! let base = cpu.memory_map().ram_base;
//! assemble_and_load(&mut cpu, "main: MOVI r1, 42\nHLT", base).unwrap();
//! cpu.run().unwrap();
//! ```

pub mod assembler;
pub mod data;
pub mod error;
pub mod lexer;
pub mod macros;

pub use assembler::{assemble, assemble_and_load, load, ProgramImage};
pub use error::{AssemblerError, Result};
