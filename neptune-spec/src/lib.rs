//! # Neptune VM Specification
//!
//! Shared data model for the Neptune virtual machine: a little-endian 32-bit
//! register machine with a statically partitioned physical address space
//! (boot ROM, RAM, linear RGBA32 framebuffer, memory-mapped I/O).
//!
//! ## Key pieces
//! - Fixed-width instruction encoding (one or two 32-bit words)
//! - Opcode catalog with a frozen, registration-ordered numbering
//! - Z/N/C/V condition codes
//! - Canonical memory layouts (plus the historical large-RAM variant)

pub mod error;
pub mod flags;
pub mod instruction;
pub mod isa;
pub mod memory_map;
pub mod opcode;

pub use error::SpecError;
pub use flags::Flags;
pub use instruction::{EncodedInstruction, Instruction, Operand};
pub use isa::{InstructionSet, OpcodeEntry};
pub use memory_map::{MemoryMap, MemoryRegionKind};
pub use opcode::{Opcode, OperandForm};

/// 32-bit machine word.
pub type Word = u32;

/// Byte address into the physical address space.
pub type Address = u32;

/// Signed view of a machine word.
pub type SWord = i32;

/// Bytes per machine word.
pub const WORD_BYTES: u32 = 4;

/// Default number of general-purpose registers.
pub const DEFAULT_REGISTER_COUNT: usize = 32;

/// Register index aliased to the program counter.
pub const REG_PC: u8 = 252;

/// Register index aliased to the stack pointer.
pub const REG_SP: u8 = 253;

/// Register index aliased to the heap pointer.
pub const REG_HP: u8 = 254;

/// Resolve a register alias name (`pc`, `sp`, `hp`) to its index,
/// case-insensitively.
pub fn register_alias(name: &str) -> Option<u8> {
    if name.eq_ignore_ascii_case("pc") {
        Some(REG_PC)
    } else if name.eq_ignore_ascii_case("sp") {
        Some(REG_SP)
    } else if name.eq_ignore_ascii_case("hp") {
        Some(REG_HP)
    } else {
        None
    }
}

/// Display name for a register index, honoring the PC/SP/HP aliases.
pub fn register_name(index: u8) -> String {
    match index {
        REG_PC => "pc".to_string(),
        REG_SP => "sp".to_string(),
        REG_HP => "hp".to_string(),
        i => format!("r{}", i),
    }
}
