//! Runtime error taxonomy
//!
//! Every error is fatal to the step that raised it; nothing is caught and
//! resumed inside the VM. The host decides whether to keep stepping.

use neptune_spec::{Address, SpecError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Access past the end of a region's backing store
    #[error("address {address:#010x} out of range for region based at {base:#010x}")]
    AddressOutOfRange { address: Address, base: Address },

    /// Address claimed by no region
    #[error("invalid memory access at {address:#010x}")]
    InvalidAddress { address: Address },

    /// Write-through attempt on boot ROM
    #[error("write to read-only ROM at {address:#010x}")]
    RomWrite { address: Address },

    #[error("division by zero at PC {pc:#010x}")]
    DivisionByZero { pc: Address },

    /// Opcode byte with no registered instruction, with fetch context
    #[error("unknown opcode {opcode:#04x} at PC {pc:#010x}")]
    UnknownOpcode { opcode: u8, pc: Address },

    #[error("invalid register index {index}")]
    InvalidRegister { index: u8 },

    /// The bump heap ran into the stack (or a push ran into the heap)
    #[error("heap/stack collision: HP {hp:#010x} has reached SP {sp:#010x}")]
    HeapStackCollision { hp: Address, sp: Address },

    /// Heap pointer override outside `[heap_start, SP)`
    #[error("invalid heap pointer {pointer:#010x}")]
    InvalidHeapPointer { pointer: Address },

    #[error("syscall {number} out of range for the {slots}-slot table")]
    SyscallOutOfRange { number: u32, slots: u32 },

    #[error("syscall {number} is not implemented")]
    SyscallNotImplemented { number: u32 },

    #[error("syscall {number} target {target:#010x} is outside mapped memory")]
    SyscallInvalidTarget { number: u32, target: Address },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
