//! CPU execution core
//!
//! Owns the register file, PC/SP/HP, the halt flag, the flags, and the memory
//! bus. One host thread drives [`Cpu::step`] in a loop until halt; every
//! instruction completes synchronously. Errors propagate out of `step` and
//! the host decides whether to continue.

use crate::bus::MemoryBus;
use crate::error::{Result, RuntimeError};
use crate::execute::execute;
use neptune_spec::{
    Address, Flags, Instruction, InstructionSet, MemoryMap, Word, DEFAULT_REGISTER_COUNT, REG_HP,
    REG_PC, REG_SP, WORD_BYTES,
};
use serde::{Deserialize, Serialize};

/// Poll-friendly copy of the externally visible CPU state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub registers: Vec<Word>,
    pub pc: Address,
    pub sp: Address,
    pub hp: Address,
    pub flags: Flags,
    pub halted: bool,
}

pub struct Cpu {
    registers: Vec<Word>,
    pc: Address,
    sp: Address,
    hp: Address,
    halted: bool,
    flags: Flags,
    bus: MemoryBus,
    iset: InstructionSet,
    map: MemoryMap,
}

impl Cpu {
    /// CPU with the default register count.
    pub fn new(map: MemoryMap, iset: InstructionSet) -> Self {
        Self::with_register_count(map, iset, DEFAULT_REGISTER_COUNT)
    }

    pub fn with_register_count(map: MemoryMap, iset: InstructionSet, count: usize) -> Self {
        Cpu {
            registers: vec![0; count],
            pc: map.program_start,
            sp: map.stack_base,
            hp: map.heap_base,
            halted: false,
            flags: Flags::default(),
            bus: MemoryBus::new(&map),
            iset,
            map,
        }
    }

    // -------- Registers --------

    /// Read a register, honoring the PC/SP/HP aliases at 252-254.
    pub fn register(&self, index: u8) -> Result<Word> {
        match index {
            REG_PC => Ok(self.pc),
            REG_SP => Ok(self.sp),
            REG_HP => Ok(self.hp),
            i if (i as usize) < self.registers.len() => Ok(self.registers[i as usize]),
            _ => Err(RuntimeError::InvalidRegister { index }),
        }
    }

    /// Write a register, honoring the PC/SP/HP aliases at 252-254.
    pub fn set_register(&mut self, index: u8, value: Word) -> Result<()> {
        match index {
            REG_PC => self.pc = value,
            REG_SP => self.sp = value,
            REG_HP => self.hp = value,
            i if (i as usize) < self.registers.len() => self.registers[i as usize] = value,
            _ => return Err(RuntimeError::InvalidRegister { index }),
        }
        Ok(())
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn sp(&self) -> Address {
        self.sp
    }

    pub fn hp(&self) -> Address {
        self.hp
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub(crate) fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub(crate) fn set_halted(&mut self) {
        self.halted = true;
    }

    pub fn memory_map(&self) -> &MemoryMap {
        &self.map
    }

    pub fn bus(&self) -> &MemoryBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut MemoryBus {
        &mut self.bus
    }

    /// Externally visible state, copied under no lock: observers polling
    /// between steps may see values from adjacent instructions.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            registers: self.registers.clone(),
            pc: self.pc,
            sp: self.sp,
            hp: self.hp,
            flags: self.flags,
            halted: self.halted,
        }
    }

    // -------- Program counter --------

    pub fn jump(&mut self, addr: Address) {
        self.pc = addr;
    }

    /// Word at PC without advancing.
    pub fn peek_word(&self) -> Result<Word> {
        self.bus.read_word(self.pc)
    }

    fn fetch_word(&mut self) -> Result<Word> {
        let word = self.bus.read_word(self.pc)?;
        self.pc = self.pc.wrapping_add(WORD_BYTES);
        Ok(word)
    }

    // -------- Stack (grows downward) --------

    pub fn push(&mut self, value: Word) -> Result<()> {
        self.sp = self.sp.wrapping_sub(WORD_BYTES);
        if self.hp >= self.sp {
            return Err(RuntimeError::HeapStackCollision {
                hp: self.hp,
                sp: self.sp,
            });
        }
        self.bus.write_word(self.sp, value)
    }

    pub fn pop(&mut self) -> Result<Word> {
        let value = self.bus.read_word(self.sp)?;
        self.sp = self.sp.wrapping_add(WORD_BYTES);
        Ok(value)
    }

    // -------- Heap (bump allocator) --------

    /// Allocate `size` bytes, rounded up to a word multiple.
    pub fn allocate_heap(&mut self, size: u32) -> Result<Address> {
        let aligned = size
            .checked_add(3)
            .map(|s| s & !3)
            .ok_or(RuntimeError::HeapStackCollision {
                hp: self.hp,
                sp: self.sp,
            })?;
        let next = self
            .hp
            .checked_add(aligned)
            .ok_or(RuntimeError::HeapStackCollision {
                hp: self.hp,
                sp: self.sp,
            })?;
        if next >= self.sp {
            return Err(RuntimeError::HeapStackCollision {
                hp: self.hp,
                sp: self.sp,
            });
        }
        let addr = self.hp;
        self.hp = next;
        Ok(addr)
    }

    /// Move the heap pointer, staying within `[heap_start, SP)`.
    pub fn set_heap_pointer(&mut self, pointer: Address) -> Result<()> {
        if pointer < self.map.heap_base || pointer >= self.sp {
            return Err(RuntimeError::InvalidHeapPointer { pointer });
        }
        self.hp = pointer;
        Ok(())
    }

    // -------- Execution --------

    /// Fetch, decode, and execute one instruction.
    pub fn step(&mut self) -> Result<()> {
        let fetch_pc = self.pc;
        let word0 = self.fetch_word()?;
        let opcode = self
            .iset
            .decode_opcode(word0)
            .map_err(|_| RuntimeError::UnknownOpcode {
                opcode: (word0 & 0xFF) as u8,
                pc: fetch_pc,
            })?;
        let word1 = if opcode.word_count() == 2 {
            self.fetch_word()?
        } else {
            0
        };
        let instr = Instruction::decode(word0, word1)?;
        tracing::trace!("[{:#010x}] {}", fetch_pc, instr);
        execute(&instr, self)
    }

    /// Step until halt. Errors propagate from the failing step.
    pub fn run(&mut self) -> Result<()> {
        while !self.halted {
            self.step()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("pc", &format_args!("{:#010x}", self.pc))
            .field("sp", &format_args!("{:#010x}", self.sp))
            .field("hp", &format_args!("{:#010x}", self.hp))
            .field("halted", &self.halted)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
