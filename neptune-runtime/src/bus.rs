//! Unified memory bus
//!
//! Routes byte and word accesses to ROM, RAM, VRAM, or the I/O window, in
//! that order. ROM refuses write-through; the assembler loads boot code via
//! the separate `load_*` path, which writes the owning region directly and is
//! never used by instruction semantics.

use crate::error::{Result, RuntimeError};
use crate::io::IoBus;
use crate::region::MemoryRegion;
use neptune_spec::{Address, MemoryMap, Word};

#[derive(Debug)]
pub struct MemoryBus {
    rom: MemoryRegion,
    ram: MemoryRegion,
    vram: MemoryRegion,
    io: IoBus,
}

impl MemoryBus {
    pub fn new(map: &MemoryMap) -> Self {
        MemoryBus {
            rom: MemoryRegion::new(map.rom_base, map.rom_size),
            ram: MemoryRegion::new(map.ram_base, map.ram_size),
            vram: MemoryRegion::new(map.vram_base, map.vram_size),
            io: IoBus::new(map.io_base, map.io_size),
        }
    }

    pub fn io(&self) -> &IoBus {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IoBus {
        &mut self.io
    }

    pub fn read_word(&self, addr: Address) -> Result<Word> {
        if self.rom.contains(addr) {
            self.rom.read_word(addr)
        } else if self.ram.contains(addr) {
            self.ram.read_word(addr)
        } else if self.vram.contains(addr) {
            self.vram.read_word(addr)
        } else if self.io.contains(addr) {
            Ok(self.io.read_word(addr))
        } else {
            Err(RuntimeError::InvalidAddress { address: addr })
        }
    }

    pub fn write_word(&mut self, addr: Address, value: Word) -> Result<()> {
        if self.rom.contains(addr) {
            Err(RuntimeError::RomWrite { address: addr })
        } else if self.ram.contains(addr) {
            self.ram.write_word(addr, value)
        } else if self.vram.contains(addr) {
            self.vram.write_word(addr, value)
        } else if self.io.contains(addr) {
            self.io.write_word(addr, value);
            Ok(())
        } else {
            Err(RuntimeError::InvalidAddress { address: addr })
        }
    }

    pub fn read_byte(&self, addr: Address) -> Result<u8> {
        if self.rom.contains(addr) {
            self.rom.read_byte(addr)
        } else if self.ram.contains(addr) {
            self.ram.read_byte(addr)
        } else if self.vram.contains(addr) {
            self.vram.read_byte(addr)
        } else if self.io.contains(addr) {
            Ok(self.io.read_byte(addr))
        } else {
            Err(RuntimeError::InvalidAddress { address: addr })
        }
    }

    pub fn write_byte(&mut self, addr: Address, value: u8) -> Result<()> {
        if self.rom.contains(addr) {
            Err(RuntimeError::RomWrite { address: addr })
        } else if self.ram.contains(addr) {
            self.ram.write_byte(addr, value)
        } else if self.vram.contains(addr) {
            self.vram.write_byte(addr, value)
        } else if self.io.contains(addr) {
            self.io.write_byte(addr, value);
            Ok(())
        } else {
            Err(RuntimeError::InvalidAddress { address: addr })
        }
    }

    /// Load-time word write into whichever region owns `addr`, ROM included.
    ///
    /// This is the assembler's path; instruction semantics never reach it.
    pub fn load_word(&mut self, addr: Address, value: Word) -> Result<()> {
        if self.rom.contains(addr) {
            self.rom.write_word(addr, value)
        } else {
            self.write_word(addr, value)
        }
    }

    /// Load-time byte write, ROM included.
    pub fn load_byte(&mut self, addr: Address, value: u8) -> Result<()> {
        if self.rom.contains(addr) {
            self.rom.write_byte(addr, value)
        } else {
            self.write_byte(addr, value)
        }
    }
}
