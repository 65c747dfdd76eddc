//! Physical address-space layout
//!
//! The machine's address space is partitioned statically:
//!
//! - ROM (boot): read-only after load, hosts the syscall table and the
//!   boot-ROM handler code
//! - RAM: program area, upward-growing heap, downward-growing stack
//! - VRAM: row-major 128x128 RGBA32 framebuffer
//! - I/O: 4 KB window routed to memory-mapped devices
//!
//! Two layouts shipped historically: the canonical 128 KB RAM layout with the
//! heap 8 KB in, and a 1 MB RAM layout with the heap 512 KB in (used by the
//! original boot ROM). Both are constructible; everything downstream derives
//! addresses from the map rather than hard-coding them.

use crate::{Address, WORD_BYTES};
use serde::{Deserialize, Serialize};

/// Which top-level region an address falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryRegionKind {
    Rom,
    Ram,
    Vram,
    Io,
}

/// Region bases, sizes, and the syscall-table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    pub rom_base: Address,
    pub rom_size: u32,
    pub syscall_table_base: Address,
    pub syscall_code_base: Address,
    pub syscall_code_size: u32,
    pub ram_base: Address,
    pub ram_size: u32,
    pub heap_base: Address,
    pub stack_base: Address,
    pub vram_base: Address,
    pub vram_size: u32,
    pub vram_width: u32,
    pub vram_height: u32,
    pub io_base: Address,
    pub io_size: u32,
    pub program_start: Address,
}

impl MemoryMap {
    /// Slots in the syscall table. Slot value 0 means "not implemented".
    pub const SYSCALL_SLOTS: u32 = 64;

    const ROM_SIZE: u32 = 8 * 1024;
    const SYSCALL_TABLE_OFFSET: u32 = 0x10;
    const SYSCALL_CODE_SIZE: u32 = 2 * 1024;
    const VRAM_WIDTH: u32 = 128;
    const VRAM_HEIGHT: u32 = 128;
    const BYTES_PER_PIXEL: u32 = 4;
    const IO_SIZE: u32 = 4 * 1024;

    /// Canonical layout: 128 KB RAM with the heap starting 8 KB in.
    pub fn neptune() -> Self {
        Self::with_layout(128 * 1024, 8 * 1024)
    }

    /// Historical large layout: 1 MB RAM with the heap starting 512 KB in.
    pub fn neptune_large() -> Self {
        Self::with_layout(1024 * 1024, 512 * 1024)
    }

    /// Build a layout from a RAM size and the heap's offset into RAM.
    pub fn with_layout(ram_size: u32, heap_offset: u32) -> Self {
        assert!(heap_offset < ram_size, "heap must start inside RAM");

        let rom_base = 0;
        let syscall_table_base = rom_base + Self::SYSCALL_TABLE_OFFSET;
        let syscall_code_base =
            syscall_table_base + Self::SYSCALL_SLOTS * WORD_BYTES;
        let ram_base = rom_base + Self::ROM_SIZE;
        let vram_base = ram_base + ram_size;
        let vram_size = Self::VRAM_WIDTH * Self::VRAM_HEIGHT * Self::BYTES_PER_PIXEL;
        let io_base = vram_base + vram_size;

        MemoryMap {
            rom_base,
            rom_size: Self::ROM_SIZE,
            syscall_table_base,
            syscall_code_base,
            syscall_code_size: Self::SYSCALL_CODE_SIZE,
            ram_base,
            ram_size,
            heap_base: ram_base + heap_offset,
            stack_base: ram_base + ram_size - WORD_BYTES,
            vram_base,
            vram_size,
            vram_width: Self::VRAM_WIDTH,
            vram_height: Self::VRAM_HEIGHT,
            io_base,
            io_size: Self::IO_SIZE,
            program_start: ram_base,
        }
    }

    pub fn rom_end(&self) -> Address {
        self.rom_base + self.rom_size
    }

    pub fn ram_end(&self) -> Address {
        self.ram_base + self.ram_size
    }

    pub fn vram_end(&self) -> Address {
        self.vram_base + self.vram_size
    }

    pub fn io_end(&self) -> Address {
        self.io_base + self.io_size
    }

    pub fn in_rom(&self, addr: Address) -> bool {
        addr >= self.rom_base && addr < self.rom_end()
    }

    pub fn in_ram(&self, addr: Address) -> bool {
        addr >= self.ram_base && addr < self.ram_end()
    }

    pub fn in_vram(&self, addr: Address) -> bool {
        addr >= self.vram_base && addr < self.vram_end()
    }

    pub fn in_io(&self, addr: Address) -> bool {
        addr >= self.io_base && addr < self.io_end()
    }

    /// Classify an address, or `None` if it maps to no region.
    pub fn region_of(&self, addr: Address) -> Option<MemoryRegionKind> {
        if self.in_rom(addr) {
            Some(MemoryRegionKind::Rom)
        } else if self.in_ram(addr) {
            Some(MemoryRegionKind::Ram)
        } else if self.in_vram(addr) {
            Some(MemoryRegionKind::Vram)
        } else if self.in_io(addr) {
            Some(MemoryRegionKind::Io)
        } else {
            None
        }
    }

    /// Address of syscall-table slot `n`.
    pub fn syscall_entry_addr(&self, n: u32) -> Address {
        self.syscall_table_base + n * WORD_BYTES
    }

    /// Address of the pixel at `(x, y)` in the framebuffer.
    ///
    /// Byte order within the pixel is R, G, B, A at offsets +0..+3.
    pub fn vram_pixel_addr(&self, x: u32, y: u32) -> Address {
        self.vram_base + (y * self.vram_width + x) * Self::BYTES_PER_PIXEL
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::neptune()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_layout_values() {
        let map = MemoryMap::neptune();
        assert_eq!(map.rom_base, 0x0000_0000);
        assert_eq!(map.rom_size, 8 * 1024);
        assert_eq!(map.syscall_table_base, 0x0000_0010);
        assert_eq!(map.syscall_code_base, 0x0000_0110);
        assert_eq!(map.ram_base, 0x0000_2000);
        assert_eq!(map.ram_size, 128 * 1024);
        assert_eq!(map.heap_base, 0x0000_4000);
        assert_eq!(map.stack_base, map.ram_end() - 4);
        assert_eq!(map.vram_base, map.ram_end());
        assert_eq!(map.vram_size, 64 * 1024);
        assert_eq!(map.io_base, map.vram_end());
        assert_eq!(map.io_size, 4 * 1024);
        assert_eq!(map.program_start, map.ram_base);
    }

    #[test]
    fn large_layout_heap_position() {
        let map = MemoryMap::neptune_large();
        assert_eq!(map.ram_size, 1024 * 1024);
        assert_eq!(map.heap_base, map.ram_base + 512 * 1024);
        assert_eq!(map.stack_base, map.ram_end() - 4);
    }

    #[test]
    fn regions_are_contiguous_and_disjoint() {
        for map in [MemoryMap::neptune(), MemoryMap::neptune_large()] {
            assert_eq!(map.rom_end(), map.ram_base);
            assert_eq!(map.ram_end(), map.vram_base);
            assert_eq!(map.vram_end(), map.io_base);

            assert_eq!(map.region_of(map.rom_base), Some(MemoryRegionKind::Rom));
            assert_eq!(map.region_of(map.ram_base), Some(MemoryRegionKind::Ram));
            assert_eq!(map.region_of(map.vram_base), Some(MemoryRegionKind::Vram));
            assert_eq!(map.region_of(map.io_base), Some(MemoryRegionKind::Io));
            assert_eq!(map.region_of(map.io_end()), None);
        }
    }

    #[test]
    fn syscall_table_has_64_slots_inside_rom() {
        let map = MemoryMap::neptune();
        let last = map.syscall_entry_addr(MemoryMap::SYSCALL_SLOTS - 1);
        assert!(map.in_rom(last));
        assert_eq!(map.syscall_code_base, last + 4);
    }

    #[test]
    fn vram_pixel_addressing() {
        let map = MemoryMap::neptune();
        assert_eq!(map.vram_pixel_addr(0, 0), map.vram_base);
        assert_eq!(map.vram_pixel_addr(1, 0), map.vram_base + 4);
        assert_eq!(map.vram_pixel_addr(0, 1), map.vram_base + 128 * 4);
        assert_eq!(
            map.vram_pixel_addr(127, 127),
            map.vram_end() - 4
        );
    }
}
