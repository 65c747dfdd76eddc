//! Syscall dispatch
//!
//! SYSCALL reads the syscall number from r0, looks the handler address up in
//! the ROM-resident table, pushes the return PC, and jumps. Handlers end with
//! RET. A zero table slot means the syscall is not implemented.

use crate::cpu::Cpu;
use crate::error::{Result, RuntimeError};
use neptune_spec::MemoryMap;

pub(crate) fn dispatch(cpu: &mut Cpu) -> Result<()> {
    let number = cpu.register(0)?;
    let map = *cpu.memory_map();

    let entry = map.syscall_entry_addr(number);
    if number >= MemoryMap::SYSCALL_SLOTS || !map.in_rom(entry) {
        return Err(RuntimeError::SyscallOutOfRange {
            number,
            slots: MemoryMap::SYSCALL_SLOTS,
        });
    }

    let target = cpu.bus().read_word(entry)?;
    if target == 0 {
        return Err(RuntimeError::SyscallNotImplemented { number });
    }
    if map.region_of(target).is_none() {
        return Err(RuntimeError::SyscallInvalidTarget { number, target });
    }

    tracing::debug!("syscall {} -> {:#010x}", number, target);
    let ret = cpu.pc();
    cpu.push(ret)?;
    cpu.jump(target);
    Ok(())
}
