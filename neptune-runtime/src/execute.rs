//! Instruction semantics
//!
//! All arithmetic is 32-bit wrapping two's-complement. Flag behavior follows
//! the reference tables: additive arithmetic updates Z/N/C/V, everything else
//! that produces a value updates Z/N, shifts additionally set C to the last
//! bit shifted out, and stores/jumps touch nothing.

use crate::cpu::Cpu;
use crate::error::{Result, RuntimeError};
use crate::syscall;
use neptune_spec::{Address, Instruction, Word};

/// Address the current instruction was fetched from (PC has already moved
/// past it).
fn instr_pc(cpu: &Cpu, instr: &Instruction) -> Address {
    cpu.pc()
        .wrapping_sub(instr.opcode().word_count() as Address * 4)
}

pub(crate) fn execute(instr: &Instruction, cpu: &mut Cpu) -> Result<()> {
    match *instr {
        // ========== Arithmetic ==========
        Instruction::Add { dst, src } => {
            let b = cpu.register(src)?;
            add_into(cpu, dst, b)
        }
        Instruction::Addi { dst, imm } => add_into(cpu, dst, imm),
        Instruction::Sub { dst, src } => {
            let b = cpu.register(src)?;
            sub_into(cpu, dst, b)
        }
        Instruction::Subi { dst, imm } => sub_into(cpu, dst, imm),
        Instruction::Mul { dst, src } => {
            let b = cpu.register(src)?;
            mul_into(cpu, dst, b)
        }
        Instruction::Muli { dst, imm } => mul_into(cpu, dst, imm),
        Instruction::Div { dst, src } => {
            let b = cpu.register(src)?;
            div_into(cpu, dst, b, instr_pc(cpu, instr))
        }
        Instruction::Divi { dst, imm } => div_into(cpu, dst, imm, instr_pc(cpu, instr)),
        Instruction::Mod { dst, src } => {
            let b = cpu.register(src)?;
            mod_into(cpu, dst, b, instr_pc(cpu, instr))
        }
        Instruction::Modi { dst, imm } => mod_into(cpu, dst, imm, instr_pc(cpu, instr)),

        // ========== Unary ==========
        Instruction::Inc { dst } => unary(cpu, dst, |a| a.wrapping_add(1)),
        Instruction::Dec { dst } => unary(cpu, dst, |a| a.wrapping_sub(1)),
        Instruction::Neg { dst } => unary(cpu, dst, |a| (a as i32).wrapping_neg() as Word),
        Instruction::Not { dst } => unary(cpu, dst, |a| !a),
        Instruction::Clr { dst } => unary(cpu, dst, |_| 0),

        // ========== Logical ==========
        Instruction::And { dst, src } => {
            let b = cpu.register(src)?;
            logical(cpu, dst, b, |a, b| a & b)
        }
        Instruction::Andi { dst, imm } => logical(cpu, dst, imm, |a, b| a & b),
        Instruction::Or { dst, src } => {
            let b = cpu.register(src)?;
            logical(cpu, dst, b, |a, b| a | b)
        }
        Instruction::Ori { dst, imm } => logical(cpu, dst, imm, |a, b| a | b),
        Instruction::Xor { dst, src } => {
            let b = cpu.register(src)?;
            logical(cpu, dst, b, |a, b| a ^ b)
        }
        Instruction::Xori { dst, imm } => logical(cpu, dst, imm, |a, b| a ^ b),

        // ========== Shift ==========
        Instruction::Shl { dst, amount } => {
            let a = cpu.register(dst)?;
            let s = (amount & 0x1F) as u32;
            let r = a << s;
            cpu.set_register(dst, r)?;
            cpu.flags_mut().update(r);
            if s != 0 {
                let carry = (a >> (32 - s)) & 1 == 1;
                cpu.flags_mut().set_shift_carry(carry);
            }
            Ok(())
        }
        Instruction::Shr { dst, amount } => {
            let a = cpu.register(dst)?;
            let s = (amount & 0x1F) as u32;
            let r = a >> s;
            cpu.set_register(dst, r)?;
            cpu.flags_mut().update(r);
            if s != 0 {
                let carry = (a >> (s - 1)) & 1 == 1;
                cpu.flags_mut().set_shift_carry(carry);
            }
            Ok(())
        }

        // ========== Memory ==========
        Instruction::Load { dst, addr } => {
            let address = cpu.register(addr)?;
            let value = cpu.bus().read_word(address)?;
            cpu.set_register(dst, value)?;
            cpu.flags_mut().update(value);
            Ok(())
        }
        Instruction::Store { src, addr } => {
            let address = cpu.register(addr)?;
            let value = cpu.register(src)?;
            cpu.bus_mut().write_word(address, value)
        }
        Instruction::Loadi { dst, imm } => {
            cpu.set_register(dst, imm)?;
            cpu.flags_mut().update(imm);
            Ok(())
        }
        Instruction::Stori { src, addr } => {
            let value = cpu.register(src)?;
            cpu.bus_mut().write_word(addr, value)
        }

        // ========== Block ==========
        Instruction::Mset { dst, src } => {
            let count = cpu.register(1)?;
            let base = cpu.register(dst)?;
            let value = cpu.register(src)?;
            for i in 0..count {
                cpu.bus_mut()
                    .write_word(base.wrapping_add(i.wrapping_mul(4)), value)?;
            }
            Ok(())
        }
        Instruction::Mcpy { dst, src } => {
            let count = cpu.register(1)?;
            let to = cpu.register(dst)?;
            let from = cpu.register(src)?;
            let span = count.wrapping_mul(4);
            // Destination overlapping ahead of the source requires a
            // backward copy.
            let backward = to > from && to < from.wrapping_add(span);
            let order: Box<dyn Iterator<Item = Word>> = if backward {
                Box::new((0..count).rev())
            } else {
                Box::new(0..count)
            };
            for i in order {
                let offset = i.wrapping_mul(4);
                let word = cpu.bus().read_word(from.wrapping_add(offset))?;
                cpu.bus_mut().write_word(to.wrapping_add(offset), word)?;
            }
            Ok(())
        }

        // ========== Data movement ==========
        Instruction::Mov { dst, src } => {
            let value = cpu.register(src)?;
            cpu.set_register(dst, value)?;
            cpu.flags_mut().update(value);
            Ok(())
        }
        Instruction::Movi { dst, imm } => {
            cpu.set_register(dst, imm)?;
            cpu.flags_mut().update(imm);
            Ok(())
        }

        // ========== Compare ==========
        Instruction::Cmp { a, b } => {
            let x = cpu.register(a)?;
            let y = cpu.register(b)?;
            cpu.flags_mut().update_sub(x, y, x.wrapping_sub(y));
            Ok(())
        }
        Instruction::Cmpi { a, imm } => {
            let x = cpu.register(a)?;
            cpu.flags_mut().update_sub(x, imm, x.wrapping_sub(imm));
            Ok(())
        }
        Instruction::Test { a, b } => {
            let x = cpu.register(a)?;
            let y = cpu.register(b)?;
            cpu.flags_mut().update(x & y);
            Ok(())
        }
        Instruction::Testi { a, imm } => {
            let x = cpu.register(a)?;
            cpu.flags_mut().update(x & imm);
            Ok(())
        }

        // ========== Jumps ==========
        Instruction::Jmp { addr } => branch(cpu, true, addr),
        Instruction::Jz { addr } | Instruction::Je { addr } => {
            let taken = cpu.flags().zero;
            branch(cpu, taken, addr)
        }
        Instruction::Jnz { addr } | Instruction::Jne { addr } => {
            let taken = !cpu.flags().zero;
            branch(cpu, taken, addr)
        }
        Instruction::Jn { addr } | Instruction::Jl { addr } => {
            let taken = cpu.flags().negative;
            branch(cpu, taken, addr)
        }
        Instruction::Jp { addr } | Instruction::Jge { addr } => {
            let taken = !cpu.flags().negative;
            branch(cpu, taken, addr)
        }
        Instruction::Jg { addr } => {
            let flags = cpu.flags();
            branch(cpu, !flags.zero && !flags.negative, addr)
        }
        Instruction::Jle { addr } => {
            let flags = cpu.flags();
            branch(cpu, flags.negative || flags.zero, addr)
        }
        Instruction::Jc { addr } | Instruction::Jb { addr } => {
            let taken = cpu.flags().carry;
            branch(cpu, taken, addr)
        }
        Instruction::Jnc { addr } | Instruction::Jae { addr } => {
            let taken = !cpu.flags().carry;
            branch(cpu, taken, addr)
        }
        Instruction::Ja { addr } => {
            let flags = cpu.flags();
            branch(cpu, !flags.carry && !flags.zero, addr)
        }
        Instruction::Jbe { addr } => {
            let flags = cpu.flags();
            branch(cpu, flags.carry || flags.zero, addr)
        }

        // ========== Call / return ==========
        Instruction::Call { addr } => {
            let ret = cpu.pc();
            cpu.push(ret)?;
            cpu.jump(addr);
            Ok(())
        }
        Instruction::Ret => {
            let ret = cpu.pop()?;
            cpu.jump(ret);
            Ok(())
        }

        // ========== Stack ==========
        Instruction::Push { src } => {
            let value = cpu.register(src)?;
            cpu.push(value)
        }
        Instruction::Pop { dst } => {
            let value = cpu.pop()?;
            cpu.set_register(dst, value)?;
            cpu.flags_mut().update(value);
            Ok(())
        }

        // ========== System ==========
        Instruction::Syscall => syscall::dispatch(cpu),
        Instruction::Nop => Ok(()),
        Instruction::Hlt => {
            cpu.set_halted();
            tracing::debug!("halt at {:#010x}", cpu.pc());
            Ok(())
        }
    }
}

fn branch(cpu: &mut Cpu, taken: bool, addr: Address) -> Result<()> {
    if taken {
        cpu.jump(addr);
    }
    Ok(())
}

fn unary(cpu: &mut Cpu, dst: u8, f: impl Fn(Word) -> Word) -> Result<()> {
    let a = cpu.register(dst)?;
    let r = f(a);
    cpu.set_register(dst, r)?;
    cpu.flags_mut().update(r);
    Ok(())
}

fn logical(cpu: &mut Cpu, dst: u8, b: Word, f: impl Fn(Word, Word) -> Word) -> Result<()> {
    let a = cpu.register(dst)?;
    let r = f(a, b);
    cpu.set_register(dst, r)?;
    cpu.flags_mut().update(r);
    Ok(())
}

fn add_into(cpu: &mut Cpu, dst: u8, b: Word) -> Result<()> {
    let a = cpu.register(dst)?;
    let r = a.wrapping_add(b);
    cpu.set_register(dst, r)?;
    cpu.flags_mut().update_add(a, b, r);
    Ok(())
}

fn sub_into(cpu: &mut Cpu, dst: u8, b: Word) -> Result<()> {
    let a = cpu.register(dst)?;
    let r = a.wrapping_sub(b);
    cpu.set_register(dst, r)?;
    cpu.flags_mut().update_sub(a, b, r);
    Ok(())
}

fn mul_into(cpu: &mut Cpu, dst: u8, b: Word) -> Result<()> {
    let a = cpu.register(dst)?;
    let r = a.wrapping_mul(b);
    cpu.set_register(dst, r)?;
    cpu.flags_mut().update(r);
    Ok(())
}

fn div_into(cpu: &mut Cpu, dst: u8, b: Word, pc: Address) -> Result<()> {
    if b == 0 {
        return Err(RuntimeError::DivisionByZero { pc });
    }
    let a = cpu.register(dst)?;
    let r = (a as i32).wrapping_div(b as i32) as Word;
    cpu.set_register(dst, r)?;
    cpu.flags_mut().update(r);
    Ok(())
}

fn mod_into(cpu: &mut Cpu, dst: u8, b: Word, pc: Address) -> Result<()> {
    if b == 0 {
        return Err(RuntimeError::DivisionByZero { pc });
    }
    let a = cpu.register(dst)?;
    let r = (a as i32).wrapping_rem(b as i32) as Word;
    cpu.set_register(dst, r)?;
    cpu.flags_mut().update(r);
    Ok(())
}
