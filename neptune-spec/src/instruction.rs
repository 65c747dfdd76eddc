//! Instruction representation, encoding and decoding
//!
//! Instructions occupy one or two little-endian 32-bit words. Word 0 carries
//! `rDest` in bits 31:24, `rSrc` (or a literal shift amount) in bits 23:16,
//! a reserved zero byte in bits 15:8, and the opcode in bits 7:0. Two-word
//! forms carry a 32-bit immediate (literal or absolute address) in word 1.

use crate::error::{Result, SpecError};
use crate::opcode::{Opcode, OperandForm};
use crate::{register_name, Word};
use serde::{Deserialize, Serialize};

/// Operand resolved by the assembler: a register index or a 32-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Reg(u8),
    Imm(Word),
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Add { dst: u8, src: u8 },
    Sub { dst: u8, src: u8 },
    Mul { dst: u8, src: u8 },
    Div { dst: u8, src: u8 },
    Mod { dst: u8, src: u8 },
    Addi { dst: u8, imm: Word },
    Subi { dst: u8, imm: Word },
    Muli { dst: u8, imm: Word },
    Divi { dst: u8, imm: Word },
    Modi { dst: u8, imm: Word },
    Inc { dst: u8 },
    Dec { dst: u8 },
    Neg { dst: u8 },
    Not { dst: u8 },
    Clr { dst: u8 },
    And { dst: u8, src: u8 },
    Or { dst: u8, src: u8 },
    Xor { dst: u8, src: u8 },
    Andi { dst: u8, imm: Word },
    Ori { dst: u8, imm: Word },
    Xori { dst: u8, imm: Word },
    Shl { dst: u8, amount: u8 },
    Shr { dst: u8, amount: u8 },
    /// `reg[dst] <- mem[reg[addr]]`
    Load { dst: u8, addr: u8 },
    /// `mem[reg[addr]] <- reg[src]`
    Store { src: u8, addr: u8 },
    /// Immediate-to-register load (same data path as MOVI)
    Loadi { dst: u8, imm: Word },
    /// `mem[addr] <- reg[src]`
    Stori { src: u8, addr: Word },
    /// Fill `reg[1]` words at `reg[dst]` with `reg[src]`
    Mset { dst: u8, src: u8 },
    /// Copy `reg[1]` words from `reg[src]` to `reg[dst]`
    Mcpy { dst: u8, src: u8 },
    Mov { dst: u8, src: u8 },
    Movi { dst: u8, imm: Word },
    Cmp { a: u8, b: u8 },
    Cmpi { a: u8, imm: Word },
    Test { a: u8, b: u8 },
    Testi { a: u8, imm: Word },
    Jmp { addr: Word },
    Jz { addr: Word },
    Je { addr: Word },
    Jnz { addr: Word },
    Jne { addr: Word },
    Jn { addr: Word },
    Jp { addr: Word },
    Jg { addr: Word },
    Jge { addr: Word },
    Jl { addr: Word },
    Jle { addr: Word },
    Jc { addr: Word },
    Jnc { addr: Word },
    Ja { addr: Word },
    Jae { addr: Word },
    Jb { addr: Word },
    Jbe { addr: Word },
    Call { addr: Word },
    Ret,
    Push { src: u8 },
    Pop { dst: u8 },
    Syscall,
    Nop,
    Hlt,
}

/// Encoded form of an instruction: one or two words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedInstruction {
    words: [Word; 2],
    len: u8,
}

impl EncodedInstruction {
    pub fn as_slice(&self) -> &[Word] {
        &self.words[..self.len as usize]
    }

    pub fn word_count(&self) -> u8 {
        self.len
    }

    pub fn word0(&self) -> Word {
        self.words[0]
    }
}

impl Instruction {
    /// Decode from the first instruction word plus the following word.
    ///
    /// `word1` is only examined for two-word opcodes; pass anything (it is
    /// typically the next word in memory) for one-word forms.
    pub fn decode(word0: Word, word1: Word) -> Result<Self> {
        let opcode =
            Opcode::from_word(word0).ok_or(SpecError::UnknownOpcode((word0 & 0xFF) as u8))?;
        let dst = (word0 >> 24) as u8;
        let src = (word0 >> 16) as u8;
        let imm = if opcode.word_count() == 2 { word1 } else { 0 };
        Ok(Self::from_parts(opcode, dst, src, imm))
    }

    /// Build from an opcode and assembler-resolved operands.
    pub fn build(opcode: Opcode, operands: &[Operand]) -> Result<Self> {
        let bad = |message: String| SpecError::BadOperands {
            mnemonic: opcode.mnemonic(),
            message,
        };

        let (dst, src, imm) = match (opcode.operand_form(), operands) {
            (OperandForm::None, []) => (0, 0, 0),
            (OperandForm::Reg, [Operand::Reg(r)]) => (*r, 0, 0),
            (OperandForm::RegReg, [Operand::Reg(a), Operand::Reg(b)]) => (*a, *b, 0),
            (OperandForm::RegShift, [Operand::Reg(r), Operand::Imm(v)]) => {
                if *v > 0xFF {
                    return Err(bad(format!("shift amount {} exceeds 255", v)));
                }
                (*r, *v as u8, 0)
            }
            (OperandForm::RegImm, [Operand::Reg(r), Operand::Imm(v)]) => (*r, 0, *v),
            (OperandForm::Imm, [Operand::Imm(v)]) => (0, 0, *v),
            (form, ops) => {
                return Err(bad(format!(
                    "operands {:?} do not match the {:?} form",
                    ops, form
                )))
            }
        };
        Ok(Self::from_parts(opcode, dst, src, imm))
    }

    /// Encode to one or two little-endian words. The reserved byte is zero.
    pub fn encode(&self) -> EncodedInstruction {
        let (opcode, dst, src, imm) = self.parts();
        let word0 = ((dst as Word) << 24) | ((src as Word) << 16) | opcode.to_u8() as Word;
        let len = opcode.word_count();
        EncodedInstruction {
            words: [word0, imm],
            len,
        }
    }

    /// The instruction's opcode.
    pub fn opcode(&self) -> Opcode {
        self.parts().0
    }

    /// Construct the variant for `opcode` from raw encoding fields.
    fn from_parts(opcode: Opcode, dst: u8, src: u8, imm: Word) -> Self {
        match opcode {
            Opcode::Add => Instruction::Add { dst, src },
            Opcode::Sub => Instruction::Sub { dst, src },
            Opcode::Mul => Instruction::Mul { dst, src },
            Opcode::Div => Instruction::Div { dst, src },
            Opcode::Mod => Instruction::Mod { dst, src },
            Opcode::Addi => Instruction::Addi { dst, imm },
            Opcode::Subi => Instruction::Subi { dst, imm },
            Opcode::Muli => Instruction::Muli { dst, imm },
            Opcode::Divi => Instruction::Divi { dst, imm },
            Opcode::Modi => Instruction::Modi { dst, imm },
            Opcode::Inc => Instruction::Inc { dst },
            Opcode::Dec => Instruction::Dec { dst },
            Opcode::Neg => Instruction::Neg { dst },
            Opcode::Not => Instruction::Not { dst },
            Opcode::Clr => Instruction::Clr { dst },
            Opcode::And => Instruction::And { dst, src },
            Opcode::Or => Instruction::Or { dst, src },
            Opcode::Xor => Instruction::Xor { dst, src },
            Opcode::Andi => Instruction::Andi { dst, imm },
            Opcode::Ori => Instruction::Ori { dst, imm },
            Opcode::Xori => Instruction::Xori { dst, imm },
            Opcode::Shl => Instruction::Shl { dst, amount: src },
            Opcode::Shr => Instruction::Shr { dst, amount: src },
            Opcode::Load => Instruction::Load { dst, addr: src },
            Opcode::Store => Instruction::Store { src: dst, addr: src },
            Opcode::Loadi => Instruction::Loadi { dst, imm },
            Opcode::Stori => Instruction::Stori { src: dst, addr: imm },
            Opcode::Mset => Instruction::Mset { dst, src },
            Opcode::Mcpy => Instruction::Mcpy { dst, src },
            Opcode::Mov => Instruction::Mov { dst, src },
            Opcode::Movi => Instruction::Movi { dst, imm },
            Opcode::Cmp => Instruction::Cmp { a: dst, b: src },
            Opcode::Cmpi => Instruction::Cmpi { a: dst, imm },
            Opcode::Test => Instruction::Test { a: dst, b: src },
            Opcode::Testi => Instruction::Testi { a: dst, imm },
            Opcode::Jmp => Instruction::Jmp { addr: imm },
            Opcode::Jz => Instruction::Jz { addr: imm },
            Opcode::Je => Instruction::Je { addr: imm },
            Opcode::Jnz => Instruction::Jnz { addr: imm },
            Opcode::Jne => Instruction::Jne { addr: imm },
            Opcode::Jn => Instruction::Jn { addr: imm },
            Opcode::Jp => Instruction::Jp { addr: imm },
            Opcode::Jg => Instruction::Jg { addr: imm },
            Opcode::Jge => Instruction::Jge { addr: imm },
            Opcode::Jl => Instruction::Jl { addr: imm },
            Opcode::Jle => Instruction::Jle { addr: imm },
            Opcode::Jc => Instruction::Jc { addr: imm },
            Opcode::Jnc => Instruction::Jnc { addr: imm },
            Opcode::Ja => Instruction::Ja { addr: imm },
            Opcode::Jae => Instruction::Jae { addr: imm },
            Opcode::Jb => Instruction::Jb { addr: imm },
            Opcode::Jbe => Instruction::Jbe { addr: imm },
            Opcode::Call => Instruction::Call { addr: imm },
            Opcode::Ret => Instruction::Ret,
            Opcode::Push => Instruction::Push { src: dst },
            Opcode::Pop => Instruction::Pop { dst },
            Opcode::Syscall => Instruction::Syscall,
            Opcode::Nop => Instruction::Nop,
            Opcode::Hlt => Instruction::Hlt,
        }
    }

    /// Raw encoding fields: `(opcode, dst byte, src byte, immediate word)`.
    fn parts(&self) -> (Opcode, u8, u8, Word) {
        match *self {
            Instruction::Add { dst, src } => (Opcode::Add, dst, src, 0),
            Instruction::Sub { dst, src } => (Opcode::Sub, dst, src, 0),
            Instruction::Mul { dst, src } => (Opcode::Mul, dst, src, 0),
            Instruction::Div { dst, src } => (Opcode::Div, dst, src, 0),
            Instruction::Mod { dst, src } => (Opcode::Mod, dst, src, 0),
            Instruction::Addi { dst, imm } => (Opcode::Addi, dst, 0, imm),
            Instruction::Subi { dst, imm } => (Opcode::Subi, dst, 0, imm),
            Instruction::Muli { dst, imm } => (Opcode::Muli, dst, 0, imm),
            Instruction::Divi { dst, imm } => (Opcode::Divi, dst, 0, imm),
            Instruction::Modi { dst, imm } => (Opcode::Modi, dst, 0, imm),
            Instruction::Inc { dst } => (Opcode::Inc, dst, 0, 0),
            Instruction::Dec { dst } => (Opcode::Dec, dst, 0, 0),
            Instruction::Neg { dst } => (Opcode::Neg, dst, 0, 0),
            Instruction::Not { dst } => (Opcode::Not, dst, 0, 0),
            Instruction::Clr { dst } => (Opcode::Clr, dst, 0, 0),
            Instruction::And { dst, src } => (Opcode::And, dst, src, 0),
            Instruction::Or { dst, src } => (Opcode::Or, dst, src, 0),
            Instruction::Xor { dst, src } => (Opcode::Xor, dst, src, 0),
            Instruction::Andi { dst, imm } => (Opcode::Andi, dst, 0, imm),
            Instruction::Ori { dst, imm } => (Opcode::Ori, dst, 0, imm),
            Instruction::Xori { dst, imm } => (Opcode::Xori, dst, 0, imm),
            Instruction::Shl { dst, amount } => (Opcode::Shl, dst, amount, 0),
            Instruction::Shr { dst, amount } => (Opcode::Shr, dst, amount, 0),
            Instruction::Load { dst, addr } => (Opcode::Load, dst, addr, 0),
            Instruction::Store { src, addr } => (Opcode::Store, src, addr, 0),
            Instruction::Loadi { dst, imm } => (Opcode::Loadi, dst, 0, imm),
            Instruction::Stori { src, addr } => (Opcode::Stori, src, 0, addr),
            Instruction::Mset { dst, src } => (Opcode::Mset, dst, src, 0),
            Instruction::Mcpy { dst, src } => (Opcode::Mcpy, dst, src, 0),
            Instruction::Mov { dst, src } => (Opcode::Mov, dst, src, 0),
            Instruction::Movi { dst, imm } => (Opcode::Movi, dst, 0, imm),
            Instruction::Cmp { a, b } => (Opcode::Cmp, a, b, 0),
            Instruction::Cmpi { a, imm } => (Opcode::Cmpi, a, 0, imm),
            Instruction::Test { a, b } => (Opcode::Test, a, b, 0),
            Instruction::Testi { a, imm } => (Opcode::Testi, a, 0, imm),
            Instruction::Jmp { addr } => (Opcode::Jmp, 0, 0, addr),
            Instruction::Jz { addr } => (Opcode::Jz, 0, 0, addr),
            Instruction::Je { addr } => (Opcode::Je, 0, 0, addr),
            Instruction::Jnz { addr } => (Opcode::Jnz, 0, 0, addr),
            Instruction::Jne { addr } => (Opcode::Jne, 0, 0, addr),
            Instruction::Jn { addr } => (Opcode::Jn, 0, 0, addr),
            Instruction::Jp { addr } => (Opcode::Jp, 0, 0, addr),
            Instruction::Jg { addr } => (Opcode::Jg, 0, 0, addr),
            Instruction::Jge { addr } => (Opcode::Jge, 0, 0, addr),
            Instruction::Jl { addr } => (Opcode::Jl, 0, 0, addr),
            Instruction::Jle { addr } => (Opcode::Jle, 0, 0, addr),
            Instruction::Jc { addr } => (Opcode::Jc, 0, 0, addr),
            Instruction::Jnc { addr } => (Opcode::Jnc, 0, 0, addr),
            Instruction::Ja { addr } => (Opcode::Ja, 0, 0, addr),
            Instruction::Jae { addr } => (Opcode::Jae, 0, 0, addr),
            Instruction::Jb { addr } => (Opcode::Jb, 0, 0, addr),
            Instruction::Jbe { addr } => (Opcode::Jbe, 0, 0, addr),
            Instruction::Call { addr } => (Opcode::Call, 0, 0, addr),
            Instruction::Ret => (Opcode::Ret, 0, 0, 0),
            Instruction::Push { src } => (Opcode::Push, src, 0, 0),
            Instruction::Pop { dst } => (Opcode::Pop, dst, 0, 0),
            Instruction::Syscall => (Opcode::Syscall, 0, 0, 0),
            Instruction::Nop => (Opcode::Nop, 0, 0, 0),
            Instruction::Hlt => (Opcode::Hlt, 0, 0, 0),
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (opcode, dst, src, imm) = self.parts();
        match opcode.operand_form() {
            OperandForm::None => write!(f, "{}", opcode),
            OperandForm::Reg => write!(f, "{} {}", opcode, register_name(dst)),
            OperandForm::RegReg => {
                write!(f, "{} {}, {}", opcode, register_name(dst), register_name(src))
            }
            OperandForm::RegShift => write!(f, "{} {}, {}", opcode, register_name(dst), src),
            OperandForm::RegImm => write!(f, "{} {}, {:#x}", opcode, register_name(dst), imm),
            OperandForm::Imm => write!(f, "{} {:#x}", opcode, imm),
        }
    }
}
