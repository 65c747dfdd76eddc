//! Instruction-set tables
//!
//! The assembler and disassembler consume the name/opcode tables; the CPU
//! uses the set to validate opcode bytes during fetch. Construction walks the
//! catalog in registration order, so the tables are deterministic.

use crate::error::{Result, SpecError};
use crate::opcode::{Opcode, OperandForm};
use crate::Word;
use std::collections::HashMap;

/// One registered instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub opcode: Opcode,
    pub mnemonic: &'static str,
    pub word_count: u8,
    pub form: OperandForm,
}

/// Registration-ordered opcode table plus mnemonic lookup.
#[derive(Debug, Clone)]
pub struct InstructionSet {
    entries: Vec<OpcodeEntry>,
    by_name: HashMap<&'static str, Opcode>,
}

impl InstructionSet {
    /// The canonical Neptune instruction set.
    pub fn neptune() -> Self {
        let mut entries = Vec::with_capacity(Opcode::COUNT);
        let mut by_name = HashMap::with_capacity(Opcode::COUNT);
        for opcode in Opcode::ALL {
            entries.push(OpcodeEntry {
                opcode,
                mnemonic: opcode.mnemonic(),
                word_count: opcode.word_count(),
                form: opcode.operand_form(),
            });
            by_name.insert(opcode.mnemonic(), opcode);
        }
        InstructionSet { entries, by_name }
    }

    /// Look up an opcode by mnemonic, case-insensitively.
    pub fn opcode_for(&self, mnemonic: &str) -> Option<Opcode> {
        self.by_name
            .get(mnemonic.to_ascii_uppercase().as_str())
            .copied()
    }

    /// Mnemonic for an opcode.
    pub fn mnemonic(&self, opcode: Opcode) -> &'static str {
        opcode.mnemonic()
    }

    /// Resolve the opcode byte of an instruction word.
    pub fn decode_opcode(&self, word0: Word) -> Result<Opcode> {
        Opcode::from_word(word0).ok_or(SpecError::UnknownOpcode((word0 & 0xFF) as u8))
    }

    /// Registered instructions in registration order.
    pub fn entries(&self) -> &[OpcodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::neptune()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_catalog_order() {
        let set = InstructionSet::neptune();
        assert_eq!(set.len(), Opcode::COUNT);
        for (entry, opcode) in set.entries().iter().zip(Opcode::ALL) {
            assert_eq!(entry.opcode, opcode);
            assert_eq!(entry.mnemonic, opcode.mnemonic());
            assert_eq!(entry.word_count, opcode.word_count());
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let a = InstructionSet::neptune();
        let b = InstructionSet::neptune();
        assert_eq!(a.entries(), b.entries());
    }

    #[test]
    fn mnemonic_lookup() {
        let set = InstructionSet::neptune();
        assert_eq!(set.opcode_for("movi"), Some(Opcode::Movi));
        assert_eq!(set.opcode_for("SYSCALL"), Some(Opcode::Syscall));
        assert_eq!(set.opcode_for("bogus"), None);
    }

    #[test]
    fn decode_opcode_errors_on_unregistered_byte() {
        let set = InstructionSet::neptune();
        assert!(set.decode_opcode(0x0000_0001).is_ok());
        assert_eq!(
            set.decode_opcode(0x0000_00F0),
            Err(SpecError::UnknownOpcode(0xF0))
        );
    }
}
