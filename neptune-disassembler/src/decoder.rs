//! Word-stream decoding
//!
//! Walks a slice of program words, consuming one or two words per
//! instruction, and yields each instruction with the address it was fetched
//! from.

use crate::error::{DisassemblerError, Result};
use neptune_spec::{Address, Instruction, Opcode, Word};

/// Decode `words` as a program based at `base`.
pub fn decode_program(words: &[Word], base: Address) -> Result<Vec<(Address, Instruction)>> {
    let mut out = Vec::new();
    let mut index = 0;
    while index < words.len() {
        let word0 = words[index];
        let opcode = Opcode::from_word(word0).ok_or(DisassemblerError::UnknownOpcode {
            index,
            opcode: (word0 & 0xFF) as u8,
        })?;
        let word1 = if opcode.word_count() == 2 {
            *words
                .get(index + 1)
                .ok_or(DisassemblerError::Truncated {
                    index,
                    mnemonic: opcode.mnemonic(),
                })?
        } else {
            0
        };
        // Decode cannot fail past the opcode check above.
        let instr = Instruction::decode(word0, word1).expect("validated opcode");
        out.push((base + index as Address * 4, instr));
        index += opcode.word_count() as usize;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_width_stream_decodes_with_addresses() {
        let movi = Instruction::Movi { dst: 1, imm: 5 }.encode();
        let inc = Instruction::Inc { dst: 1 }.encode();
        let jmp = Instruction::Jmp { addr: 0x2000 }.encode();
        let words: Vec<Word> = [movi.as_slice(), inc.as_slice(), jmp.as_slice()].concat();

        let decoded = decode_program(&words, 0x2000).unwrap();
        assert_eq!(
            decoded,
            vec![
                (0x2000, Instruction::Movi { dst: 1, imm: 5 }),
                (0x2008, Instruction::Inc { dst: 1 }),
                (0x200C, Instruction::Jmp { addr: 0x2000 }),
            ]
        );
    }

    #[test]
    fn unknown_opcode_reports_word_index() {
        let words = [Instruction::Nop.encode().word0(), 0x0000_00F7];
        assert_eq!(
            decode_program(&words, 0).unwrap_err(),
            DisassemblerError::UnknownOpcode { index: 1, opcode: 0xF7 }
        );
    }

    #[test]
    fn truncated_two_word_form_reports_mnemonic() {
        let movi = Instruction::Movi { dst: 1, imm: 5 }.encode();
        assert_eq!(
            decode_program(&[movi.word0()], 0).unwrap_err(),
            DisassemblerError::Truncated { index: 0, mnemonic: "MOVI" }
        );
    }
}
