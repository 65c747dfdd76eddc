//! Listing output
//!
//! Renders decoded instructions as assembly text, one line per instruction
//! with its address. Debug tooling (memory viewers) feeds program words in
//! and shows the listing next to raw memory.

use crate::decoder::decode_program;
use crate::error::Result;
use neptune_spec::{Address, Instruction, Word};

/// Render one instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    instr.to_string()
}

/// Render a decoded program as an addressed listing.
pub fn format_listing(program: &[(Address, Instruction)]) -> String {
    let mut out = String::new();
    for (addr, instr) in program {
        out.push_str(&format!("{:#010x}  {}\n", addr, instr));
    }
    out
}

/// Decode and render a word stream in one step.
pub fn disassemble(words: &[Word], base: Address) -> Result<String> {
    Ok(format_listing(&decode_program(words, base)?))
}
