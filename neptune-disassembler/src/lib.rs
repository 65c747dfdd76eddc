//! # Neptune VM Disassembler
//!
//! Decodes Neptune program words back into instructions and formats them as
//! addressed assembly listings for external tooling.

pub mod decoder;
pub mod error;
pub mod formatter;

pub use decoder::decode_program;
pub use error::{DisassemblerError, Result};
pub use formatter::{disassemble, format_instruction, format_listing};
