//! Disassembly errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisassemblerError {
    #[error("unknown opcode {opcode:#04x} at word {index}")]
    UnknownOpcode { index: usize, opcode: u8 },

    #[error("stream ends at word {index}: {mnemonic} needs an immediate word")]
    Truncated { index: usize, mnemonic: &'static str },
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let err = DisassemblerError::UnknownOpcode { index: 3, opcode: 0xEE };
        assert_eq!(err.to_string(), "unknown opcode 0xee at word 3");

        let err = DisassemblerError::Truncated { index: 1, mnemonic: "MOVI" };
        assert!(err.to_string().contains("MOVI"));
    }
}
