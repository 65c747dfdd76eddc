//! Error types shared by the encoding/decoding layer

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// Opcode byte with no registered instruction
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// Register index outside the file and not a PC/SP/HP alias
    #[error("invalid register index {0}")]
    InvalidRegister(u8),

    /// Operand list does not fit the instruction's form
    #[error("bad operands for {mnemonic}: {message}")]
    BadOperands {
        mnemonic: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, SpecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_opcode_display_is_hex() {
        let err = SpecError::UnknownOpcode(0xAB);
        assert_eq!(err.to_string(), "unknown opcode 0xab");
    }

    #[test]
    fn bad_operands_display() {
        let err = SpecError::BadOperands {
            mnemonic: "ADD",
            message: "expected 2 operands, got 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "bad operands for ADD: expected 2 operands, got 1"
        );
    }
}
