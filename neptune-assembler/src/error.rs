//! Assembly-time error taxonomy
//!
//! Every variant carries the 1-based source line it was raised on.

use neptune_runtime::RuntimeError;
use neptune_spec::SpecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("duplicate label `{label}` at line {line}")]
    DuplicateLabel { line: usize, label: String },

    #[error("unknown instruction `{mnemonic}` at line {line}")]
    UnknownInstruction { line: usize, mnemonic: String },

    #[error("bad argument at line {line}: {message}")]
    BadArgument { line: usize, message: String },

    #[error("bad numeric literal `{literal}` at line {line}")]
    BadNumericLiteral { line: usize, literal: String },

    #[error("duplicate syscall number {number} at line {line}")]
    DuplicateSyscall { line: usize, number: u32 },

    #[error("too many initializers for array `{name}` at line {line}")]
    ArrayOverflow { line: usize, name: String },

    #[error("byte value {value} out of range at line {line}")]
    ByteOutOfRange { line: usize, value: i64 },

    /// Encoding rejected the resolved operands
    #[error("at line {line}: {source}")]
    Encoding { line: usize, source: SpecError },

    /// Failure writing the image into memory at load time
    #[error(transparent)]
    Load(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
