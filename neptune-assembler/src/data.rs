//! `.data` section declarations
//!
//! Each declaration produces a named byte payload; the assembler binds the
//! name as a label at the current data cursor and advances it to the next
//! 4-byte slot.
//!
//! | declaration               | payload                                   |
//! |---------------------------|-------------------------------------------|
//! | `string NAME = "..."`     | UTF-8 bytes plus a trailing NUL           |
//! | `int NAME = V`            | one 32-bit word                           |
//! | `word NAME = V`           | one 32-bit word                           |
//! | `byte NAME = V`           | one byte, -128..=255                      |
//! | `array NAME[N] = v, ...`  | N words, zero-filled past the initializers |
//! | `buffer NAME[N]`          | N zero bytes                              |

use crate::error::{AssemblerError, Result};
use crate::lexer::{
    is_identifier, literal_to_word, parse_numeric, split_args, string_literal_body,
    unescape_string,
};

/// A parsed declaration: label name plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDecl {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// True when the line's keyword starts a data declaration.
pub fn is_data_declaration(line: &str) -> bool {
    let head = line.split_whitespace().next().unwrap_or("");
    ["string", "int", "word", "byte", "array", "buffer"]
        .iter()
        .any(|kw| head.eq_ignore_ascii_case(kw))
}

/// Parse one declaration line.
pub fn parse_declaration(text: &str, line: usize) -> Result<DataDecl> {
    let bad = |message: String| AssemblerError::BadArgument { line, message };

    let (keyword, rest) = match text.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => return Err(bad(format!("incomplete data declaration `{}`", text))),
    };

    match keyword.to_ascii_lowercase().as_str() {
        "string" => {
            let (name, value) = name_and_value(rest, line)?;
            let body = string_literal_body(value, line)?;
            let mut bytes = unescape_string(body, line)?;
            bytes.push(0);
            Ok(DataDecl { name, bytes })
        }
        "int" | "word" => {
            let (name, value) = name_and_value(rest, line)?;
            let word = literal_to_word(parse_value(value, line)?);
            Ok(DataDecl {
                name,
                bytes: word.to_le_bytes().to_vec(),
            })
        }
        "byte" => {
            let (name, value) = name_and_value(rest, line)?;
            let raw = parse_value(value, line)?;
            if !(-128..=255).contains(&raw) {
                return Err(AssemblerError::ByteOutOfRange { line, value: raw });
            }
            Ok(DataDecl {
                name,
                bytes: vec![raw as u8],
            })
        }
        "array" => {
            let (name, size, init) = name_size_and_init(rest, line)?;
            let values = match init {
                Some(list) => split_args(list)
                    .into_iter()
                    .map(|tok| parse_value(tok, line).map(literal_to_word))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            if values.len() > size {
                return Err(AssemblerError::ArrayOverflow { line, name });
            }
            let mut bytes = Vec::with_capacity(size * 4);
            for i in 0..size {
                let word = values.get(i).copied().unwrap_or(0);
                bytes.extend_from_slice(&word.to_le_bytes());
            }
            Ok(DataDecl { name, bytes })
        }
        "buffer" => {
            let (name, size, init) = name_size_and_init(rest, line)?;
            if init.is_some() {
                return Err(bad("buffer takes no initializer".to_string()));
            }
            Ok(DataDecl {
                name,
                bytes: vec![0; size],
            })
        }
        other => Err(bad(format!("unknown data keyword `{}`", other))),
    }
}

/// `NAME = VALUE` split.
fn name_and_value(rest: &str, line: usize) -> Result<(String, &str)> {
    let (name, value) = rest
        .split_once('=')
        .ok_or_else(|| AssemblerError::BadArgument {
            line,
            message: format!("expected `NAME = VALUE`, got `{}`", rest),
        })?;
    let name = checked_name(name.trim(), line)?;
    Ok((name, value.trim()))
}

/// `NAME[SIZE]` with an optional `= v1, v2, ...` tail.
fn name_size_and_init<'a>(rest: &'a str, line: usize) -> Result<(String, usize, Option<&'a str>)> {
    let bad = |message: String| AssemblerError::BadArgument { line, message };

    let (decl, init) = match rest.split_once('=') {
        Some((d, i)) => (d.trim(), Some(i.trim())),
        None => (rest.trim(), None),
    };
    let (name, size_part) = decl
        .split_once('[')
        .ok_or_else(|| bad(format!("expected `NAME[SIZE]`, got `{}`", decl)))?;
    let size_text = size_part
        .strip_suffix(']')
        .ok_or_else(|| bad(format!("missing `]` in `{}`", decl)))?
        .trim();
    let size = parse_value(size_text, line)?;
    if size < 0 {
        return Err(bad(format!("negative size {}", size)));
    }
    let name = checked_name(name.trim(), line)?;
    Ok((name, size as usize, init))
}

fn parse_value(token: &str, line: usize) -> Result<i64> {
    parse_numeric(token, line).unwrap_or_else(|| {
        Err(AssemblerError::BadNumericLiteral {
            line,
            literal: token.to_string(),
        })
    })
}

fn checked_name(name: &str, line: usize) -> Result<String> {
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(AssemblerError::BadArgument {
            line,
            message: format!("bad data name `{}`", name),
        })
    }
}
