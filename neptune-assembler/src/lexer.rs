//! Token-level scanning for the assembler
//!
//! Line cleaning, numeric literals, register tokens, and string escapes.
//! Comments start at `;` or `#` outside string literals and run to the end
//! of the line.

use crate::error::{AssemblerError, Result};
use neptune_spec::register_alias;

/// A cleaned, non-empty source line with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

/// Strip comments and whitespace from every line, dropping empty ones.
pub fn clean_lines(source: &str) -> Vec<SourceLine> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = strip_comment(raw).trim().to_string();
            (!text.is_empty()).then_some(SourceLine {
                number: idx + 1,
                text,
            })
        })
        .collect()
}

/// Cut a line at the first `;` or `#` that sits outside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            ';' | '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Split an argument list on commas, trimming each piece.
pub fn split_args(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    args.split(',').map(str::trim).collect()
}

/// Parse a register token: `rN` (case-insensitive) or a `pc`/`sp`/`hp` alias.
pub fn parse_register(token: &str) -> Option<u8> {
    if let Some(alias) = register_alias(token) {
        return Some(alias);
    }
    let rest = token.strip_prefix('r').or_else(|| token.strip_prefix('R'))?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse::<u8>().ok()
}

/// Try to parse a numeric literal.
///
/// Returns `None` when the token does not look numeric at all, and
/// `Some(Err(..))` when it looks numeric but cannot be parsed. Hexadecimal
/// (`0x..`) and binary (`0b..`) literals are unsigned 32-bit; decimal is
/// signed.
pub fn parse_numeric(token: &str, line: usize) -> Option<Result<i64>> {
    let bad = || AssemblerError::BadNumericLiteral {
        line,
        literal: token.to_string(),
    };

    let looks_numeric = {
        let mut chars = token.chars();
        match chars.next() {
            Some('-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    };
    if !looks_numeric {
        return None;
    }

    let lower = token.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).map(i64::from).map_err(|_| bad())
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u32::from_str_radix(bin, 2).map(i64::from).map_err(|_| bad())
    } else {
        match token.parse::<i64>() {
            Ok(v) if (-(1i64 << 31)..1i64 << 32).contains(&v) => Ok(v),
            _ => Err(bad()),
        }
    };
    Some(parsed)
}

/// Two's-complement view of a parsed literal.
pub fn literal_to_word(value: i64) -> u32 {
    value as u32
}

/// Decode the body of a string literal, honoring `\n \t \r \\ \" \0`.
pub fn unescape_string(body: &str, line: usize) -> Result<Vec<u8>> {
    let bad = |message: String| AssemblerError::BadArgument { line, message };
    let mut bytes = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| bad("string ends inside an escape".to_string()))?;
        bytes.push(match escaped {
            'n' => b'\n',
            't' => b'\t',
            'r' => b'\r',
            '\\' => b'\\',
            '"' => b'"',
            '0' => 0,
            other => return Err(bad(format!("unknown escape `\\{}`", other))),
        });
    }
    Ok(bytes)
}

/// Extract the quoted body from a `"..."` literal.
pub fn string_literal_body(token: &str, line: usize) -> Result<&str> {
    let inner = token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|_| token.len() >= 2);
    inner.ok_or_else(|| AssemblerError::BadArgument {
        line,
        message: format!("expected a quoted string, got `{}`", token),
    })
}

/// True when the token is a valid label/constant/macro identifier.
pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use neptune_spec::{REG_HP, REG_PC, REG_SP};

    #[test]
    fn cleaning_strips_comments_and_blanks() {
        let lines = clean_lines("  MOVI r1, 5 ; count\n\n# full comment\nHLT  \n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].text, "MOVI r1, 5");
        assert_eq!(lines[1].number, 4);
        assert_eq!(lines[1].text, "HLT");
    }

    #[test]
    fn comment_markers_inside_strings_survive() {
        let lines = clean_lines("string s = \"a;b#c\" ; trailing");
        assert_eq!(lines[0].text, "string s = \"a;b#c\"");
    }

    #[test]
    fn register_tokens() {
        assert_eq!(parse_register("r0"), Some(0));
        assert_eq!(parse_register("R31"), Some(31));
        assert_eq!(parse_register("pc"), Some(REG_PC));
        assert_eq!(parse_register("SP"), Some(REG_SP));
        assert_eq!(parse_register("hp"), Some(REG_HP));
        assert_eq!(parse_register("r"), None);
        assert_eq!(parse_register("r1x"), None);
        assert_eq!(parse_register("loop"), None);
        assert_eq!(parse_register("r300"), None);
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(parse_numeric("42", 1).unwrap().unwrap(), 42);
        assert_eq!(parse_numeric("-7", 1).unwrap().unwrap(), -7);
        assert_eq!(parse_numeric("0x2A", 1).unwrap().unwrap(), 0x2A);
        assert_eq!(parse_numeric("0XFF", 1).unwrap().unwrap(), 0xFF);
        assert_eq!(parse_numeric("0b1010", 1).unwrap().unwrap(), 10);
        assert_eq!(
            parse_numeric("0xFFFFFFFF", 1).unwrap().unwrap(),
            0xFFFF_FFFF
        );

        assert!(parse_numeric("loop", 1).is_none(), "identifier, not a number");
        assert!(parse_numeric("-x", 1).is_none());
        assert!(parse_numeric("0xZZ", 1).unwrap().is_err());
        assert!(parse_numeric("12ab", 1).unwrap().is_err());
        assert!(parse_numeric("99999999999", 1).unwrap().is_err());
    }

    #[test]
    fn negative_literals_wrap_to_words() {
        assert_eq!(literal_to_word(-1), 0xFFFF_FFFF);
        assert_eq!(literal_to_word(-2147483648), 0x8000_0000);
        assert_eq!(literal_to_word(0xFFFF_FFFF), 0xFFFF_FFFF);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            unescape_string("a\\nb\\t\\\\\\\"\\0", 1).unwrap(),
            vec![b'a', b'\n', b'b', b'\t', b'\\', b'"', 0]
        );
        assert!(unescape_string("bad\\q", 1).is_err());
        assert!(unescape_string("trailing\\", 1).is_err());
    }

    #[test]
    fn string_literal_bodies() {
        assert_eq!(string_literal_body("\"hi\"", 1).unwrap(), "hi");
        assert_eq!(string_literal_body("\"\"", 1).unwrap(), "");
        assert!(string_literal_body("\"open", 1).is_err());
        assert!(string_literal_body("bare", 1).is_err());
    }

    #[test]
    fn split_args_handles_spacing() {
        assert_eq!(split_args("r1, 5"), vec!["r1", "5"]);
        assert_eq!(split_args(" a ,b, c "), vec!["a", "b", "c"]);
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("main"));
        assert!(is_identifier("_tmp2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
