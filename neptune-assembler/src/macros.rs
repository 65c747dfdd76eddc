//! Textual macro expansion
//!
//! `.macro name p1 p2` ... `.endmacro` defines a macro; invoking it by name
//! substitutes the body with whole-word parameter replacement. Expansion is
//! repeated until no macro invocations remain, with a depth cap against
//! recursive definitions.

use crate::error::{AssemblerError, Result};
use crate::lexer::{is_identifier, split_args, SourceLine};
use std::collections::HashMap;

const MAX_EXPANSION_DEPTH: usize = 32;

#[derive(Debug, Clone)]
struct MacroDef {
    params: Vec<String>,
    body: Vec<String>,
    line: usize,
}

/// Collect macro definitions and expand every invocation.
pub fn expand(lines: Vec<SourceLine>) -> Result<Vec<SourceLine>> {
    let (macros, rest) = collect_definitions(lines)?;
    if macros.is_empty() {
        return Ok(rest);
    }

    let mut current = rest;
    for _ in 0..MAX_EXPANSION_DEPTH {
        let (expanded, changed) = expand_once(&macros, current)?;
        current = expanded;
        if !changed {
            return Ok(current);
        }
    }
    Err(AssemblerError::BadArgument {
        line: current.first().map(|l| l.number).unwrap_or(0),
        message: "macro expansion exceeded the recursion limit".to_string(),
    })
}

fn collect_definitions(
    lines: Vec<SourceLine>,
) -> Result<(HashMap<String, MacroDef>, Vec<SourceLine>)> {
    let mut macros: HashMap<String, MacroDef> = HashMap::new();
    let mut rest = Vec::with_capacity(lines.len());
    let mut open: Option<(String, MacroDef)> = None;

    for line in lines {
        let mut tokens = line.text.split_whitespace();
        let head = tokens.next().unwrap_or("");

        if head.eq_ignore_ascii_case(".macro") {
            if open.is_some() {
                return Err(AssemblerError::BadArgument {
                    line: line.number,
                    message: "nested .macro definition".to_string(),
                });
            }
            let name = tokens.next().ok_or_else(|| AssemblerError::BadArgument {
                line: line.number,
                message: ".macro needs a name".to_string(),
            })?;
            if !is_identifier(name) {
                return Err(AssemblerError::BadArgument {
                    line: line.number,
                    message: format!("bad macro name `{}`", name),
                });
            }
            let params: Vec<String> = tokens.map(str::to_string).collect();
            for param in &params {
                if !is_identifier(param) {
                    return Err(AssemblerError::BadArgument {
                        line: line.number,
                        message: format!("bad macro parameter `{}`", param),
                    });
                }
            }
            open = Some((
                name.to_ascii_lowercase(),
                MacroDef {
                    params,
                    body: Vec::new(),
                    line: line.number,
                },
            ));
        } else if head.eq_ignore_ascii_case(".endmacro") {
            let (name, def) = open.take().ok_or_else(|| AssemblerError::BadArgument {
                line: line.number,
                message: ".endmacro without .macro".to_string(),
            })?;
            if macros.insert(name.clone(), def).is_some() {
                return Err(AssemblerError::BadArgument {
                    line: line.number,
                    message: format!("macro `{}` redefined", name),
                });
            }
        } else if let Some((_, def)) = open.as_mut() {
            def.body.push(line.text);
        } else {
            rest.push(line);
        }
    }

    if let Some((name, def)) = open {
        return Err(AssemblerError::BadArgument {
            line: def.line,
            message: format!("macro `{}` is missing .endmacro", name),
        });
    }
    Ok((macros, rest))
}

fn expand_once(
    macros: &HashMap<String, MacroDef>,
    lines: Vec<SourceLine>,
) -> Result<(Vec<SourceLine>, bool)> {
    let mut out = Vec::with_capacity(lines.len());
    let mut changed = false;

    for line in lines {
        let head = line.text.split_whitespace().next().unwrap_or("");
        let Some(def) = macros.get(&head.to_ascii_lowercase()) else {
            out.push(line);
            continue;
        };

        let args_text = line.text[head.len()..].trim();
        let args = split_args(args_text);
        if args.len() != def.params.len() {
            return Err(AssemblerError::BadArgument {
                line: line.number,
                message: format!(
                    "macro `{}` takes {} argument(s), got {}",
                    head,
                    def.params.len(),
                    args.len()
                ),
            });
        }

        changed = true;
        for body_line in &def.body {
            out.push(SourceLine {
                number: line.number,
                text: substitute(body_line, &def.params, &args),
            });
        }
    }
    Ok((out, changed))
}

/// Replace whole-word occurrences of each parameter with its argument.
fn substitute(line: &str, params: &[String], args: &[&str]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut word = String::new();
    for c in line.chars().chain(std::iter::once('\0')) {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            match params.iter().position(|p| *p == word) {
                Some(idx) => out.push_str(args[idx]),
                None => out.push_str(&word),
            }
            word.clear();
        }
        if c != '\0' {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::clean_lines;

    fn expand_src(source: &str) -> Result<Vec<String>> {
        Ok(expand(clean_lines(source))?
            .into_iter()
            .map(|l| l.text)
            .collect())
    }

    #[test]
    fn simple_expansion() {
        let out = expand_src(
            ".macro put dst val\n\
             MOVI dst, val\n\
             .endmacro\n\
             put r1, 5\n\
             HLT",
        )
        .unwrap();
        assert_eq!(out, vec!["MOVI r1, 5", "HLT"]);
    }

    #[test]
    fn whole_word_matching_leaves_substrings_alone() {
        let out = expand_src(
            ".macro inc2 r\n\
             INC r\n\
             INC r\n\
             .endmacro\n\
             inc2 r3",
        )
        .unwrap();
        // The parameter `r` must not rewrite the `r` inside `r3` outputs.
        assert_eq!(out, vec!["INC r3", "INC r3"]);
    }

    #[test]
    fn nested_invocations_expand() {
        let out = expand_src(
            ".macro zero dst\n\
             MOVI dst, 0\n\
             .endmacro\n\
             .macro zero2 a b\n\
             zero a\n\
             zero b\n\
             .endmacro\n\
             zero2 r1, r2",
        )
        .unwrap();
        assert_eq!(out, vec!["MOVI r1, 0", "MOVI r2, 0"]);
    }

    #[test]
    fn expanded_lines_keep_the_invocation_line_number() {
        let lines = expand(clean_lines(
            ".macro put dst val\n\
             MOVI dst, val\n\
             .endmacro\n\
             put r1, 5",
        ))
        .unwrap();
        assert_eq!(lines[0].number, 4);
    }

    #[test]
    fn argument_count_mismatch_is_an_error() {
        let err = expand_src(
            ".macro put dst val\n\
             MOVI dst, val\n\
             .endmacro\n\
             put r1",
        )
        .unwrap_err();
        assert!(err.to_string().contains("argument"));
    }

    #[test]
    fn unterminated_macro_is_an_error() {
        assert!(expand_src(".macro put dst\nMOVI dst, 0").is_err());
        assert!(expand_src(".endmacro").is_err());
    }

    #[test]
    fn recursive_macro_hits_the_depth_cap() {
        let err = expand_src(
            ".macro spin\n\
             spin\n\
             .endmacro\n\
             spin",
        )
        .unwrap_err();
        assert!(err.to_string().contains("recursion"));
    }

    #[test]
    fn lines_without_macros_pass_through_untouched() {
        let out = expand_src("MOVI r1, 1\nHLT").unwrap();
        assert_eq!(out, vec!["MOVI r1, 1", "HLT"]);
    }
}
