//! Two-pass assembly
//!
//! Pass 1 expands macros, lays out the data section from the start of RAM,
//! computes the code start, and binds every label (data names, code labels,
//! syscall handlers) to an address. Pass 2 resolves argument tokens against
//! labels and constants, encodes each instruction, and collects the words.
//!
//! Loading writes the image through the bus's direct-region path (ROM is
//! writable at load time only) and applies the entry-point policy: a RAM
//! load starts at `main` when that label exists, else at the computed code
//! start.

use crate::data::{is_data_declaration, parse_declaration};
use crate::error::{AssemblerError, Result};
use crate::lexer::{
    clean_lines, is_identifier, literal_to_word, parse_numeric, parse_register, split_args,
    SourceLine,
};
use crate::macros::expand;
use neptune_runtime::Cpu;
use neptune_spec::{Address, Instruction, MemoryMap, Opcode, Operand, Word};
use std::collections::HashMap;

/// Assembled program: everything needed to populate memory and start the CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    pub base_address: Address,
    pub code_start: Address,
    /// Set for RAM loads; ROM loads leave the PC alone.
    pub entry_point: Option<Address>,
    pub data: Vec<(Address, Vec<u8>)>,
    pub code: Vec<(Address, Vec<Word>)>,
    /// Resolved `syscall N LABEL:` declarations.
    pub syscalls: Vec<(u32, Address)>,
    pub labels: HashMap<String, Address>,
}

#[derive(Debug)]
enum CodeItem {
    Label { line: usize, name: String },
    Syscall { line: usize, number: u32, name: String },
    Instr { line: usize, opcode: Opcode, args: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Code,
    Data,
}

/// Assemble source into a [`ProgramImage`] targeted at `base_address`.
pub fn assemble(source: &str, base_address: Address, map: &MemoryMap) -> Result<ProgramImage> {
    let lines = expand(clean_lines(source))?;

    let mut section = Section::Code;
    let mut saw_data_section = false;
    let mut data_cursor = map.ram_base;
    let mut data: Vec<(Address, Vec<u8>)> = Vec::new();
    let mut labels: HashMap<String, Address> = HashMap::new();
    let mut constants: HashMap<String, Word> = HashMap::new();
    let mut items: Vec<CodeItem> = Vec::new();
    let mut syscall_numbers: Vec<u32> = Vec::new();

    // Pass 1a: separate data from code, lay out data, collect code items.
    for line in &lines {
        let text = line.text.as_str();
        let number = line.number;
        let head = text.split_whitespace().next().unwrap_or("");

        if head.eq_ignore_ascii_case(".data") {
            section = Section::Data;
            saw_data_section = true;
        } else if head.eq_ignore_ascii_case(".code") {
            section = Section::Code;
        } else if head.eq_ignore_ascii_case(".const") {
            let (name, value) = parse_const(text, number)?;
            if constants.insert(name.clone(), value).is_some() {
                return Err(AssemblerError::BadArgument {
                    line: number,
                    message: format!("constant `{}` redefined", name),
                });
            }
        } else if section == Section::Data {
            if !is_data_declaration(text) {
                return Err(AssemblerError::BadArgument {
                    line: number,
                    message: format!("expected a data declaration, got `{}`", text),
                });
            }
            let decl = parse_declaration(text, number)?;
            bind_label(&mut labels, decl.name.clone(), data_cursor, number)?;
            let len = decl.bytes.len() as u32;
            data.push((data_cursor, decl.bytes));
            data_cursor += align_word(len);
        } else {
            parse_code_line(line, &mut items, &mut syscall_numbers)?;
        }
    }

    // Pass 1b: fix the code start, then bind code labels and syscalls.
    let ram_load = map.in_ram(base_address);
    let code_start = if ram_load && saw_data_section {
        data_cursor + 16
    } else {
        base_address
    };

    let mut address = code_start;
    let mut syscall_decls: Vec<(u32, String)> = Vec::new();
    for item in &items {
        match item {
            CodeItem::Label { line, name } => {
                bind_label(&mut labels, name.clone(), address, *line)?;
            }
            CodeItem::Syscall { line, number, name } => {
                bind_label(&mut labels, name.clone(), address, *line)?;
                syscall_decls.push((*number, name.clone()));
            }
            CodeItem::Instr { opcode, .. } => {
                address += opcode.word_count() as Address * 4;
            }
        }
    }

    // Pass 2: resolve arguments and encode.
    let mut code: Vec<(Address, Vec<Word>)> = Vec::new();
    let mut address = code_start;
    for item in &items {
        if let CodeItem::Instr { line, opcode, args } = item {
            let operands = split_args(args)
                .into_iter()
                .map(|tok| resolve_token(tok, &labels, &constants, *line))
                .collect::<Result<Vec<_>>>()?;
            let instr = Instruction::build(*opcode, &operands)
                .map_err(|source| AssemblerError::Encoding { line: *line, source })?;
            let encoded = instr.encode();
            code.push((address, encoded.as_slice().to_vec()));
            address += encoded.word_count() as Address * 4;
        }
    }

    // Syscall labels were bound above, so resolution cannot miss.
    let syscalls = syscall_decls
        .into_iter()
        .map(|(number, name)| (number, labels[&name]))
        .collect();

    let entry_point = ram_load.then(|| labels.get("main").copied().unwrap_or(code_start));

    Ok(ProgramImage {
        base_address,
        code_start,
        entry_point,
        data,
        code,
        syscalls,
        labels,
    })
}

/// Write an image into memory and apply its entry point.
pub fn load(image: &ProgramImage, cpu: &mut Cpu) -> Result<()> {
    for (base, bytes) in &image.data {
        for (i, byte) in bytes.iter().enumerate() {
            cpu.bus_mut().load_byte(base + i as Address, *byte)?;
        }
    }
    for (base, words) in &image.code {
        for (i, word) in words.iter().enumerate() {
            cpu.bus_mut().load_word(base + i as Address * 4, *word)?;
        }
    }
    let table = cpu.memory_map().syscall_table_base;
    for (number, target) in &image.syscalls {
        cpu.bus_mut().load_word(table + number * 4, *target)?;
    }
    if let Some(entry) = image.entry_point {
        cpu.jump(entry);
    }
    Ok(())
}

/// Assemble and immediately load, the way boot ROM and user programs arrive.
pub fn assemble_and_load(
    cpu: &mut Cpu,
    source: &str,
    base_address: Address,
) -> Result<ProgramImage> {
    let image = assemble(source, base_address, cpu.memory_map())?;
    load(&image, cpu)?;
    Ok(image)
}

/// Parse one code line: an optional label or syscall declaration, then an
/// optional instruction. `loop: SUB r1, r2` is one line carrying both.
fn parse_code_line(
    line: &SourceLine,
    items: &mut Vec<CodeItem>,
    syscall_numbers: &mut Vec<u32>,
) -> Result<()> {
    let number = line.number;
    let mut rest = line.text.trim();

    let head = rest.split_whitespace().next().unwrap_or("");
    if head.eq_ignore_ascii_case("syscall") {
        // A declaration has a trailing colon; a bare SYSCALL instruction
        // falls through.
        if let Some((decl, after)) = rest.split_once(':') {
            items.push(parse_syscall_declaration(decl, number, syscall_numbers)?);
            rest = after.trim();
        }
    } else if let Some((head, after)) = rest.split_once(':') {
        let name = head.trim();
        if head.contains(char::is_whitespace) || !is_identifier(name) {
            return Err(AssemblerError::BadArgument {
                line: number,
                message: format!("bad label `{}`", name),
            });
        }
        items.push(CodeItem::Label {
            line: number,
            name: name.to_string(),
        });
        rest = after.trim();
    }

    if rest.is_empty() {
        return Ok(());
    }

    let (mnemonic, args) = match rest.split_once(char::is_whitespace) {
        Some((m, a)) => (m, a.trim().to_string()),
        None => (rest, String::new()),
    };
    let opcode =
        Opcode::from_mnemonic(mnemonic).ok_or_else(|| AssemblerError::UnknownInstruction {
            line: number,
            mnemonic: mnemonic.to_string(),
        })?;
    items.push(CodeItem::Instr {
        line: number,
        opcode,
        args,
    });
    Ok(())
}

fn align_word(len: u32) -> u32 {
    (len + 3) & !3
}

fn bind_label(
    labels: &mut HashMap<String, Address>,
    name: String,
    address: Address,
    line: usize,
) -> Result<()> {
    if labels.contains_key(&name) {
        return Err(AssemblerError::DuplicateLabel { line, label: name });
    }
    labels.insert(name, address);
    Ok(())
}

/// `.const NAME VALUE`
fn parse_const(text: &str, line: usize) -> Result<(String, Word)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(AssemblerError::BadArgument {
            line,
            message: format!("expected `.const NAME VALUE`, got `{}`", text),
        });
    }
    let name = tokens[1];
    if !is_identifier(name) {
        return Err(AssemblerError::BadArgument {
            line,
            message: format!("bad constant name `{}`", name),
        });
    }
    let value = parse_numeric(tokens[2], line).unwrap_or_else(|| {
        Err(AssemblerError::BadNumericLiteral {
            line,
            literal: tokens[2].to_string(),
        })
    })?;
    Ok((name.to_string(), literal_to_word(value)))
}

/// The `syscall N LABEL` part of a declaration (the trailing `:` is already
/// stripped by the caller).
fn parse_syscall_declaration(
    decl: &str,
    line: usize,
    seen: &mut Vec<u32>,
) -> Result<CodeItem> {
    let parts: Vec<&str> = decl.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(AssemblerError::BadArgument {
            line,
            message: "expected `syscall NUMBER LABEL:`".to_string(),
        });
    }
    let number: u32 = parse_numeric(parts[1], line)
        .unwrap_or_else(|| {
            Err(AssemblerError::BadNumericLiteral {
                line,
                literal: parts[1].to_string(),
            })
        })?
        .try_into()
        .map_err(|_| AssemblerError::BadNumericLiteral {
            line,
            literal: parts[1].to_string(),
        })?;
    if number >= MemoryMap::SYSCALL_SLOTS {
        return Err(AssemblerError::BadArgument {
            line,
            message: format!("syscall number {} exceeds the 64-slot table", number),
        });
    }
    if seen.contains(&number) {
        return Err(AssemblerError::DuplicateSyscall { line, number });
    }
    seen.push(number);

    let name = parts[2].to_string();
    if !is_identifier(&name) {
        return Err(AssemblerError::BadArgument {
            line,
            message: format!("bad syscall label `{}`", name),
        });
    }
    Ok(CodeItem::Syscall { line, number, name })
}

/// Resolve one argument token: register, label, constant, or literal.
fn resolve_token(
    token: &str,
    labels: &HashMap<String, Address>,
    constants: &HashMap<String, Word>,
    line: usize,
) -> Result<Operand> {
    if let Some(reg) = parse_register(token) {
        return Ok(Operand::Reg(reg));
    }
    if let Some(addr) = labels.get(token) {
        return Ok(Operand::Imm(*addr));
    }
    if let Some(value) = constants.get(token) {
        return Ok(Operand::Imm(*value));
    }
    match parse_numeric(token, line) {
        Some(value) => Ok(Operand::Imm(literal_to_word(value?))),
        None => Err(AssemblerError::BadArgument {
            line,
            message: format!("unresolvable argument `{}`", token),
        }),
    }
}
