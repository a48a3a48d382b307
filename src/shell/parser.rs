//! Line parser for the scripting host
//!
//! One line is one code unit; `;` separates statements inside a unit.

use crate::graph::EntityId;
use crate::hook::{AssignTarget, CodeUnit};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)$").expect("valid regex")
});
static SUBSCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\[.*\]$").expect("valid regex"));
static ENTITY_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#(\d+)$").expect("valid regex"));
static CONSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)$").expect("valid regex")
});
static LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(.*)\]$").expect("valid regex"));
static LOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^load\s+"([^"]*)"$"#).expect("valid regex"));
static LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(-?\d+(\.\d+)?|"[^"]*"|true|false)$"#).expect("valid regex")
});
static EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^export\s+"([^"]*)"$"#).expect("valid regex"));
static ACTIVATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^activate(?:\s+ignore\s+(.+))?$").expect("valid regex"));
static LIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^live\s+(on|off)$").expect("valid regex"));
static SHOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^show\s+([A-Za-z_][A-Za-z0-9_]*)$").expect("valid regex")
});

/// Reference to an entity inside an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Name(String),
    Id(EntityId),
}

/// Right-hand side of an assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Fresh empty document
    New,
    /// Document read from a JSON file
    Load(PathBuf),
    /// New entity of the given kind
    Create { kind: String, references: Vec<Operand> },
    /// Existing entity, by name or by id
    Operand(Operand),
    /// List of entity operands, only valid for `.refs`
    List(Vec<Operand>),
    None,
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Activate { ignore: Vec<Operand> },
    Export(PathBuf),
    Live(bool),
    Show(String),
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Assign { target: AssignTarget, values: Vec<Expr> },
    Command(Command),
}

/// Parse one line into statements plus the code unit seen by the detector
pub fn parse_line(line: &str) -> Result<(Vec<Statement>, CodeUnit), String> {
    let mut statements = Vec::new();
    let mut unit = CodeUnit::new();

    for source in split_statements(line) {
        let statement = parse_statement(source)?;
        if let Statement::Assign { target, .. } = &statement {
            unit.targets.push(target.clone());
        }
        statements.push(statement);
    }
    Ok((statements, unit))
}

/// Split on `;` outside of string literals
fn split_statements(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            ';' if !in_string => {
                parts.push(line[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(line[start..].trim());
    parts.into_iter().filter(|part| !part.is_empty()).collect()
}

fn parse_statement(source: &str) -> Result<Statement, String> {
    if let Some(command) = parse_command(source)? {
        return Ok(Statement::Command(command));
    }

    let (lhs, rhs) = split_assignment(source)
        .ok_or_else(|| format!("expected an assignment or a command, found `{}`", source))?;
    let target = parse_target(lhs)?;
    let values = match &target {
        AssignTarget::Destructure(_) => split_top_level(rhs)
            .into_iter()
            .map(parse_expr)
            .collect::<Result<Vec<_>, _>>()?,
        _ => vec![parse_expr(rhs)?],
    };
    Ok(Statement::Assign { target, values })
}

fn parse_command(source: &str) -> Result<Option<Command>, String> {
    if source == "stats" {
        return Ok(Some(Command::Stats));
    }
    if let Some(caps) = EXPORT.captures(source) {
        return Ok(Some(Command::Export(PathBuf::from(&caps[1]))));
    }
    if let Some(caps) = LIVE.captures(source) {
        return Ok(Some(Command::Live(&caps[1] == "on")));
    }
    if let Some(caps) = SHOW.captures(source) {
        return Ok(Some(Command::Show(caps[1].to_string())));
    }
    if let Some(caps) = ACTIVATE.captures(source) {
        let ignore = match caps.get(1) {
            Some(list) => list
                .as_str()
                .split_whitespace()
                .map(parse_operand)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        return Ok(Some(Command::Activate { ignore }));
    }
    Ok(None)
}

/// Split at the first `=` outside string literals that is not part of `==`
fn split_assignment(source: &str) -> Option<(&str, &str)> {
    let mut in_string = false;
    let bytes = source.as_bytes();
    for (i, c) in source.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '=' if !in_string => {
                if bytes.get(i + 1) == Some(&b'=') || i == 0 {
                    return None;
                }
                return Some((source[..i].trim(), source[i + 1..].trim()));
            }
            _ => {}
        }
    }
    None
}

fn parse_target(lhs: &str) -> Result<AssignTarget, String> {
    if NAME.is_match(lhs) {
        return Ok(AssignTarget::Name(lhs.to_string()));
    }
    if let Some(caps) = ATTRIBUTE.captures(lhs) {
        return Ok(AssignTarget::Attribute {
            object: caps[1].to_string(),
            attribute: caps[2].to_string(),
        });
    }
    if let Some(caps) = SUBSCRIPT.captures(lhs) {
        return Ok(AssignTarget::Subscript {
            object: caps[1].to_string(),
        });
    }
    if lhs.contains(',') {
        let names: Vec<String> = lhs.split(',').map(|n| n.trim().to_string()).collect();
        if names.iter().all(|n| NAME.is_match(n)) {
            return Ok(AssignTarget::Destructure(names));
        }
    }
    Err(format!("invalid assignment target `{}`", lhs))
}

fn parse_expr(source: &str) -> Result<Expr, String> {
    let source = source.trim();
    match source {
        "" => return Err("missing value".to_string()),
        "new" => return Ok(Expr::New),
        "none" => return Ok(Expr::None),
        _ => {}
    }
    if let Some(caps) = LOAD.captures(source) {
        return Ok(Expr::Load(PathBuf::from(&caps[1])));
    }
    if LITERAL.is_match(source) {
        return Ok(Expr::Literal(source.to_string()));
    }
    if let Some(caps) = CONSTRUCTOR.captures(source) {
        return Ok(Expr::Create {
            kind: caps[1].to_string(),
            references: parse_operands(&caps[2])?,
        });
    }
    if let Some(caps) = LIST.captures(source) {
        return Ok(Expr::List(parse_operands(&caps[1])?));
    }
    parse_operand(source).map(Expr::Operand)
}

fn parse_operands(list: &str) -> Result<Vec<Operand>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_operand)
        .collect()
}

fn parse_operand(source: &str) -> Result<Operand, String> {
    if let Some(caps) = ENTITY_ID.captures(source) {
        let id: u64 = caps[1]
            .parse()
            .map_err(|_| format!("entity id out of range: `{}`", source))?;
        return Ok(Operand::Id(EntityId(id)));
    }
    if NAME.is_match(source) {
        return Ok(Operand::Name(source.to_string()));
    }
    Err(format!("expected a name or #id, found `{}`", source))
}

/// Split on commas that are not nested in parentheses, brackets or strings
fn split_top_level(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (i, c) in source.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                parts.push(source[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(source[start..].trim());
    parts
}
