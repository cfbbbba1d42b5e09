//! Directive parser.
//!
//! Turns one build-file line such as `env FOO=bar` into a typed
//! [`Operation`]. Supported keywords: `env`, `cp`, `execute`.

use noob_core::error::{NoobError, Result};

/// A single build operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `env <key>=<value>`
    SetEnv { key: String, value: String },
    /// `cp <source> <dest>` (source is relative to the build context)
    Copy { source: String, dest: String },
    /// `execute <command line>` (lexed later by the graph builder)
    Execute { command_line: String },
}

impl Operation {
    /// Directive keyword for this operation.
    pub fn keyword(&self) -> &'static str {
        match self {
            Operation::SetEnv { .. } => "env",
            Operation::Copy { .. } => "cp",
            Operation::Execute { .. } => "execute",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::SetEnv { key, value } => write!(f, "env {}={}", key, value),
            Operation::Copy { source, dest } => write!(f, "cp {} {}", source, dest),
            Operation::Execute { command_line } => write!(f, "execute {}", command_line),
        }
    }
}

/// Parse a single directive line.
pub fn parse_directive(line: &str) -> Result<Operation> {
    let (keyword, rest) = split_first_word(line);

    match keyword {
        "env" => parse_env(rest),
        "cp" => parse_cp(rest),
        "execute" => parse_execute(rest),
        _ => Err(NoobError::UnknownDirective {
            keyword: keyword.to_string(),
        }),
    }
}

/// Parse every directive, stopping at the first failure.
///
/// Errors carry the 1-based position of the offending directive.
pub fn parse_directives(lines: &[String]) -> Result<Vec<Operation>> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            parse_directive(line).map_err(|e| match e {
                NoobError::InvalidArgument { directive, message } => NoobError::InvalidArgument {
                    directive,
                    message: format!("command {}: {}", idx + 1, message),
                },
                other => other,
            })
        })
        .collect()
}

/// Split a string into the first word and the rest.
fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}

// --- Individual directive parsers ---

fn parse_env(rest: &str) -> Result<Operation> {
    let (key, value) = rest.split_once('=').ok_or_else(|| {
        NoobError::invalid_argument("env", format!("expected KEY=VALUE, got '{}'", rest))
    })?;

    if key.is_empty() {
        return Err(NoobError::invalid_argument(
            "env",
            format!("empty variable name in '{}'", rest),
        ));
    }

    Ok(Operation::SetEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_cp(rest: &str) -> Result<Operation> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        [source, dest] => Ok(Operation::Copy {
            source: source.to_string(),
            dest: dest.to_string(),
        }),
        _ => Err(NoobError::invalid_argument(
            "cp",
            format!(
                "expected a source and a destination, got {} argument(s)",
                parts.len()
            ),
        )),
    }
}

fn parse_execute(rest: &str) -> Result<Operation> {
    if rest.is_empty() {
        return Err(NoobError::invalid_argument("execute", "requires a command"));
    }
    Ok(Operation::Execute {
        command_line: rest.to_string(),
    })
}
