//! Folds an ordered list of operations into a build state chain.

use noob_core::error::{NoobError, Result};

use super::directive::Operation;
use super::state::{BuildState, LocalSource};

/// Applies operations, in order, on top of a base image.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    base_image: String,
    local: LocalSource,
}

impl GraphBuilder {
    pub fn new(base_image: impl Into<String>, local: LocalSource) -> Self {
        Self {
            base_image: base_image.into(),
            local,
        }
    }

    /// Build the final state.
    ///
    /// An empty base image or operation list is rejected before any state
    /// is created.
    pub fn build(&self, operations: &[Operation]) -> Result<BuildState> {
        if self.base_image.trim().is_empty() {
            return Err(NoobError::ConfigError("no image specified".to_string()));
        }
        if operations.is_empty() {
            return Err(NoobError::ConfigError(
                "file does not contain a list of commands".to_string(),
            ));
        }

        let total = operations.len();
        let mut state = BuildState::image(self.base_image.as_str());

        for (idx, operation) in operations.iter().enumerate() {
            tracing::debug!(
                step = idx + 1,
                total,
                directive = operation.keyword(),
                %operation,
                "Applying operation"
            );
            state = self.apply(&state, operation)?;
        }

        Ok(state)
    }

    /// Apply a single operation to `state`.
    pub fn apply(&self, state: &BuildState, operation: &Operation) -> Result<BuildState> {
        match operation {
            Operation::SetEnv { key, value } => Ok(state.add_env(key.as_str(), value.as_str())),
            Operation::Copy { source, dest } => {
                Ok(state.copy(&self.local, source.as_str(), dest.as_str()))
            }
            Operation::Execute { command_line } => {
                let args = split_command_line(command_line)?;
                Ok(state.run(args))
            }
        }
    }
}

/// Lex a command line with POSIX shell quoting rules.
fn split_command_line(command_line: &str) -> Result<Vec<String>> {
    let args = shell_words::split(command_line).map_err(|e| {
        NoobError::invalid_argument("execute", format!("{}: {}", e, command_line))
    })?;
    if args.is_empty() {
        return Err(NoobError::invalid_argument("execute", "requires a command"));
    }
    Ok(args)
}
