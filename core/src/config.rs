use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{NoobError, Result};

/// Default address of the build engine.
pub const DEFAULT_ENGINE_ADDRESS: &str = "tcp://127.0.0.1:7000";

/// Logical name under which the build context directory is exposed to `cp`.
pub const DEFAULT_LOCAL_NAME: &str = "local-pwd";

/// Default capacity of the status event channel.
pub const DEFAULT_STATUS_BUFFER: usize = 100;

/// How long the status stream may keep draining once a solve has returned.
pub const DEFAULT_STATUS_DRAIN_MS: u64 = 3000;

/// Environment variable that overrides the engine address.
pub const ENGINE_ADDRESS_ENV: &str = "NOOB_ENGINE_ADDR";

/// Build file contents: a base image plus an ordered list of directives.
///
/// ```yaml
/// with: alpine
/// commands:
///   - env FOO=bar
///   - execute echo hi
///   - cp src.txt /dst.txt
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Noobfile {
    /// Base image reference
    #[serde(default)]
    pub with: String,

    /// Directives, applied in order
    #[serde(default)]
    pub commands: Vec<String>,
}

impl Noobfile {
    /// Parse a build file from YAML text.
    pub fn parse(content: &str) -> Result<Self> {
        let file: Noobfile = serde_yaml::from_str(content)?;
        Ok(file)
    }

    /// Load a build file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NoobError::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open command file {}: {}", path.display(), e),
            ))
        })?;
        let file = Self::parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            image = %file.with,
            commands = file.commands.len(),
            "Loaded build file"
        );
        Ok(file)
    }

    /// Reject files that cannot describe a build.
    pub fn validate(&self) -> Result<()> {
        if self.with.trim().is_empty() {
            return Err(NoobError::ConfigError("no image specified".to_string()));
        }
        if self.commands.is_empty() {
            return Err(NoobError::ConfigError(
                "file does not contain a list of commands".to_string(),
            ));
        }
        Ok(())
    }
}

/// Engine connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine address (`tcp://host:port` or `http://host:port`)
    pub address: String,

    /// Logical name the build context is bound to
    pub local_name: String,

    /// Capacity of the status event channel
    pub status_buffer: usize,

    /// Grace period, in milliseconds, for status events still in flight
    /// after the engine has answered the solve
    pub status_drain_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ENGINE_ADDRESS.to_string(),
            local_name: DEFAULT_LOCAL_NAME.to_string(),
            status_buffer: DEFAULT_STATUS_BUFFER,
            status_drain_ms: DEFAULT_STATUS_DRAIN_MS,
        }
    }
}

impl EngineConfig {
    /// Defaults, with the address taken from `NOOB_ENGINE_ADDR` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(address) = std::env::var(ENGINE_ADDRESS_ENV) {
            if !address.trim().is_empty() {
                config.address = address;
            }
        }
        config
    }

    /// Replace the engine address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noobfile_parse() {
        let yaml = "with: alpine\ncommands:\n  - env FOO=bar\n  - execute echo hi\n";
        let file = Noobfile::parse(yaml).unwrap();
        assert_eq!(file.with, "alpine");
        assert_eq!(file.commands, vec!["env FOO=bar", "execute echo hi"]);
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_noobfile_parse_malformed() {
        let err = Noobfile::parse("with: [unclosed").unwrap_err();
        assert!(matches!(err, NoobError::SerializationError(_)));
    }

    #[test]
    fn test_noobfile_missing_image() {
        let file = Noobfile::parse("commands:\n  - execute ls\n").unwrap();
        let err = file.validate().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: no image specified");
    }

    #[test]
    fn test_noobfile_missing_commands() {
        let file = Noobfile::parse("with: alpine\n").unwrap();
        let err = file.validate().unwrap_err();
        assert!(matches!(err, NoobError::ConfigError(_)));
        assert!(err.to_string().contains("list of commands"));
    }

    #[test]
    fn test_noobfile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noobfile.yaml");
        std::fs::write(&path, "with: busybox\ncommands:\n  - cp a b\n").unwrap();

        let file = Noobfile::from_file(&path).unwrap();
        assert_eq!(file.with, "busybox");
        assert_eq!(file.commands.len(), 1);
    }

    #[test]
    fn test_noobfile_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Noobfile::from_file(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, NoobError::IoError(_)));
        assert!(err.to_string().contains("failed to open command file"));
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.address, "tcp://127.0.0.1:7000");
        assert_eq!(config.local_name, "local-pwd");
        assert_eq!(config.status_buffer, 100);
        assert_eq!(config.status_drain_ms, 3000);
    }

    #[test]
    fn test_engine_config_with_address() {
        let config = EngineConfig::default().with_address("http://10.0.0.2:1234");
        assert_eq!(config.address, "http://10.0.0.2:1234");
        assert_eq!(config.local_name, DEFAULT_LOCAL_NAME);
    }
}
