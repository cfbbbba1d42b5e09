//! noob core - foundational types
//!
//! Errors, configuration, and status events shared by the runtime and the
//! CLI.

pub mod config;
pub mod error;
pub mod event;

// Re-export commonly used types
pub use config::{EngineConfig, Noobfile};
pub use error::{NoobError, Result};
pub use event::{status_channel, LogStream, StatusEvent, StatusReceiver, StatusSender};

/// noob version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
