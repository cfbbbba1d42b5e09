//! noob runtime - build graph construction and engine submission.
//!
//! Turns build-file directives into an immutable build state chain,
//! serializes it into a graph definition, and submits that definition to a
//! remote build engine while streaming its progress.

#![allow(clippy::result_large_err)]

pub mod build;
pub mod engine;
pub mod pipeline;
pub mod status;

// Re-export common types
pub use build::{
    parse_directive, parse_directives, BuildState, GraphBuilder, GraphDefinition, LocalSource,
    Operation,
};
pub use engine::{Engine, EngineClient, SolveSummary};
pub use pipeline::{connect_and_run, plan, run, submit};
pub use status::StatusPrinter;

/// noob runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
