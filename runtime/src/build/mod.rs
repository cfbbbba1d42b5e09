//! Build graph construction.
//!
//! Parses build-file directives, folds them into an immutable state chain,
//! and serializes the chain into a graph definition for the engine.
//!
//! # Supported Directives
//!
//! env, cp, execute

pub mod builder;
pub mod definition;
pub mod directive;
pub mod state;

pub use builder::GraphBuilder;
pub use definition::{GraphDefinition, Vertex, VertexOp};
pub use directive::{parse_directive, parse_directives, Operation};
pub use state::{BuildState, LocalSource, StateOp};
