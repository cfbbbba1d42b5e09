//! Remote build engine access.

pub mod client;
pub mod proto;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use noob_core::error::Result;
use noob_core::event::StatusSender;

use crate::build::GraphDefinition;

pub use client::EngineClient;

/// Outcome of a successful submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveSummary {
    /// Build ref the submission was tagged with
    pub build_ref: String,
    /// Exporter metadata returned by the engine
    pub exporter_response: HashMap<String, String>,
}

/// Something that can evaluate a graph definition.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Submit `definition` and block until the engine reports the outcome.
    ///
    /// `local_dirs` maps local-source names to host directories. Progress is
    /// pushed into `status`; implementations must drop the sender once no
    /// further events will be produced, which is how the consumer learns
    /// the stream has ended.
    async fn solve(
        &self,
        definition: GraphDefinition,
        local_dirs: HashMap<String, PathBuf>,
        status: StatusSender,
    ) -> Result<SolveSummary>;
}
