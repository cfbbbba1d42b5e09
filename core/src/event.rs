//! Build progress events and the bounded channel that carries them.
//!
//! The engine connection is the only producer and the status consumer the
//! only reader. End of stream is signalled by closing the channel: once the
//! producer drops its [`StatusSender`], [`StatusReceiver::recv`] yields
//! `None`. There is no in-band end marker.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Output stream a log chunk was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    /// Map the engine's numeric stream id (1 = stdout, 2 = stderr).
    pub fn from_fd(fd: i64) -> Self {
        if fd == 2 {
            LogStream::Stderr
        } else {
            LogStream::Stdout
        }
    }
}

/// A single progress event reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Raw output produced by a vertex
    LogChunk {
        vertex: String,
        stream: LogStream,
        data: Vec<u8>,
    },
    /// A vertex was started, completed, or changed state
    VertexUpdate {
        digest: String,
        name: String,
        cached: bool,
        completed: bool,
        error: Option<String>,
    },
}

impl StatusEvent {
    /// Log chunk on stdout for the given vertex.
    pub fn log(vertex: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        StatusEvent::LogChunk {
            vertex: vertex.into(),
            stream: LogStream::Stdout,
            data: data.into(),
        }
    }

    /// In-progress vertex update carrying only a name.
    pub fn vertex(name: impl Into<String>) -> Self {
        StatusEvent::VertexUpdate {
            digest: String::new(),
            name: name.into(),
            cached: false,
            completed: false,
            error: None,
        }
    }
}

/// Sending half of the status channel.
pub type StatusSender = mpsc::Sender<StatusEvent>;

/// Receiving half of the status channel.
pub type StatusReceiver = mpsc::Receiver<StatusEvent>;

/// Create a bounded status channel.
///
/// A zero capacity is bumped to one, since tokio rejects empty buffers.
pub fn status_channel(capacity: usize) -> (StatusSender, StatusReceiver) {
    mpsc::channel(capacity.max(1))
}
