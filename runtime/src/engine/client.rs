//! gRPC client for the remote build engine.
//!
//! One [`EngineClient::solve`] call makes two concurrent RPCs against the
//! same build ref: a unary `Solve` that blocks until the build finishes and
//! a server-streaming `Status` whose messages are forwarded into the status
//! channel. The forwarder task owns the only sender and drops it when the
//! status stream ends, which closes the channel. Once `Solve` has answered,
//! the stream gets `status_drain_ms` to finish before the forwarder is
//! aborted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use noob_core::config::EngineConfig;
use noob_core::error::{NoobError, Result};
use noob_core::event::{LogStream, StatusEvent, StatusSender};
use tonic::transport::Endpoint;

use super::proto::{ControlClient, Definition, SolveRequest, StatusRequest, StatusResponse};
use super::{Engine, SolveSummary};
use crate::build::GraphDefinition;

/// Client connected to a remote build engine.
#[derive(Debug, Clone)]
pub struct EngineClient {
    address: String,
    control: ControlClient,
    status_drain: Duration,
}

impl EngineClient {
    /// Connect to the engine at `config.address`.
    ///
    /// A single attempt is made; failure is a [`NoobError::ConnectionError`].
    pub async fn connect(config: &EngineConfig) -> Result<Self> {
        let uri = endpoint_uri(&config.address)?;
        let endpoint = Endpoint::from_shared(uri).map_err(|e| NoobError::ConnectionError {
            address: config.address.clone(),
            message: e.to_string(),
        })?;

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| NoobError::ConnectionError {
                address: config.address.clone(),
                message: connect_error_message(&e),
            })?;

        tracing::info!(address = %config.address, "Connected to build engine");

        Ok(Self {
            address: config.address.clone(),
            control: ControlClient::new(channel),
            status_drain: Duration::from_millis(config.status_drain_ms),
        })
    }
}

#[async_trait]
impl Engine for EngineClient {
    async fn solve(
        &self,
        definition: GraphDefinition,
        local_dirs: HashMap<String, PathBuf>,
        status: StatusSender,
    ) -> Result<SolveSummary> {
        let build_ref = uuid::Uuid::new_v4().to_string();

        let mut status_client = self.control.clone();
        let status_ref = build_ref.clone();
        let mut forwarder = tokio::spawn(async move {
            forward_status(&mut status_client, status_ref, status).await;
        });

        let request = SolveRequest {
            r#ref: build_ref.clone(),
            definition: Some(Definition {
                def: definition.def,
            }),
            local_dirs: local_dirs
                .into_iter()
                .map(|(name, path)| (name, path.to_string_lossy().into_owned()))
                .collect(),
        };

        tracing::info!(build_ref = %build_ref, address = %self.address, "Submitting build");
        let mut control = self.control.clone();
        let result = control.solve(request).await;

        // Events already in flight are delivered before the outcome is
        // returned; a stream the engine leaves open is cut off
        match tokio::time::timeout(self.status_drain, &mut forwarder).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Status forwarder task failed"),
            Err(_) => {
                tracing::debug!(build_ref = %build_ref, "Status stream still open after solve, closing it");
                forwarder.abort();
                // Dropping the task drops the sender, which closes the channel
                let _ = forwarder.await;
            }
        }

        match result {
            Ok(response) => Ok(SolveSummary {
                build_ref,
                exporter_response: response.into_inner().exporter_response,
            }),
            Err(status) => Err(map_status(&self.address, status)),
        }
    }
}

/// Drain the `Status` stream into `sender`. Dropping `sender` on return
/// closes the channel.
async fn forward_status(client: &mut ControlClient, build_ref: String, sender: StatusSender) {
    let mut stream = match client.status(StatusRequest { r#ref: build_ref }).await {
        Ok(response) => response.into_inner(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to open status stream");
            return;
        }
    };

    while let Some(item) = stream.next().await {
        let response = match item {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Status stream ended with error");
                return;
            }
        };
        for event in status_events(response) {
            if sender.send(event).await.is_err() {
                tracing::debug!("Status receiver dropped, stopping forwarder");
                return;
            }
        }
    }
}

/// Flatten one status message: log chunks first, then vertices.
pub(crate) fn status_events(response: StatusResponse) -> Vec<StatusEvent> {
    let logs = response.logs.into_iter().map(|log| StatusEvent::LogChunk {
        vertex: log.vertex,
        stream: LogStream::from_fd(log.stream),
        data: log.msg,
    });
    let vertexes = response
        .vertexes
        .into_iter()
        .map(|v| StatusEvent::VertexUpdate {
            digest: v.digest,
            name: v.name,
            cached: v.cached,
            completed: v.completed,
            error: if v.error.is_empty() { None } else { Some(v.error) },
        });
    logs.chain(vertexes).collect()
}

/// Turn a configured address into a URI tonic can dial.
///
/// `tcp://` and bare `host:port` map to plaintext HTTP/2.
pub(crate) fn endpoint_uri(address: &str) -> Result<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(NoobError::ConfigError(
            "engine address is empty".to_string(),
        ));
    }

    if let Some(rest) = address.strip_prefix("tcp://") {
        return Ok(format!("http://{}", rest));
    }
    if address.starts_with("http://") {
        return Ok(address.to_string());
    }
    if let Some((scheme, _)) = address.split_once("://") {
        return Err(NoobError::ConfigError(format!(
            "unsupported engine address scheme '{}' in {}",
            scheme, address
        )));
    }
    Ok(format!("http://{}", address))
}

fn map_status(address: &str, status: tonic::Status) -> NoobError {
    match status.code() {
        tonic::Code::Unavailable => NoobError::ConnectionError {
            address: address.to_string(),
            message: status.message().to_string(),
        },
        _ => NoobError::RemoteExecutionError(status.message().to_string()),
    }
}

/// Include the underlying cause; tonic's top-level message is just
/// "transport error".
fn connect_error_message(err: &tonic::transport::Error) -> String {
    use std::error::Error as _;
    match err.source() {
        Some(source) => format!("{}: {}", err, source),
        None => err.to_string(),
    }
}
