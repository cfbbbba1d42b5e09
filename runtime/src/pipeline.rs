//! End-to-end run: build file -> state chain -> definition -> engine.

use std::collections::HashMap;
use std::io::Write;

use noob_core::config::{EngineConfig, Noobfile};
use noob_core::error::{NoobError, Result};
use noob_core::event::status_channel;

use crate::build::{parse_directives, GraphBuilder, GraphDefinition, LocalSource};
use crate::engine::{Engine, EngineClient, SolveSummary};
use crate::status::StatusPrinter;

/// Parse, build, and serialize without contacting an engine.
pub fn plan(file: &Noobfile, local: &LocalSource) -> Result<GraphDefinition> {
    file.validate()?;
    let operations = parse_directives(&file.commands)?;
    let state = GraphBuilder::new(file.with.as_str(), local.clone()).build(&operations)?;
    let definition = GraphDefinition::marshal(&state)?;
    tracing::debug!(
        steps = state.depth(),
        vertices = definition.vertex_count(),
        "Build graph ready"
    );
    Ok(definition)
}

/// Plan a build file and submit it to `engine`, rendering progress with
/// `printer`.
pub async fn run<E, W>(
    file: &Noobfile,
    local: &LocalSource,
    engine: &E,
    status_buffer: usize,
    printer: StatusPrinter<W>,
) -> Result<SolveSummary>
where
    E: Engine + ?Sized,
    W: Write + Send + 'static,
{
    let definition = plan(file, local)?;
    submit(definition, local, engine, status_buffer, printer).await
}

/// Submit an already planned definition to `engine`.
///
/// The status consumer runs concurrently with the blocking submission and
/// is joined before the outcome is reported. `Done!` is written only on
/// success; a consumer that dies turns success into an error.
pub async fn submit<E, W>(
    definition: GraphDefinition,
    local: &LocalSource,
    engine: &E,
    status_buffer: usize,
    printer: StatusPrinter<W>,
) -> Result<SolveSummary>
where
    E: Engine + ?Sized,
    W: Write + Send + 'static,
{
    let local_dirs = HashMap::from([(local.name().to_string(), local.path().to_path_buf())]);
    let (tx, rx) = status_channel(status_buffer);
    let consumer = tokio::spawn(printer.run(rx));

    let result = engine.solve(definition, local_dirs, tx).await;

    let printer = consumer.await.map_err(|e| {
        tracing::warn!(error = %e, "Status consumer task failed");
        NoobError::Other(format!("status consumer failed: {}", e))
    });

    let summary = result?;
    printer?.finish()?;
    Ok(summary)
}

/// Connect to the engine described by `config` and run the build.
///
/// The build graph is completed before connecting, so parse and build
/// errors never touch the network. A connection failure returns before any
/// progress is rendered.
pub async fn connect_and_run<W>(
    file: &Noobfile,
    local: &LocalSource,
    config: &EngineConfig,
    printer: StatusPrinter<W>,
) -> Result<SolveSummary>
where
    W: Write + Send + 'static,
{
    let definition = plan(file, local)?;
    let client = EngineClient::connect(config).await?;
    submit(definition, local, &client, config.status_buffer, printer).await
}
