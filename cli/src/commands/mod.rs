//! CLI command definitions and dispatch.

mod build;
mod version;

use clap::{Parser, Subcommand};

/// noob: turn a build file into a build graph and run it on a remote engine.
#[derive(Parser)]
#[command(name = "noob", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Build from a noobfile on the remote engine
    Build(build::BuildArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build(args) => build::execute(args).await,
        Command::Version(args) => version::execute(args).await,
    }
}
