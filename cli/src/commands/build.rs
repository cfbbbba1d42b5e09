//! `noob build` command: build from a noobfile on the remote engine.
//!
//! Loads the build file, turns its directives into a build graph, and
//! submits the graph with the context directory bound as `local-pwd`.

use std::path::{Path, PathBuf};

use clap::Args;
use crossterm::tty::IsTty;
use noob_core::{EngineConfig, Noobfile};
use noob_runtime::{LocalSource, StatusPrinter};

#[derive(Args)]
pub struct BuildArgs {
    /// Path to the build file
    #[arg(short = 'f', long = "file", default_value = "noobfile.yaml")]
    pub file: PathBuf,

    /// Engine address (default: $NOOB_ENGINE_ADDR or tcp://127.0.0.1:7000)
    #[arg(long = "addr")]
    pub addr: Option<String>,

    /// Directory exposed to `cp` directives (default: current directory)
    #[arg(long = "context")]
    pub context: Option<PathBuf>,

    /// Print the build graph as JSON instead of submitting it
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn execute(args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let file = Noobfile::from_file(&args.file)?;

    let mut config = EngineConfig::from_env();
    if let Some(addr) = &args.addr {
        config = config.with_address(addr.as_str());
    }

    let local = resolve_context(args.context.as_deref(), &config.local_name)?;

    if args.dry_run {
        let definition = noob_runtime::plan(&file, &local)?;
        println!("{}", definition.to_json_pretty()?);
        return Ok(());
    }

    let color = std::io::stdout().is_tty();
    let printer = StatusPrinter::new(std::io::stdout()).with_color(color);
    let summary = noob_runtime::connect_and_run(&file, &local, &config, printer).await?;
    tracing::debug!(build_ref = %summary.build_ref, "Build finished");

    Ok(())
}

/// Bind the context directory (or the working directory) to `name`.
fn resolve_context(
    context: Option<&Path>,
    name: &str,
) -> Result<LocalSource, Box<dyn std::error::Error>> {
    let Some(dir) = context else {
        return Ok(LocalSource::from_current_dir(name)?);
    };

    let dir = dir
        .canonicalize()
        .map_err(|e| format!("Invalid build context path '{}': {}", dir.display(), e))?;

    if !dir.is_dir() {
        return Err(format!("Build context '{}' is not a directory", dir.display()).into());
    }

    Ok(LocalSource::new(name, dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_context_default_is_cwd() {
        let local = resolve_context(None, "local-pwd").unwrap();
        assert_eq!(local.name(), "local-pwd");
        assert_eq!(local.path(), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_resolve_context_dir() {
        let dir = tempfile::tempdir().unwrap();
        let local = resolve_context(Some(dir.path()), "ctx").unwrap();
        assert_eq!(local.name(), "ctx");
        assert_eq!(local.path(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_context_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_context(Some(&dir.path().join("nope")), "ctx").is_err());
    }

    #[test]
    fn test_resolve_context_not_a_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let err = resolve_context(Some(&file), "ctx").unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }
}
