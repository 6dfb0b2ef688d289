//! Project scaffolding.
//!
//! Thin glue over the official generators: composer and the Angular CLI do
//! the heavy lifting, then each tree is patched with the starter templates
//! that wire the two halves together (CORS, API routes, environments and a
//! welcome dashboard).

mod backend;
mod frontend;

pub use backend::setup_backend;
pub use frontend::setup_frontend;

use std::path::Path;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

/// Run an external generator with inherited stdio; non-zero exit aborts
/// the scaffold.
pub(crate) async fn run_step(
    description: &str,
    cwd: Option<&Path>,
    command: &str,
    args: &[&str],
) -> Result<()> {
    debug!(command, ?args, "running scaffold step");
    let mut cmd = Command::new(command);
    cmd.args(args);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    let status = cmd
        .status()
        .await
        .with_context(|| format!("could not run `{command}`"))?;
    if !status.success() {
        bail!("{description} failed ({status})");
    }
    Ok(())
}

/// Run a follow-up command silently; the caller decides whether a failure
/// is worth a warning.
pub(crate) async fn run_quiet(cwd: &Path, command: &str, args: &[&str]) -> Result<bool> {
    debug!(command, ?args, "running quiet scaffold step");
    let status = Command::new(command)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .with_context(|| format!("could not run `{command}`"))?;
    Ok(status.success())
}
