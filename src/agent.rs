//! Detached agent launch with output redirected to a log file.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Spawn `agent_path` as a detached background process.
///
/// The log file is opened in create/truncate mode and receives both stdout
/// and stderr. The parent never waits on the child; once spawned, the agent
/// is fully decoupled — no supervision, restart, or health checks.
///
/// Returns the child's process ID.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or the agent binary
/// fails to spawn.
pub fn launch(agent_path: &Path, log_path: &Path) -> Result<u32> {
    let log = std::fs::File::create(log_path)
        .with_context(|| format!("create log file {}", log_path.display()))?;
    let log_err = log
        .try_clone()
        .context("duplicate log file handle for stderr")?;

    let child = detached_command(agent_path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .with_context(|| format!("agent startup failed: {}", agent_path.display()))?;

    Ok(child.id())
}

/// New process group, so the agent survives the parent's exit and is not
/// reached by terminal signals sent to the bootstrap.
#[cfg(unix)]
fn detached_command(path: &Path) -> Command {
    use std::os::unix::process::CommandExt;
    let mut cmd = Command::new(path);
    cmd.process_group(0);
    cmd
}

/// Detached, windowless process on Windows.
#[cfg(windows)]
fn detached_command(path: &Path) -> Command {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    let mut cmd = Command::new(path);
    cmd.creation_flags(CREATE_NO_WINDOW | DETACHED_PROCESS);
    cmd
}
