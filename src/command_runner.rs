//! External command execution behind a trait, enabling test doubles.

use std::process::{Output, Stdio};

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

/// Generic command execution with captured output.
///
/// This trait is NOT tied to git — it runs any external command. The
/// production implementation uses tokio; test doubles can return canned
/// results without spawning processes.
///
/// No timeout is applied: clones and copies run to completion or until the
/// underlying tool gives up on its own.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a command to completion, capturing stdout and stderr.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
}

/// Production `CommandRunner` backed by [`tokio::process::Command`].
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        // Drain stdout/stderr CONCURRENTLY with wait(). A child writing more
        // than the OS pipe buffer (64KB on Linux) would otherwise block on
        // write while we block in wait() — deadlock.
        let (status, stdout, stderr) = tokio::join!(
            child.wait(),
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stdout_handle {
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stderr_handle {
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
        );

        Ok(Output {
            status: status.with_context(|| format!("waiting for {program}"))?,
            stdout,
            stderr,
        })
    }
}

/// Convert a non-zero exit into an error carrying the captured stderr text.
///
/// # Errors
///
/// Returns an error when `output.status` is unsuccessful.
pub fn ensure_success(output: &Output, what: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("{what} failed ({}): {}", output.status, stderr.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let output = TokioCommandRunner
            .run("sh", &["-c", "echo hello"])
            .await
            .expect("sh should run");
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_carries_captured_stderr() {
        let output = TokioCommandRunner
            .run("sh", &["-c", "echo boom >&2; exit 3"])
            .await
            .expect("sh should run");
        let err = ensure_success(&output, "sh").expect_err("exit 3 is a failure");
        let msg = err.to_string();
        assert!(msg.contains("boom"), "stderr text missing: {msg}");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = TokioCommandRunner
            .run("definitely-not-a-real-program", &[])
            .await
            .expect_err("spawn must fail");
        assert!(err.to_string().contains("failed to spawn"));
    }
}
