//! Pushing the agent binary to a remote worker over secure copy.

use std::path::Path;

use anyhow::Result;

use crate::command_runner::{CommandRunner, ensure_success};

/// Copies a downloaded binary to a worker host with `scp`.
pub struct WorkerTransfer<'a, R: CommandRunner> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> WorkerTransfer<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Copy `binary` into `worker`'s home directory.
    ///
    /// When a password is supplied, the copy is wrapped in `sshpass` so the
    /// transfer runs unattended.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the captured stderr when the copy exits
    /// non-zero.
    pub async fn push(&self, binary: &Path, worker: &str, password: Option<&str>) -> Result<()> {
        let src = binary.to_string_lossy();
        let dest = format!("{worker}:~/");

        let output = match password {
            Some(pass) => {
                self.runner
                    .run(
                        "sshpass",
                        &[
                            "-p",
                            pass,
                            "scp",
                            "-o",
                            "StrictHostKeyChecking=no",
                            &src,
                            &dest,
                        ],
                    )
                    .await?
            }
            None => {
                self.runner
                    .run("scp", &["-o", "StrictHostKeyChecking=no", &src, &dest])
                    .await?
            }
        };
        ensure_success(&output, &format!("secure copy to {worker}"))
    }
}
