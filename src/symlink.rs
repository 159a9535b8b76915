//! Publishing downloaded binaries into the system bin directory.

use anyhow::Result;

use crate::command_runner::{CommandRunner, ensure_success};
use crate::paths::Layout;

/// Force-creates symlinks from downloaded binaries into `/usr/local/bin`.
///
/// Linking requires elevated privilege, so the link is created through
/// `sudo ln -sf` rather than a direct syscall. A failure is fatal; links
/// created earlier in the same run are left as-is (no rollback).
pub struct SymlinkInstaller<'a, R: CommandRunner> {
    runner: &'a R,
    layout: &'a Layout,
}

impl<'a, R: CommandRunner> SymlinkInstaller<'a, R> {
    pub fn new(runner: &'a R, layout: &'a Layout) -> Self {
        Self { runner, layout }
    }

    /// Link `/usr/local/bin/<name>` to the downloaded binary of that name.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the captured stderr when `ln` exits
    /// non-zero.
    pub async fn install(&self, name: &str) -> Result<()> {
        let source = self.layout.binary(name);
        let target = Layout::system_link(name);
        let source_arg = source.to_string_lossy();
        let target_arg = target.to_string_lossy();

        let output = self
            .runner
            .run("sudo", &["ln", "-sf", &source_arg, &target_arg])
            .await?;
        ensure_success(&output, &format!("create symlink {}", target.display()))
    }
}
