//! Repository fetching via the system git binary.

use std::path::Path;

use anyhow::{Context, Result};

use crate::command_runner::{CommandRunner, ensure_success};

/// Clones repositories through a [`CommandRunner`], wiping targets first.
///
/// Every clone is idempotent: any prior checkout at the destination is
/// removed before cloning, so re-running produces the same final tree.
pub struct GitFetcher<'a, R: CommandRunner> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> GitFetcher<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Remove `dest` if present and clone `url` into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the old checkout cannot be removed or the clone
    /// exits non-zero; the error carries git's captured stderr.
    pub async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        wipe(dest).await?;
        let dest_arg = dest.to_string_lossy();
        let output = self.runner.run("git", &["clone", url, &dest_arg]).await?;
        ensure_success(&output, &format!("git clone {url}"))
    }

    /// Shallow, branch-pinned clone used for prebuilt toolchains.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::clone_repo`].
    pub async fn clone_shallow(
        &self,
        url: &str,
        branch: &str,
        depth: u32,
        dest: &Path,
    ) -> Result<()> {
        wipe(dest).await?;
        let dest_arg = dest.to_string_lossy();
        let depth_arg = depth.to_string();
        let output = self
            .runner
            .run(
                "git",
                &["clone", url, "-b", branch, "--depth", &depth_arg, &dest_arg],
            )
            .await?;
        ensure_success(&output, &format!("git clone {url}"))
    }
}

/// Remove any prior checkout and make sure the parent directory exists.
/// git creates the destination directory itself.
pub(crate) async fn wipe(dest: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dest).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("removing existing {}", dest.display()));
        }
    }
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}
