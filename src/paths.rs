//! Path derivation for everything the bootstrap reads or writes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// System directory that published binaries are linked into.
pub const SYSTEM_BIN_DIR: &str = "/usr/local/bin";

/// Expand a leading `~` or `~/` against the user's home directory.
/// A `~` anywhere else in the path is left untouched.
///
/// # Errors
///
/// Returns an error if the path starts with `~` and the home directory
/// cannot be determined.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return home_dir();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return Ok(home_dir()?.join(rest));
    }
    Ok(PathBuf::from(path))
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("cannot determine home directory")
}

/// The on-disk layout produced by a bootstrap run.
#[derive(Debug, Clone)]
pub struct Layout {
    aosp_path: Option<PathBuf>,
    distbuild_path: PathBuf,
}

impl Layout {
    #[must_use]
    pub fn new(aosp_path: Option<PathBuf>, distbuild_path: PathBuf) -> Self {
        Self {
            aosp_path,
            distbuild_path,
        }
    }

    /// Clone target for the distbuild repository: `<aosp>/build/distbuild`.
    ///
    /// # Errors
    ///
    /// Returns an error when no AOSP path was supplied (agent-deploy mode).
    pub fn distbuild_checkout(&self) -> Result<PathBuf> {
        Ok(self.aosp_root()?.join("build").join("distbuild"))
    }

    /// Clone target when only a wrapper repository is configured:
    /// `<aosp>/build/distbuild/boong/wrapper`.
    ///
    /// # Errors
    ///
    /// Returns an error when no AOSP path was supplied.
    pub fn wrapper_checkout(&self) -> Result<PathBuf> {
        Ok(self.distbuild_checkout()?.join("boong").join("wrapper"))
    }

    /// Directory that downloaded binaries land in.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.distbuild_path.join("boong").join("bin")
    }

    /// Path of a downloaded binary by name.
    #[must_use]
    pub fn binary(&self, name: &str) -> PathBuf {
        self.bin_dir().join(name)
    }

    /// Log file the launched agent writes to.
    #[must_use]
    pub fn agent_log(&self) -> PathBuf {
        self.distbuild_path.join("agent.log")
    }

    /// Checkout directory for a toolchain, relative to the distbuild path.
    #[must_use]
    pub fn toolchain_checkout(&self, relative: &str) -> PathBuf {
        self.distbuild_path.join(relative)
    }

    /// Published symlink location for a binary name.
    #[must_use]
    pub fn system_link(name: &str) -> PathBuf {
        Path::new(SYSTEM_BIN_DIR).join(name)
    }

    fn aosp_root(&self) -> Result<&Path> {
        self.aosp_path
            .as_deref()
            .context("aosp path is required in provisioning mode")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new(Some(PathBuf::from("/aosp")), PathBuf::from("/db"))
    }

    #[test]
    fn derives_checkout_paths() {
        let layout = layout();
        assert_eq!(
            layout.distbuild_checkout().expect("aosp path set"),
            PathBuf::from("/aosp/build/distbuild")
        );
        assert_eq!(
            layout.wrapper_checkout().expect("aosp path set"),
            PathBuf::from("/aosp/build/distbuild/boong/wrapper")
        );
    }

    #[test]
    fn derives_binary_and_log_paths() {
        let layout = layout();
        assert_eq!(layout.binary("proxy"), PathBuf::from("/db/boong/bin/proxy"));
        assert_eq!(layout.agent_log(), PathBuf::from("/db/agent.log"));
        assert_eq!(
            layout.toolchain_checkout("prebuilts/clang/host/linux-x86"),
            PathBuf::from("/db/prebuilts/clang/host/linux-x86")
        );
        assert_eq!(
            Layout::system_link("distninja"),
            PathBuf::from("/usr/local/bin/distninja")
        );
    }

    #[test]
    fn checkout_requires_aosp_path() {
        let layout = Layout::new(None, PathBuf::from("/db"));
        assert!(layout.distbuild_checkout().is_err());
    }

    #[test]
    fn tilde_expansion() {
        let home = dirs::home_dir().expect("home dir in test env");
        assert_eq!(expand_tilde("~").expect("expands"), home);
        assert_eq!(expand_tilde("~/aosp").expect("expands"), home.join("aosp"));
        assert_eq!(
            expand_tilde("/opt/distbuild").expect("passes through"),
            PathBuf::from("/opt/distbuild")
        );
        // Only a leading tilde is special.
        assert_eq!(
            expand_tilde("/data/~backup").expect("passes through"),
            PathBuf::from("/data/~backup")
        );
    }
}
