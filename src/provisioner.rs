//! Orchestration of the two bootstrap modes.
//!
//! The whole run is a linear pipeline. Provisioning mode: clone the
//! distbuild repo, download the proxy/distninja binaries in parallel,
//! publish symlinks, optionally clone toolchains. Agent-deploy mode:
//! download the agent, then either push it to a worker or launch it locally
//! as a detached process.

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use crate::agent;
use crate::command_runner::CommandRunner;
use crate::config::{Config, ConfigError};
use crate::download::{DownloadTask, Downloader};
use crate::git::GitFetcher;
use crate::output::{OutputContext, progress};
use crate::paths::Layout;
use crate::symlink::SymlinkInstaller;
use crate::transfer::WorkerTransfer;

/// Branch and depth used for every toolchain clone.
const TOOLCHAIN_BRANCH: &str = "master";
const TOOLCHAIN_DEPTH: u32 = 1;

/// Prebuilt toolchains fetched with `--enable-toolchains`.
struct ToolchainSpec {
    name: &'static str,
    /// Repository path appended to `REPO_HOST`.
    repo_path: &'static str,
    /// Checkout directory relative to the distbuild path.
    checkout: &'static str,
}

const TOOLCHAINS: [ToolchainSpec; 2] = [
    ToolchainSpec {
        name: "clang",
        repo_path: "platform/prebuilts/clang/host/linux-x86",
        checkout: "prebuilts/clang/host/linux-x86",
    },
    ToolchainSpec {
        name: "gcc",
        repo_path: "platform/prebuilts/gcc/linux-x86/host/x86_64-linux-glibc2.17-4.8",
        checkout: "prebuilts/gcc/linux-x86/host/x86_64-linux-glibc2.17-4.8",
    },
];

/// Which pipeline to run. The two modes are mutually exclusive; clap
/// rejects conflicting flags before any side effect.
pub enum Mode {
    Provision {
        enable_toolchains: bool,
    },
    DeployAgent {
        worker: Option<String>,
        password: Option<String>,
    },
}

/// Executes the bootstrap pipeline for one mode.
pub struct Bootstrap<R: CommandRunner> {
    config: Config,
    layout: Layout,
    runner: R,
    output: OutputContext,
}

impl<R: CommandRunner> Bootstrap<R> {
    pub fn new(config: Config, layout: Layout, runner: R, output: OutputContext) -> Self {
        Self {
            config,
            layout,
            runner,
            output,
        }
    }

    /// Run the selected pipeline to completion.
    ///
    /// # Errors
    ///
    /// Any step failure aborts the run; earlier filesystem mutations are
    /// left in place (no rollback).
    pub async fn run(&self, mode: Mode) -> Result<()> {
        match mode {
            Mode::Provision { enable_toolchains } => self.provision(enable_toolchains).await,
            Mode::DeployAgent { worker, password } => {
                self.deploy_agent(worker.as_deref(), password.as_deref())
                    .await
            }
        }
    }

    async fn provision(&self, enable_toolchains: bool) -> Result<()> {
        self.clone_distbuild_repo()
            .await
            .context("git clone failed")?;

        let downloaded = self
            .download_resources()
            .await
            .context("download resources failed")?;

        self.install_symlinks(&downloaded)
            .await
            .context("create symlinks failed")?;

        if enable_toolchains {
            self.download_toolchains()
                .await
                .context("download toolchains failed")?;
        }

        self.output.success("bootstrap complete");
        Ok(())
    }

    /// Clone the distbuild repo, or the wrapper repo into its nested
    /// checkout when only `WRAPPER_REPO` is configured.
    async fn clone_distbuild_repo(&self) -> Result<()> {
        let host = self.config.repo_host()?;
        let (repo, dest) = match (&self.config.distbuild_repo, &self.config.wrapper_repo) {
            (Some(repo), _) => (repo, self.layout.distbuild_checkout()?),
            (None, Some(repo)) => {
                // The wrapper clone nests inside the distbuild checkout;
                // the wipe still covers the whole checkout, so contents
                // from a prior full-repo run do not survive.
                crate::git::wipe(&self.layout.distbuild_checkout()?).await?;
                (repo, self.layout.wrapper_checkout()?)
            }
            (None, None) => {
                return Err(ConfigError::MissingVar("DISTBUILD_REPO or WRAPPER_REPO").into());
            }
        };
        let url = format!("{host}/{repo}");

        let pb = self.output.spinner("clone repo...");
        let result = GitFetcher::new(&self.runner).clone_repo(&url, &dest).await;
        finish_spinner(pb.as_ref(), result.is_ok(), "repo cloned");
        result
    }

    /// Download the configured resources in parallel. Returns the names
    /// that were actually fetched; unset URLs are skipped with a warning.
    async fn download_resources(&self) -> Result<Vec<&'static str>> {
        let bin_dir = self.layout.bin_dir();
        tokio::fs::create_dir_all(&bin_dir)
            .await
            .with_context(|| format!("creating {}", bin_dir.display()))?;

        let resources: [(&'static str, &'static str, &Option<String>); 2] = [
            ("proxy", "PROXY_BIN", &self.config.proxy_bin),
            ("distninja", "DISTNINJA_BIN", &self.config.distninja_bin),
        ];

        let mut tasks = Vec::new();
        let mut names = Vec::new();
        for (name, var, url) in resources {
            match url {
                Some(url) => {
                    names.push(name);
                    tasks.push(DownloadTask {
                        url: url.clone(),
                        dest: self.layout.binary(name),
                    });
                }
                None => self
                    .output
                    .warn(&format!("environment variable {var} not set")),
            }
        }
        if tasks.is_empty() {
            return Ok(names);
        }

        let pb = self.output.spinner("download resources...");
        let result = Downloader::new(self.config.basic_auth())
            .fetch_all(tasks)
            .await;
        finish_spinner(pb.as_ref(), result.is_ok(), "resources downloaded");
        result?;
        Ok(names)
    }

    async fn install_symlinks(&self, names: &[&str]) -> Result<()> {
        let installer = SymlinkInstaller::new(&self.runner, &self.layout);
        for name in names {
            installer.install(name).await?;
        }
        Ok(())
    }

    async fn download_toolchains(&self) -> Result<()> {
        let host = self.config.repo_host()?;
        let fetcher = GitFetcher::new(&self.runner);

        for tc in &TOOLCHAINS {
            let url = format!("{host}/{}", tc.repo_path);
            let dest = self.layout.toolchain_checkout(tc.checkout);

            let pb = self.output.spinner(&format!("clone {}...", tc.name));
            let result = fetcher
                .clone_shallow(&url, TOOLCHAIN_BRANCH, TOOLCHAIN_DEPTH, &dest)
                .await;
            finish_spinner(pb.as_ref(), result.is_ok(), &format!("{} cloned", tc.name));
            result.with_context(|| format!("{} clone failed", tc.name))?;
        }
        Ok(())
    }

    async fn deploy_agent(&self, worker: Option<&str>, password: Option<&str>) -> Result<()> {
        let bin_dir = self.layout.bin_dir();
        tokio::fs::create_dir_all(&bin_dir)
            .await
            .with_context(|| format!("creating {}", bin_dir.display()))?;

        let Some(url) = &self.config.agent_bin else {
            self.output.warn("environment variable AGENT_BIN not set");
            return Ok(());
        };
        let dest = self.layout.binary("agent");

        let pb = self.output.spinner("download agent...");
        let result = Downloader::new(self.config.basic_auth())
            .fetch_all(vec![DownloadTask {
                url: url.clone(),
                dest: dest.clone(),
            }])
            .await;
        finish_spinner(pb.as_ref(), result.is_ok(), "agent downloaded");
        result.context("download agent failed")?;

        if let Some(worker) = worker {
            WorkerTransfer::new(&self.runner)
                .push(&dest, worker, password)
                .await
                .context("deploy agent to worker failed")?;
            self.output
                .success(&format!("agent deployed to {worker}"));
            return Ok(());
        }

        self.output.info("starting agent in background...");
        let log = self.layout.agent_log();
        let pid = agent::launch(&dest, &log)?;
        self.output.success(&format!("agent started with PID {pid}"));
        self.output.kv("log output:", &log.display().to_string());
        Ok(())
    }
}

fn finish_spinner(pb: Option<&ProgressBar>, ok: bool, msg: &str) {
    if let Some(pb) = pb {
        if ok {
            progress::finish_ok(pb, msg);
        } else {
            pb.finish_and_clear();
        }
    }
}
