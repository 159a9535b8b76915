//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::Parser;

use crate::command_runner::TokioCommandRunner;
use crate::config::Config;
use crate::output::OutputContext;
use crate::paths::{Layout, expand_tilde};
use crate::provisioner::{Bootstrap, Mode};

/// boong bootstrap
#[derive(Parser, Debug)]
#[command(name = "bootstrap", version, about = "boong bootstrap")]
pub struct Cli {
    /// AOSP base path (provisioning mode)
    #[arg(
        long,
        value_name = "DIR",
        required_unless_present = "deploy_agent",
        conflicts_with = "deploy_agent"
    )]
    pub aosp_path: Option<String>,

    /// Distbuild binaries path
    #[arg(long, value_name = "DIR", required = true)]
    pub distbuild_path: String,

    /// Deploy the agent service instead of provisioning
    #[arg(long)]
    pub deploy_agent: bool,

    /// Download prebuilt toolchains (shallow, branch-pinned clones)
    #[arg(long, conflicts_with = "deploy_agent")]
    pub enable_toolchains: bool,

    /// Push the agent binary to this worker host instead of launching locally
    #[arg(short, long, value_name = "HOST", requires = "deploy_agent")]
    pub worker: Option<String>,

    /// Password for the secure-copy transfer to the worker
    #[arg(short, long, value_name = "PASS", requires = "worker")]
    pub password: Option<String>,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Execute the bootstrap run.
    ///
    /// # Errors
    ///
    /// Returns an error if tilde expansion fails or any provisioning step
    /// fails. Flag conflicts are rejected by clap before this runs.
    pub async fn run(self) -> Result<()> {
        let output = OutputContext::new(self.no_color, self.quiet);
        let config = Config::load();

        let aosp_path = self.aosp_path.as_deref().map(expand_tilde).transpose()?;
        let distbuild_path = expand_tilde(&self.distbuild_path)?;
        let layout = Layout::new(aosp_path, distbuild_path);

        let mode = if self.deploy_agent {
            Mode::DeployAgent {
                worker: self.worker,
                password: self.password,
            }
        } else {
            Mode::Provision {
                enable_toolchains: self.enable_toolchains,
            }
        };

        Bootstrap::new(config, layout, TokioCommandRunner, output)
            .run(mode)
            .await
    }
}
