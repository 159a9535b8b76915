//! boong bootstrap — prepares distbuild build environments.

use clap::Parser;

use boong_bootstrap::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
