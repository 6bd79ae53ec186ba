use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = devquest_cli::Cli::parse();
    devquest_cli::run_cli(cli)
}
