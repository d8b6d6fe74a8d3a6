use brrtbind::cli::{run_cli, Cli};
use brrtbind::logging::{init_logging, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // stderr only; stdout carries command output
    init_logging(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}
