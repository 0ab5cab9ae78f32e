use clap::Parser;
use log::trace;

use trip_planner::{GenericError, ServiceConfig};

mod commands;

/// Plan trips and estimate their road distance and fuel cost.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<(), GenericError> {
    env_logger::builder()
        .filter_module("trip_planner", log::LevelFilter::Info)
        .parse_default_env()
        .init();
    trace!("Logger init.");

    let cli = Cli::parse();
    let config = ServiceConfig::from_env()?;
    trace!("Loaded configuration {:?}.", config);

    let planner = commands::build_planner(&config)?;
    commands::run(&planner, cli.command).await
}
