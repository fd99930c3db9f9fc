use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    ConfigCommand, ItemCommand, OpenCommand, ShareCommand, SuggestCommand, TripCommand,
};
use itinera::config::Config;

#[derive(Parser)]
#[command(name = "itinera")]
#[command(version)]
#[command(about = "Plan trips day by day and share them", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage trips
    Trip(TripCommand),

    /// Manage the activities of a trip's days
    Item(ItemCommand),

    /// Get activity ideas for a trip
    Suggest(SuggestCommand),

    /// Print a share link for a trip
    Share(ShareCommand),

    /// Open a share link
    Open(OpenCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itinera=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Trip(cmd)) => {
            let mut controller = commands::controller(&config);
            cmd.run(&mut controller).await?;
        }
        Some(Commands::Item(cmd)) => {
            let mut controller = commands::controller(&config);
            cmd.run(&mut controller).await?;
        }
        Some(Commands::Suggest(cmd)) => {
            let mut controller = commands::controller(&config);
            cmd.run(&mut controller, &config).await?;
        }
        Some(Commands::Share(cmd)) => {
            let controller = commands::controller(&config);
            cmd.run(&controller, &config).await?;
        }
        Some(Commands::Open(cmd)) => {
            let mut controller = commands::controller(&config);
            cmd.run(&mut controller).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
