//! phrasebook - phrase collection client
//!
//! Log in with a QR code and manage collected phrases from the terminal.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use phrasebook::cli::commands::{Cli, Commands};
use phrasebook::cli::{auth, config, phrase};
use phrasebook::error::Result;

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { qr_out, data_url } => auth::handle_login(qr_out, data_url).await,
        Commands::Logout => auth::handle_logout(),
        Commands::Status => auth::handle_status(),
        Commands::Phrase(args) => phrase::handle_phrase(args.command).await,
        Commands::Track { data } => phrase::handle_track(&data).await,
        Commands::Config(args) => config::handle_config(args.command),
    }
}
