//! CLI command definitions using clap
//!
//! Defines the command structure for the `phrasebook` CLI tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// phrasebook - collect phrases from the terminal
///
/// Log in by scanning a QR code, then collect, mark and remove phrases.
#[derive(Parser, Debug)]
#[command(name = "phrasebook", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in by scanning a QR code
    Login {
        /// Where to write the QR code image
        #[arg(long, default_value = "phrasebook-qr.jpg")]
        qr_out: PathBuf,

        /// Also print the QR code as a data: URL for pasting into a browser
        #[arg(long)]
        data_url: bool,
    },

    /// Remove the stored session
    Logout,

    /// Show current session status
    Status,

    /// Manage collected phrases
    Phrase(PhraseArgs),

    /// Send a tracking record
    Track {
        /// JSON payload
        #[arg(long)]
        data: String,
    },

    /// Manage configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Phrase Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Phrase commands
#[derive(Parser, Debug)]
pub struct PhraseArgs {
    #[command(subcommand)]
    pub command: PhraseCommand,
}

#[derive(Subcommand, Debug)]
pub enum PhraseCommand {
    /// Collect a phrase
    Collect {
        /// JSON payload
        #[arg(long)]
        data: String,
    },

    /// Remove a collected phrase
    Remove {
        /// JSON payload
        #[arg(long)]
        data: String,
    },

    /// Update the mark of a collected phrase
    Mark {
        /// JSON payload
        #[arg(long)]
        data: String,
    },
}

impl PhraseCommand {
    pub fn data(&self) -> &str {
        match self {
            PhraseCommand::Collect { data }
            | PhraseCommand::Remove { data }
            | PhraseCommand::Mark { data } => data,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the active configuration and endpoints
    Show,

    /// Print the configuration file path
    Path,

    /// Select the deployment (production or test)
    SetMode {
        /// Mode name
        mode: String,
    },

    /// Point both modes at another host[:port][/path]
    SetBase {
        /// New base, e.g. 127.0.0.1:8080/p
        #[arg(required_unless_present = "clear")]
        base: Option<String>,

        /// Go back to the mode's built-in base
        #[arg(long, conflicts_with = "base")]
        clear: bool,
    },
}
