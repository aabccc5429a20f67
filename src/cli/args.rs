//! CLI argument definitions using clap
//!
//! Commands:
//! - folio init --config <path>
//! - folio serve --config <path> [--port <port>]
//! - folio list --config <path>
//! - folio resequence --config <path>
//! - folio sweep --config <path> [--dry-run]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Folio - ordered post collection with blob-backed content
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory layout
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./folio.json")]
        config: PathBuf,
    },

    /// Serve the HTTP API, holding the data directory until stopped
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./folio.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print posts in display order
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./folio.json")]
        config: PathBuf,
    },

    /// Rewrite stored ranks so they match display order (server must be stopped)
    Resequence {
        /// Path to configuration file
        #[arg(long, default_value = "./folio.json")]
        config: PathBuf,
    },

    /// Delete blobs no post references (server must be stopped)
    Sweep {
        /// Path to configuration file
        #[arg(long, default_value = "./folio.json")]
        config: PathBuf,

        /// Report orphaned blobs without deleting them
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_port() {
        let cli = Cli::try_parse_from(["folio", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("./folio.json"));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_sweep_dry_run() {
        let cli =
            Cli::try_parse_from(["folio", "sweep", "--config", "/etc/folio.json", "--dry-run"])
                .unwrap();
        assert!(matches!(cli.command, Command::Sweep { dry_run: true, .. }));
    }
}
