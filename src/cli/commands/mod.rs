//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check_key;
mod download;
mod init;
mod reconcile;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::FileFormat;

#[derive(Parser)]
#[command(name = "cht")]
#[command(
    about = "Download and catalog transcripts of House committee hearings from govinfo.gov",
    long_about = "Download and catalog transcripts of House committee hearings from govinfo.gov. \
                  Supports the 105th Congress through the most recent complete Congress. \
                  Requires a govinfo.gov API key (https://www.govinfo.gov/api-signup)."
)]
#[command(version)]
pub struct Cli {
    /// Data directory holding the catalog database (overrides config file)
    #[arg(long, short = 'd', global = true)]
    data_dir: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Show how much of each Congress has been downloaded and parsed
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Repair drift between the catalog and the filesystem first
        #[arg(long)]
        reconcile: bool,
    },

    /// Download a document or set of documents
    Download {
        /// A specific document ID or list of IDs
        #[arg(short, long = "id", num_args = 1..)]
        ids: Vec<String>,

        /// A specific Congress or list of Congresses
        #[arg(short, long = "congress", num_args = 1..)]
        congresses: Vec<String>,

        /// The file type to download (txt, text, pdf, xml, metadata)
        #[arg(short, long, default_value = "txt", value_parser = parse_format)]
        format: FileFormat,

        /// The directory to download the files to (overrides config)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Clear catalog paths whose files no longer exist on disk
    Reconcile,

    /// Test a govinfo.gov API key and save it to the data directory if valid
    CheckKey {
        /// Key to test (defaults to the configured key)
        key: Option<String>,
    },
}

fn parse_format(s: &str) -> Result<FileFormat, String> {
    FileFormat::parse(s).map_err(|e| e.to_string())
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --path only exists on download but overrides the configured root
    let downloads_dir = match &cli.command {
        Commands::Download { path, .. } => path.clone(),
        _ => None,
    };

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data_dir: cli.data_dir,
        downloads_dir,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Status { json, reconcile } => {
            status::cmd_status(&settings, json, reconcile).await
        }
        Commands::Download {
            ids,
            congresses,
            format,
            ..
        } => download::cmd_download(&settings, &ids, &congresses, format).await,
        Commands::Reconcile => reconcile::cmd_reconcile(&settings).await,
        Commands::CheckKey { key } => check_key::cmd_check_key(&settings, key.as_deref()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_download_args() {
        let cli = Cli::try_parse_from([
            "cht", "download", "-c", "105", "106", "-f", "metadata", "-p", "/tmp/dl",
        ])
        .unwrap();
        match cli.command {
            Commands::Download {
                ids,
                congresses,
                format,
                path,
            } => {
                assert!(ids.is_empty());
                assert_eq!(congresses, vec!["105", "106"]);
                assert_eq!(format, FileFormat::Xml);
                assert_eq!(path, Some(PathBuf::from("/tmp/dl")));
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["cht", "download", "-c", "105", "-f", "docx"]).is_err());
    }

    #[test]
    fn test_congress_short_flag_with_config() {
        let cli = Cli::try_parse_from([
            "cht", "--config", "cht.toml", "download", "-c", "110", "-i", "CHRG-110hhrg1",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cht.toml")));
        match cli.command {
            Commands::Download { ids, congresses, .. } => {
                assert_eq!(congresses, vec!["110"]);
                assert_eq!(ids, vec!["CHRG-110hhrg1"]);
            }
            _ => panic!("expected download"),
        }
    }
}
