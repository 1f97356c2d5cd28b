//! CLI module for Sheetbridge
//!
//! Provides commands:
//! - `convert`: convert Excel workbooks in Drive to native spreadsheets
//! - `cleanup`: delete converted spreadsheets after the fact
//! - `limits`: show configured quota ceilings, spacing and costs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod cleanup;
pub mod convert;
pub mod limits;

/// Sheetbridge CLI
#[derive(Parser, Debug)]
#[command(name = "sheetbridge")]
#[command(about = "Quota-governed Excel to Google Sheets conversion")]
#[command(version)]
pub struct Cli {
    /// Extra configuration file layered over the defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert workbooks (file ids or Drive/Sheets URLs)
    Convert(ConvertArgs),
    /// Delete converted spreadsheets (file ids or Drive/Sheets URLs)
    Cleanup(CleanupArgs),
    /// Show configured quota limits
    Limits {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// File ids or Drive/Sheets URLs
    #[arg(required = true, value_name = "FILE_ID_OR_URL")]
    pub inputs: Vec<String>,

    /// Keep intermediate artifacts
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Delete the source after a successful conversion
    #[arg(long)]
    pub remove_source: bool,

    /// Reuse an existing converted spreadsheet in the same folder
    #[arg(long)]
    pub reuse_existing: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CleanupArgs {
    /// File ids or Drive/Sheets URLs
    #[arg(value_name = "FILE_ID_OR_URL")]
    pub inputs: Vec<String>,

    /// Read more ids or URLs from a file, one per line
    #[arg(long, value_name = "FILE")]
    pub urls_file: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::app::load_config(cli.config.as_deref())?;
    match cli.command {
        Some(Commands::Convert(args)) => convert::run(config, args).await,
        Some(Commands::Cleanup(args)) => cleanup::run(config, args).await,
        Some(Commands::Limits { json }) => limits::run(&config, json),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_flags() {
        let cli = Cli::try_parse_from([
            "sheetbridge",
            "convert",
            "abc",
            "https://docs.google.com/spreadsheets/d/xyz/edit",
            "--remove-source",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Convert(args)) => {
                assert_eq!(args.inputs.len(), 2);
                assert!(args.remove_source);
                assert!(args.json);
                assert!(!args.keep_intermediates);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_cleanup_with_list_file() {
        let cli = Cli::try_parse_from([
            "sheetbridge",
            "cleanup",
            "abc",
            "--urls-file",
            "config/urls.txt",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Cleanup(args)) => {
                assert_eq!(args.inputs, vec!["abc".to_string()]);
                assert_eq!(args.urls_file, Some(PathBuf::from("config/urls.txt")));
                assert!(!args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_convert_requires_input() {
        assert!(Cli::try_parse_from(["sheetbridge", "convert"]).is_err());
    }
}
