//! Command-line parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// One parsed invocation.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "frigogest")]
#[command(about = "FrigoGest device: stock, sales and route data shared between devices")]
#[command(version, arg_required_else_help = true)]
pub struct Cli {
    /// Database file (default: FRIGO_DB_PATH or the platform data dir)
    #[arg(short = 'd', long = "db", value_name = "PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Sync config file (default: platform config dir)
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Keep this device in sync until Ctrl+C
    Run,

    /// Run one pull-then-push cycle now
    Sync,

    /// Link to a shared slot
    Link {
        /// Linking code, 4-6 letters or digits (generated when omitted)
        code: Option<String>,
    },

    /// Return to standalone mode
    Unlink,

    /// Show linking and sync state
    Status,

    /// Recompute every customer balance from sale history
    Repair,

    /// Sales, collections, stock and expiry figures
    Dashboard,

    /// Stops for a visit day
    Route {
        /// Visit day, 1 (Monday) to 7 (Sunday)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=7))]
        day: u8,

        /// Ask the text generator for a narrated route
        #[arg(long)]
        narrate: bool,
    },

    /// Inventory briefing from the text generator
    Insights,

    /// Restore seed records
    Reset {
        /// Wipe the store first
        #[arg(long)]
        full: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("frigogest").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_shows_help() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn test_global_options_anywhere() {
        let cli = parse(&["status", "--db", "/tmp/f.db", "-c", "sync.toml"]).unwrap();
        assert_eq!(cli.command, Command::Status);
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/f.db")));
        assert_eq!(cli.config_path, Some(PathBuf::from("sync.toml")));

        let cli = parse(&["-d", "/tmp/g.db", "repair"]).unwrap();
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/g.db")));

        assert!(parse(&["status", "--db"]).is_err());
    }

    #[test]
    fn test_link_with_and_without_code() {
        assert_eq!(
            parse(&["link", "ab12cd"]).unwrap().command,
            Command::Link {
                code: Some("ab12cd".into())
            }
        );
        assert_eq!(parse(&["link"]).unwrap().command, Command::Link { code: None });
    }

    #[test]
    fn test_route_day_is_validated() {
        assert_eq!(
            parse(&["route", "3", "--narrate"]).unwrap().command,
            Command::Route {
                day: 3,
                narrate: true
            }
        );
        assert!(parse(&["route"]).is_err());
        assert!(parse(&["route", "0"]).is_err());
        assert!(parse(&["route", "8"]).is_err());
        assert!(parse(&["route", "mon"]).is_err());
    }

    #[test]
    fn test_reset_and_unknown() {
        assert_eq!(
            parse(&["reset", "--full"]).unwrap().command,
            Command::Reset { full: true }
        );
        assert_eq!(parse(&["reset"]).unwrap().command, Command::Reset { full: false });

        let err = parse(&["fly"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }
}
