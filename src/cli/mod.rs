//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};

/// FitTrack - calorie, workout and weight tracking server
#[derive(Parser)]
#[command(name = "fittrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server with the background scheduler (default)
    Serve,

    /// Create the demo accounts and their sample history
    Seed,

    /// Delete daily logs older than the retention window
    Cleanup {
        /// Days of logs to keep; defaults to `scheduler.retention_days`
        #[arg(long)]
        days: Option<u32>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["fittrack"]).unwrap();
        assert_eq!(cli.command, None);

        let cli = Cli::try_parse_from(["fittrack", "cleanup", "--days", "30"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Cleanup { days: Some(30) }));

        let cli = Cli::try_parse_from(["fittrack", "seed"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Seed));

        assert!(Cli::try_parse_from(["fittrack", "cleanup", "--days", "x"]).is_err());
    }
}
