//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "orchestrix", version, about = "Durable job orchestrator")]
pub struct Cli {
    /// Path to a single configuration file (overrides layered loading)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server, scheduler, and worker pool (default)
    Serve {
        /// Validate configuration and exit without starting
        #[arg(long)]
        dry_run: bool,
    },
    /// Run pending database migrations and exit
    Migrate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_dry_run() {
        let cli = Cli::parse_from(["orchestrix", "serve", "--dry-run"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Serve { dry_run: true })
        ));
    }

    #[test]
    fn parses_config_flag() {
        let cli = Cli::parse_from(["orchestrix", "--config", "/etc/orchestrix.toml", "migrate"]);
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/etc/orchestrix.toml"))
        );
        assert!(matches!(cli.command, Some(Commands::Migrate)));
    }

    #[test]
    fn default_command_is_none() {
        let cli = Cli::parse_from(["orchestrix"]);
        assert!(cli.command.is_none());
    }
}
