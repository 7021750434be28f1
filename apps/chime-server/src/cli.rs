//! CLI argument parsing.
//!
//! Defines the command-line interface for chime-server using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// chime-server command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "chime-server")]
#[command(author, version, about = "Signed webhook interaction server")]
pub struct Cli {
    /// Path to the config file (defaults to `~/.chime/config.yml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute (defaults to `serve`).
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available chime-server commands.
#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Commands {
    /// Listen for interactions.
    Serve,

    /// Upload the built-in command declarations to the platform.
    Register {
        /// Register to this guild instead of globally.
        #[arg(long)]
        guild: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_to_serve() {
        let cli = Cli::parse_from(["chime-server"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_should_parse_register_with_guild() {
        let cli = Cli::parse_from([
            "chime-server",
            "register",
            "--guild",
            "99",
            "--config",
            "/tmp/c.yml",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Register {
                guild: Some("99".into())
            })
        );
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yml")));
    }
}
