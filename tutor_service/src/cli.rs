//! Command-line interface definitions using clap derive API.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Tutor service CLI
#[derive(Parser)]
#[command(name = "tutor-service")]
#[command(about = "REST service for managing tutors")]
#[command(version)]
pub struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to, overriding server.host and server.port
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Create the database schema and exit
    InitDb,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_address() {
        let cli = Cli::parse_from(["tutor-service", "serve", "--addr", "0.0.0.0:9000"]);
        match cli.command {
            Commands::Serve { addr } => assert_eq!(addr, Some("0.0.0.0:9000".parse().unwrap())),
            _ => panic!("expected serve"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_global_config_flag() {
        let cli = Cli::parse_from(["tutor-service", "init-db", "--config", "prod.toml"]);
        assert!(matches!(cli.command, Commands::InitDb));
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
    }
}
