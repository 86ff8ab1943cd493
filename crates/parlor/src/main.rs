//! # parlor
//!
//! Parlor chat server binary — wires configuration together and starts the
//! HTTP/WebSocket server.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use parlor_server::config::ServerConfig;
use parlor_server::metrics;
use parlor_server::server::ParlorServer;
use tracing_subscriber::EnvFilter;

/// Parlor chat server.
#[derive(Parser, Debug)]
#[command(name = "parlor", about = "Anonymous web chat relay")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "9000")]
    port: u16,

    /// Production mode: chat URLs use the wss scheme.
    #[arg(long)]
    production: bool,

    /// Restrict chat admission to these exact origins (repeatable).
    /// Without this flag any request that declares an origin is admitted.
    #[arg(long = "allowed-origin")]
    allowed_origins: Vec<String>,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let allowed_origins = if self.allowed_origins.is_empty() {
            None
        } else {
            Some(self.allowed_origins)
        };
        ServerConfig {
            host: self.host,
            port: self.port,
            production: self.production,
            allowed_origins,
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let metrics_handle = metrics::install_recorder();
    let server = ParlorServer::new(args.into_config(), metrics_handle);

    let (addr, handle) = server.listen().await.context("failed to bind server")?;
    tracing::info!("parlor listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    tracing::info!("shutting down...");
    server.shutdown().shutdown();
    let _ = handle.await;
    tracing::info!("shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["parlor"]);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 9000);
        assert!(!cli.production);
        assert!(cli.allowed_origins.is_empty());
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::parse_from([
            "parlor",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--production",
        ]);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 8080);
        assert!(cli.production);
    }

    #[test]
    fn repeated_allowed_origin_flags_collect() {
        let cli = Cli::parse_from([
            "parlor",
            "--allowed-origin",
            "https://a.example",
            "--allowed-origin",
            "https://b.example",
        ]);
        assert_eq!(cli.allowed_origins.len(), 2);
    }

    #[test]
    fn config_without_origins_allows_any() {
        let cli = Cli::parse_from(["parlor"]);
        let config = cli.into_config();
        assert!(config.allowed_origins.is_none());
    }

    #[test]
    fn config_with_origins_builds_allow_list() {
        let cli = Cli::parse_from(["parlor", "--allowed-origin", "https://a.example"]);
        let config = cli.into_config();
        assert_eq!(
            config.allowed_origins,
            Some(vec!["https://a.example".to_owned()])
        );
    }
}
