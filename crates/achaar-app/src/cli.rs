//! CLI argument definitions for the Achaar application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Achaar - a warm, chai-fuelled chat companion with document context.
#[derive(Parser, Debug)]
#[command(name = "achaar", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run the chat and upload proxy server.
    Serve {
        /// Address to bind.
        #[arg(long = "host")]
        host: Option<String>,

        /// API server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
    },
    /// Chat with a running server from the terminal.
    Chat {
        /// Server base URL, e.g. http://127.0.0.1:3000.
        #[arg(short = 'e', long = "endpoint")]
        endpoint: Option<String>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ACHAAR_CONFIG env var > ~/.achaar/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ACHAAR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Resolve the API server port.
///
/// Priority: --port flag > ACHAAR_PORT env var > config file value.
pub fn resolve_port(flag: Option<u16>, config_port: u16) -> u16 {
    if let Some(p) = flag {
        return p;
    }
    if let Ok(val) = std::env::var("ACHAAR_PORT") {
        if let Ok(p) = val.parse::<u16>() {
            return p;
        }
    }
    config_port
}

/// Resolve the server endpoint for the terminal client.
///
/// Priority: --endpoint flag > ACHAAR_ENDPOINT env var > config file value.
pub fn resolve_endpoint(flag: Option<String>, config_endpoint: &str) -> String {
    if let Some(e) = flag {
        return e;
    }
    if let Ok(e) = std::env::var("ACHAAR_ENDPOINT") {
        if !e.trim().is_empty() {
            return e;
        }
    }
    config_endpoint.to_string()
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".achaar").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".achaar").join("config.toml");
    }
    PathBuf::from("config.toml")
}
