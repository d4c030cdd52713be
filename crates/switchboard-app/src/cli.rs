//! CLI argument definitions for the Switchboard binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Switchboard — a unified conversational router dispatching chat messages
/// to specialized capability providers.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SWITCHBOARD_CONFIG env var > ./switchboard.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SWITCHBOARD_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("switchboard.toml")
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > SWITCHBOARD_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
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

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        let mut full = vec!["switchboard"];
        full.extend_from_slice(argv);
        CliArgs::parse_from(full)
    }

    #[test]
    fn test_port_flag_wins() {
        let a = args(&["--port", "9999"]);
        assert_eq!(a.resolve_port(8000), 9999);
    }

    #[test]
    fn test_port_falls_back_to_config() {
        let a = args(&[]);
        assert_eq!(a.resolve_port(8123), 8123);
    }

    #[test]
    fn test_config_flag_wins() {
        let a = args(&["--config", "/tmp/custom.toml"]);
        assert_eq!(a.resolve_config_path(), PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_log_level_flag_wins() {
        let a = args(&["--log-level", "debug"]);
        assert_eq!(a.resolve_log_level("info"), "debug");
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let a = args(&[]);
        assert_eq!(a.resolve_log_level("warn"), "warn");
    }
}
