//! Server configuration and command-line arguments.
//!
//! The command line is the only configuration source. Bad flags abort at
//! startup, before any socket is opened.

use std::path::PathBuf;

use clap::Parser;

use relay_protocol::DEFAULT_PORT;

/// Command-line arguments for `relay-server`.
#[derive(Debug, Parser)]
#[command(name = "relay-server", about = "Fan-out message relay over TCP")]
pub struct Args {
    /// Interface to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// TCP port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Append log output to this file instead of writing to stdout.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind, e.g. "0.0.0.0" or "127.0.0.1".
    pub bind_addr: String,
    /// TCP port to listen on; 0 asks the OS for a free port.
    pub port: u16,
    /// Optional log sink, opened in append mode.
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// The `addr:port` string the listener binds.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            bind_addr: args.bind,
            port: args.port,
            log_file: args.log_file,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_the_conventional_port() {
        let config = Config::default();
        assert_eq!(config.socket_addr_string(), "0.0.0.0:50204");
        assert!(config.log_file.is_none());
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::parse_from(["relay-server"]);
        let config: Config = args.into();
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn args_override_bind_and_port() {
        let args = Args::parse_from(["relay-server", "--bind", "127.0.0.1", "-p", "8080"]);
        let config: Config = args.into();
        assert_eq!(config.socket_addr_string(), "127.0.0.1:8080");
    }
}
