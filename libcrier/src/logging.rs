//! Shared logging setup for the crier binaries
//!
//! All tools log to stderr so stdout stays clean for piping. Format and
//! level default from `CRIER_LOG_FORMAT` / `CRIER_LOG_LEVEL`.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Plain text (no colors, suitable for piping)
    Text,
    /// One JSON object per line, for log collectors
    Json,
    /// Pretty-printed with colors, for development
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Initialize the global subscriber with an explicit format and level.
///
/// `RUST_LOG` takes precedence over `level` when set. Panics if a
/// subscriber is already installed.
pub fn init(format: LogFormat, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .flatten_event(true)
                .with_target(true)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }
}

/// Initialize logging for an interactive CLI invocation.
///
/// Verbose runs at debug, otherwise only errors reach the terminal.
pub fn init_cli(verbose: bool) {
    let level = if verbose { "debug" } else { "error" };
    init(format_from_env(), level);
}

/// Initialize logging for a long-running daemon.
///
/// Defaults to info so lifecycle and iteration outcomes are visible.
pub fn init_daemon(verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        std::env::var("CRIER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    init(format_from_env(), &level);
}

fn format_from_env() -> LogFormat {
    std::env::var("CRIER_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text)
}
