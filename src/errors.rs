//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error enumeration covering every engine-client failure mode.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Engine executable is missing, not runnable, or the OS refused to spawn it.
    Launch(String),
    /// Engine did not acknowledge `ucci` / `isready` in time, or exited mid-handshake.
    Handshake(String),
    /// Malformed numeric field in an engine `info` line.
    ///
    /// Recovered locally by the analysis poller; never returned from `poll`.
    Protocol(String),
    /// Caller broke the session contract (bad state transition or argument).
    Contract(String),
    /// Pipe or other I/O failure against a running engine.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Launch(msg) => write!(f, "launch: {msg}"),
            Self::Handshake(msg) => write!(f, "handshake: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Contract(msg) => write!(f, "contract violation: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
