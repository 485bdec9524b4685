//! Engine client configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ucci::codec::MAX_LINE_BYTES;
use crate::ucci::parser::{ParseLimits, MAX_PV_MOVES, MIN_INFO_TOKENS};
use crate::{AppError, Result};

fn default_handshake_timeout_ms() -> u64 {
    1000
}

fn default_poll_window_ms() -> u64 {
    500
}

fn default_shutdown_grace_ms() -> u64 {
    500
}

fn default_min_info_tokens() -> usize {
    MIN_INFO_TOKENS
}

fn default_max_pv_moves() -> usize {
    MAX_PV_MOVES
}

fn default_max_line_bytes() -> usize {
    MAX_LINE_BYTES
}

/// Engine client configuration, usually parsed from `ucci-analyzer.toml`.
///
/// Every field except `engine_path` has a default, so an empty TOML document
/// is a valid configuration once a path is supplied by other means.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Path to the engine executable.
    #[serde(default)]
    pub engine_path: PathBuf,
    /// Per-attempt wait for `ucciok` / `readyok`.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Length of one analysis polling window.
    #[serde(default = "default_poll_window_ms")]
    pub poll_window_ms: u64,
    /// How long shutdown waits for the drain task, and then for the engine to
    /// exit after `quit`, before killing it.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Minimum whitespace-separated tokens for an `info` line to be parsed.
    #[serde(default = "default_min_info_tokens")]
    pub min_info_tokens: usize,
    /// Maximum number of principal-variation moves kept per line.
    #[serde(default = "default_max_pv_moves")]
    pub max_pv_moves: usize,
    /// Maximum accepted length of a single engine output line.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl EngineConfig {
    /// Configuration for `engine_path` with every knob at its default.
    #[must_use]
    pub fn new(engine_path: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            poll_window_ms: default_poll_window_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            min_info_tokens: default_min_info_tokens(),
            max_pv_moves: default_max_pv_moves(),
            max_line_bytes: default_max_line_bytes(),
        }
    }

    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Per-attempt acknowledgement timeout used by the handshake.
    #[must_use]
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Analysis polling window.
    #[must_use]
    pub fn poll_window(&self) -> Duration {
        Duration::from_millis(self.poll_window_ms)
    }

    /// Grace period for each teardown wait at shutdown.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Parser limits derived from this configuration.
    #[must_use]
    pub fn parse_limits(&self) -> ParseLimits {
        ParseLimits {
            min_tokens: self.min_info_tokens,
            max_pv_moves: self.max_pv_moves,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.handshake_timeout_ms == 0 {
            return Err(AppError::Config(
                "handshake_timeout_ms must be greater than zero".into(),
            ));
        }

        if self.poll_window_ms == 0 {
            return Err(AppError::Config(
                "poll_window_ms must be greater than zero".into(),
            ));
        }

        if self.shutdown_grace_ms == 0 {
            return Err(AppError::Config(
                "shutdown_grace_ms must be greater than zero".into(),
            ));
        }

        if self.max_pv_moves == 0 {
            return Err(AppError::Config(
                "max_pv_moves must be greater than zero".into(),
            ));
        }

        if self.max_line_bytes == 0 {
            return Err(AppError::Config(
                "max_line_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
