//! Bounded wait for protocol acknowledgements.
//!
//! The UCCI boot sequence is two request/acknowledge pairs:
//!
//! 1. `ucci` → `ucciok`
//! 2. `isready` → `readyok`
//!
//! Both use [`wait_for_token`]: pull lines from the drain channel, discarding
//! anything that is not the exact token (engines print banners and option
//! lists before `ucciok`), until the token arrives or a single pull waits
//! longer than the per-attempt timeout.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{AppError, Result};

/// Wait until `token` arrives on `lines`.
///
/// Every pull is bounded by `timeout`; the overall wait is bounded by the
/// engine's output volume because each non-matching line is consumed.
///
/// # Errors
///
/// - `AppError::Handshake("timed out …")`: no line at all arrived within
///   `timeout` before the token was seen.
/// - `AppError::Handshake("engine exited …")`: the drain closed the channel
///   before the token was seen.
pub async fn wait_for_token(
    lines: &mut mpsc::Receiver<String>,
    token: &str,
    timeout: Duration,
) -> Result<()> {
    loop {
        match tokio::time::timeout(timeout, lines.recv()).await {
            Ok(Some(line)) if line.trim() == token => {
                info!(token, "handshake: acknowledgement received");
                return Ok(());
            }
            Ok(Some(line)) => {
                debug!(token, raw = line.as_str(), "handshake: skipping line");
            }
            Ok(None) => {
                return Err(AppError::Handshake(format!(
                    "engine exited before sending '{token}'"
                )));
            }
            Err(_elapsed) => {
                return Err(AppError::Handshake(format!(
                    "timed out after {timeout:?} waiting for '{token}'"
                )));
            }
        }
    }
}
