//! Engine process spawner and ownership record.
//!
//! [`spawn_engine`] validates the executable, launches it with piped stdio and
//! `kill_on_drop(true)`, and starts the output drain. The returned
//! [`EngineProcess`] owns every resource tied to the child:
//!
//! - the child handle (killed when dropped),
//! - the framed stdin writer,
//! - the receiving end of the drain channel,
//! - the drain task handle and its cancellation token.
//!
//! [`EngineProcess::terminate`] is the orderly teardown; dropping the record
//! without calling it still cancels the drain and kills the child.

use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::ucci::codec::UcciCodec;
use crate::ucci::command::EngineCommand;
use crate::ucci::drain::run_drain;
use crate::ucci::handshake::wait_for_token;
use crate::{AppError, Result};

/// Check that `path` names an existing, regular, executable file.
///
/// # Errors
///
/// Returns `AppError::Launch` when the path does not exist, is a directory
/// (or other non-regular file), or has no execute permission bit on Unix.
pub fn validate_executable(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|err| {
        AppError::Launch(format!("engine program not found: {}: {err}", path.display()))
    })?;

    if !meta.is_file() {
        return Err(AppError::Launch(format!(
            "engine program is not a regular file: {}",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if meta.permissions().mode() & 0o111 == 0 {
            return Err(AppError::Launch(format!(
                "engine program is not executable: {}",
                path.display()
            )));
        }
    }

    Ok(())
}

/// Live engine child process and its stdio plumbing.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    stdin: FramedWrite<ChildStdin, UcciCodec>,
    lines: mpsc::Receiver<String>,
    drain: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Validate the configured executable, spawn it, and start the output drain.
///
/// No protocol traffic happens here; the caller runs the handshake.
///
/// # Errors
///
/// - `AppError::Launch`: validation failed, the OS refused to spawn, or the
///   stdio pipes could not be captured.
pub fn spawn_engine(config: &EngineConfig) -> Result<EngineProcess> {
    validate_executable(&config.engine_path)?;

    let mut child = Command::new(&config.engine_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| AppError::Launch(format!("failed to spawn engine: {err}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Launch("failed to capture engine stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Launch("failed to capture engine stdout".into()))?;

    info!(
        engine = %config.engine_path.display(),
        pid = ?child.id(),
        "engine process spawned"
    );

    let (line_tx, lines) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let drain = tokio::spawn(run_drain(
        stdout,
        config.max_line_bytes,
        line_tx,
        cancel.clone(),
    ));

    Ok(EngineProcess {
        child,
        stdin: FramedWrite::new(stdin, UcciCodec::new()),
        lines,
        drain,
        cancel,
    })
}

impl EngineProcess {
    /// Write one command line to the engine and flush it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the stdin pipe is closed or the write fails.
    pub async fn send(&mut self, command: EngineCommand) -> Result<()> {
        let line = command.to_string();
        debug!(command = line.as_str(), "ucci: sending command");
        self.stdin
            .send(line)
            .await
            .map_err(|err| match err {
                AppError::Io(msg) => AppError::Io(format!("failed to send '{command}': {msg}")),
                other => other,
            })
    }

    /// Wait for an exact acknowledgement token from the engine.
    ///
    /// # Errors
    ///
    /// Propagates `AppError::Handshake` from [`wait_for_token`].
    pub async fn expect(&mut self, token: &str, timeout: Duration) -> Result<()> {
        wait_for_token(&mut self.lines, token, timeout).await
    }

    /// Receiving end of the drain channel.
    pub fn lines_mut(&mut self) -> &mut mpsc::Receiver<String> {
        &mut self.lines
    }

    /// Tear the engine down: stop the drain, discard parked output, send
    /// `quit`, close stdin, and make sure the child is gone.
    ///
    /// Every step is best-effort and logged; the child is killed and reaped
    /// regardless of earlier failures. `grace` bounds both the wait for the
    /// drain and the wait for a voluntary exit after `quit`.
    pub async fn terminate(mut self, grace: Duration) {
        self.cancel.cancel();
        if tokio::time::timeout(grace, &mut self.drain).await.is_err() {
            warn!("ucci drain did not stop within grace period, aborting");
            self.drain.abort();
        }

        let mut discarded = 0_usize;
        while self.lines.try_recv().is_ok() {
            discarded += 1;
        }
        self.lines.close();
        if discarded > 0 {
            debug!(discarded, "discarded unread engine output");
        }

        if let Err(err) = self.send(EngineCommand::Quit).await {
            warn!(%err, "failed to send quit to engine");
        }
        if let Err(err) = self.stdin.close().await {
            warn!(%err, "failed to close engine stdin");
        }

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(%status, "engine process exited");
            }
            Ok(Err(err)) => {
                warn!(%err, "error waiting for engine process, killing");
                self.kill().await;
            }
            Err(_elapsed) => {
                debug!("engine ignored quit, killing");
                self.kill().await;
            }
        }
    }

    async fn kill(&mut self) {
        if let Err(err) = self.child.kill().await {
            warn!(%err, "failed to kill engine process");
        }
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
