//! Engine session lifecycle and state machine.
//!
//! ```text
//! Uninitialized --start--> Idle --think--> Thinking --stop--> Idle
//!        |                  |                 |
//!        +--start fails--+  +----shutdown-----+--> Terminated
//! ```
//!
//! The running states carry the [`EngineProcess`], so no operation can reach
//! a process that was never started or has already been torn down. Calls made
//! in the wrong state return [`AppError::Contract`].

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::engine::analysis::Analysis;
use crate::ucci::command::EngineCommand;
use crate::ucci::spawner::{spawn_engine, EngineProcess};
use crate::{AppError, Result};

/// Largest number of ranks (`MultiPV`) a think request may ask for.
pub const MAX_RANKS: usize = 499;

/// Boot acknowledgement token.
const UCCI_OK: &str = "ucciok";

/// Readiness acknowledgement token.
const READY_OK: &str = "readyok";

/// Observable session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Constructed, engine not yet started.
    Uninitialized,
    /// Handshake complete, no search running.
    Idle,
    /// A search is running.
    Thinking,
    /// Shut down, or failed to start. Terminal.
    Terminated,
}

#[derive(Debug)]
enum SessionState {
    Uninitialized,
    Idle(EngineProcess),
    Thinking(EngineProcess),
    Terminated,
}

/// Client-side handle to one engine process.
#[derive(Debug)]
pub struct EngineSession {
    config: EngineConfig,
    state: SessionState,
}

impl EngineSession {
    /// New, unstarted session for the engine named in `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
        }
    }

    /// Configuration the session was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn state(&self) -> SessionPhase {
        match self.state {
            SessionState::Uninitialized => SessionPhase::Uninitialized,
            SessionState::Idle(_) => SessionPhase::Idle,
            SessionState::Thinking(_) => SessionPhase::Thinking,
            SessionState::Terminated => SessionPhase::Terminated,
        }
    }

    /// Spawn the engine and run the `ucci` / `isready` handshake.
    ///
    /// On handshake failure the process is torn down and the session becomes
    /// `Terminated`; it cannot be started again.
    ///
    /// # Errors
    ///
    /// - `AppError::Contract`: the session is not `Uninitialized`.
    /// - `AppError::Launch`: the executable is invalid or failed to spawn.
    /// - `AppError::Handshake`: an acknowledgement was missing, or the engine
    ///   stopped accepting commands before the handshake finished.
    pub async fn start(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Uninitialized) {
            return Err(AppError::Contract(format!(
                "start() called in state {:?}",
                self.state()
            )));
        }

        let mut process = match spawn_engine(&self.config) {
            Ok(process) => process,
            Err(err) => {
                self.state = SessionState::Terminated;
                return Err(err);
            }
        };

        if let Err(err) = self.handshake(&mut process).await {
            warn!(%err, "engine handshake failed, tearing down");
            self.state = SessionState::Terminated;
            process.terminate(self.config.shutdown_grace()).await;
            return Err(err);
        }

        info!(engine = %self.config.engine_path.display(), "engine ready");
        self.state = SessionState::Idle(process);
        Ok(())
    }

    async fn handshake(&self, process: &mut EngineProcess) -> Result<()> {
        let timeout = self.config.handshake_timeout();

        send_handshake(process, EngineCommand::Ucci).await?;
        process.expect(UCCI_OK, timeout).await?;

        send_handshake(process, EngineCommand::IsReady).await?;
        process.expect(READY_OK, timeout).await
    }

    /// Start an unbounded multi-PV search on `position` (FEN).
    ///
    /// Returns the [`Analysis`] to poll. It borrows the session, so at most
    /// one analysis can exist at a time.
    ///
    /// # Errors
    ///
    /// - `AppError::Contract`: the session is not `Idle`, `rank_count` is
    ///   outside `1..=499`, or `position` spans more than one line.
    /// - `AppError::Io`: a command could not be written; the session stays
    ///   `Idle`.
    pub async fn think(&mut self, position: &str, rank_count: usize) -> Result<Analysis<'_>> {
        if !(1..=MAX_RANKS).contains(&rank_count) {
            return Err(AppError::Contract(format!(
                "rank count must be between 1 and {MAX_RANKS}, got {rank_count}"
            )));
        }
        if position.contains(['\n', '\r']) {
            return Err(AppError::Contract(
                "position must be a single line".into(),
            ));
        }
        let multipv = u16::try_from(rank_count)
            .map_err(|_| AppError::Contract(format!("rank count {rank_count} out of range")))?;

        let phase = self.state();
        let SessionState::Idle(process) = &mut self.state else {
            return Err(AppError::Contract(format!(
                "think() called in state {phase:?}"
            )));
        };

        process.send(EngineCommand::MultiPv(multipv)).await?;
        process
            .send(EngineCommand::PositionFen(position.to_owned()))
            .await?;
        process.send(EngineCommand::GoInfinite).await?;

        self.transition(SessionPhase::Thinking);
        info!(rank_count, position, "engine thinking");
        Ok(Analysis::new(self, rank_count))
    }

    /// Interrupt the running search.
    ///
    /// No-op when already `Idle`. The session returns to `Idle` even if the
    /// `stop` command cannot be written, since a dead engine is not thinking.
    ///
    /// # Errors
    ///
    /// - `AppError::Contract`: the session was never started or is terminated.
    /// - `AppError::Io`: the `stop` command could not be written.
    pub async fn stop(&mut self) -> Result<()> {
        let phase = self.state();
        let sent = match &mut self.state {
            SessionState::Idle(_) => return Ok(()),
            SessionState::Thinking(process) => process.send(EngineCommand::Stop).await,
            SessionState::Uninitialized | SessionState::Terminated => {
                return Err(AppError::Contract(format!(
                    "stop() called in state {phase:?}"
                )));
            }
        };

        self.transition(SessionPhase::Idle);
        info!("engine search stopped");
        sent
    }

    /// Stop the drain, send `quit`, and close the pipes. The engine gets
    /// `shutdown_grace` to exit on its own and is killed after that.
    ///
    /// Idempotent, and never fails: teardown problems are logged. The
    /// session is `Terminated` afterwards.
    pub async fn shutdown(&mut self) {
        match std::mem::replace(&mut self.state, SessionState::Terminated) {
            SessionState::Idle(process) | SessionState::Thinking(process) => {
                process.terminate(self.config.shutdown_grace()).await;
                info!("engine session shut down");
            }
            SessionState::Uninitialized | SessionState::Terminated => {}
        }
    }

    pub(crate) fn lines_mut(&mut self) -> Option<&mut tokio::sync::mpsc::Receiver<String>> {
        match &mut self.state {
            SessionState::Idle(process) | SessionState::Thinking(process) => {
                Some(process.lines_mut())
            }
            SessionState::Uninitialized | SessionState::Terminated => None,
        }
    }

    /// Move between the two running states, keeping the process.
    fn transition(&mut self, to: SessionPhase) {
        self.state = match std::mem::replace(&mut self.state, SessionState::Terminated) {
            SessionState::Idle(process) | SessionState::Thinking(process) => match to {
                SessionPhase::Thinking => SessionState::Thinking(process),
                _ => SessionState::Idle(process),
            },
            other => other,
        };
    }
}

/// Write a handshake command; a closed pipe here is a handshake failure.
async fn send_handshake(process: &mut EngineProcess, command: EngineCommand) -> Result<()> {
    process.send(command).await.map_err(|err| match err {
        AppError::Io(msg) => {
            AppError::Handshake(format!("engine stopped accepting commands: {msg}"))
        }
        other => other,
    })
}
