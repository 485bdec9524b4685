//! Live multi-PV analysis snapshot.
//!
//! [`Snapshot`] is the aggregator: it keeps the most recent [`Line`] seen for
//! each rank and a cached copy of the last non-empty assembled result.
//! [`Analysis`] binds a snapshot to the session that issued the think request,
//! so the snapshot can pull engine output and interrupt the search.
//!
//! Polling is windowed: each call drains whatever the engine reports during
//! the window, then returns the best-known ranked set. Once anything has been
//! seen, a quiet window returns the previous result instead of an empty one.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::engine::session::EngineSession;
use crate::models::line::Line;
use crate::ucci::parser::{parse_info_line, ParseLimits};
use crate::Result;

/// Rank table and cached result for one think request.
#[derive(Debug, Clone)]
pub struct Snapshot {
    limits: ParseLimits,
    slots: Vec<Option<Line>>,
    cached: Vec<Line>,
    stopped: bool,
    engine_alive: bool,
}

impl Snapshot {
    /// Empty snapshot tracking ranks `1..=rank_count`.
    #[must_use]
    pub fn new(rank_count: usize, limits: ParseLimits) -> Self {
        Self {
            limits,
            slots: vec![None; rank_count],
            cached: Vec::new(),
            stopped: false,
            engine_alive: true,
        }
    }

    /// Number of ranks this snapshot tracks.
    #[must_use]
    pub fn rank_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// False once the engine's output channel has closed.
    #[must_use]
    pub fn engine_alive(&self) -> bool {
        self.engine_alive
    }

    /// Make the snapshot inert; later polls report completion.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Fold one raw engine line into the rank table.
    ///
    /// Returns `true` if the line filled or replaced a slot. Non-analysis
    /// lines, ranks outside `1..=rank_count`, and malformed lines are
    /// ignored; malformed lines are logged.
    pub fn absorb(&mut self, raw: &str) -> bool {
        let line = match parse_info_line(raw, &self.limits) {
            Ok(Some(line)) => line,
            Ok(None) => return false,
            Err(err) => {
                warn!(%err, raw, "analysis: dropping malformed info line");
                return false;
            }
        };

        let Some(index) = (line.rank() as usize).checked_sub(1) else {
            return false;
        };
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(line);
                true
            }
            None => {
                debug!(rank = line.rank(), "analysis: rank out of range, ignoring");
                false
            }
        }
    }

    /// Drain `lines` for `window`, then return the current snapshot.
    ///
    /// Returns `None` if the snapshot is stopped, without touching the
    /// channel. Otherwise returns the filled ranks in ascending order, or the
    /// previous result if nothing arrived during this window.
    ///
    /// The window ends early when the channel closes, so a dead engine never
    /// makes this wait longer than `window`. A line still parked in the
    /// channel when the window ends is picked up by the next call.
    pub async fn poll(
        &mut self,
        lines: &mut mpsc::Receiver<String>,
        window: Duration,
    ) -> Option<&[Line]> {
        if self.stopped {
            return None;
        }

        let deadline = Instant::now() + window;
        while self.engine_alive {
            match tokio::time::timeout_at(deadline, lines.recv()).await {
                Ok(Some(raw)) => {
                    self.absorb(&raw);
                }
                Ok(None) => {
                    debug!("analysis: engine output closed");
                    self.engine_alive = false;
                }
                Err(_elapsed) => break,
            }
        }

        let assembled: Vec<Line> = self.slots.iter().flatten().cloned().collect();
        if !assembled.is_empty() {
            self.cached = assembled;
        }

        Some(&self.cached)
    }
}

/// Analysis in progress on an [`EngineSession`].
///
/// Holds the session's unique borrow, so a new think request (or shutdown)
/// can only happen after this value is dropped.
#[derive(Debug)]
pub struct Analysis<'s> {
    session: &'s mut EngineSession,
    snapshot: Snapshot,
}

impl<'s> Analysis<'s> {
    pub(crate) fn new(session: &'s mut EngineSession, rank_count: usize) -> Self {
        let limits = session.config().parse_limits();
        Self {
            session,
            snapshot: Snapshot::new(rank_count, limits),
        }
    }

    /// Pull engine output for one polling window and return the ranked lines.
    ///
    /// Returns `None` once the analysis has been stopped.
    pub async fn poll(&mut self) -> Option<&[Line]> {
        if self.snapshot.is_stopped() {
            return None;
        }

        let window = self.session.config().poll_window();
        match self.session.lines_mut() {
            Some(lines) => self.snapshot.poll(lines, window).await,
            None => {
                self.snapshot.engine_alive = false;
                Some(&self.snapshot.cached)
            }
        }
    }

    /// Mark the snapshot stopped without telling the engine.
    pub fn stop(&mut self) {
        self.snapshot.stop();
    }

    /// Send `stop` to the engine and mark the snapshot stopped.
    ///
    /// # Errors
    ///
    /// Propagates `AppError::Io` if the command cannot be written; the
    /// snapshot is stopped either way.
    pub async fn interrupt(&mut self) -> Result<()> {
        self.snapshot.stop();
        self.session.stop().await
    }

    /// Number of ranks requested from the engine.
    #[must_use]
    pub fn rank_count(&self) -> usize {
        self.snapshot.rank_count()
    }

    /// False once the engine's output has closed (process exited).
    #[must_use]
    pub fn engine_alive(&self) -> bool {
        self.snapshot.engine_alive()
    }
}
