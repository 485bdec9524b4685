//! Engine session and live analysis.
//!
//! - `session`: process ownership, handshake, and the
//!   `Uninitialized → Idle → Thinking` state machine.
//! - `analysis`: windowed polling of engine output into a ranked snapshot.

pub mod analysis;
pub mod session;

pub use analysis::{Analysis, Snapshot};
pub use session::{EngineSession, SessionPhase, MAX_RANKS};
