//! Outbound UCCI commands.

use std::fmt::{Display, Formatter};

/// Command written to the engine's stdin, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Select the UCCI protocol; answered with `ucciok`.
    Ucci,
    /// Readiness probe; answered with `readyok`.
    IsReady,
    /// Number of principal variations to report.
    MultiPv(u16),
    /// Set the position from a FEN string.
    PositionFen(String),
    /// Start an unbounded search.
    GoInfinite,
    /// Interrupt the running search.
    Stop,
    /// Ask the engine process to exit.
    Quit,
}

impl Display for EngineCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ucci => f.write_str("ucci"),
            Self::IsReady => f.write_str("isready"),
            Self::MultiPv(n) => write!(f, "setoption MultiPV {n}"),
            Self::PositionFen(fen) => write!(f, "position fen {fen}"),
            Self::GoInfinite => f.write_str("go depth infinite"),
            Self::Stop => f.write_str("stop"),
            Self::Quit => f.write_str("quit"),
        }
    }
}
