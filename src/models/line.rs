//! Ranked analysis line reported by the engine.

use std::fmt::{Display, Formatter};

/// Engine evaluation attached to a [`Line`].
///
/// Exactly one of score or mate distance is meaningful for a line, so the two
/// are alternatives rather than sibling fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Centipawn-equivalent score from the side to move.
    Score(f32),
    /// Forced mate in this many moves; negative when the side to move is mated.
    Mate(i32),
}

/// One ranked result of a multi-PV search.
///
/// Immutable once built; the parser is the only producer.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    rank: u32,
    depth: u32,
    evaluation: Evaluation,
    moves: Vec<String>,
}

impl Line {
    /// Build a line from its parts.
    ///
    /// A `mate` of `Some(0)` is treated as "no mate", matching the protocol's
    /// convention that zero means no forced mate.
    #[must_use]
    pub fn new(rank: u32, depth: u32, score: f32, mate: Option<i32>, moves: Vec<String>) -> Self {
        let evaluation = match mate {
            Some(distance) if distance != 0 => Evaluation::Mate(distance),
            _ => Evaluation::Score(score),
        };

        Self {
            rank,
            depth,
            evaluation,
            moves,
        }
    }

    /// 1-based rank (`multipv`) of this line.
    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Search depth the line was reported at.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Authoritative evaluation of the line.
    #[must_use]
    pub fn evaluation(&self) -> Evaluation {
        self.evaluation
    }

    /// Score, unless the line is a forced mate.
    #[must_use]
    pub fn score(&self) -> Option<f32> {
        match self.evaluation {
            Evaluation::Score(score) => Some(score),
            Evaluation::Mate(_) => None,
        }
    }

    /// Mate distance, if the line is a forced mate.
    #[must_use]
    pub fn mate(&self) -> Option<i32> {
        match self.evaluation {
            Evaluation::Mate(distance) => Some(distance),
            Evaluation::Score(_) => None,
        }
    }

    /// Principal variation in engine order.
    #[must_use]
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Principal variation joined with single spaces.
    #[must_use]
    pub fn pv(&self) -> String {
        self.moves.join(" ")
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. depth: {}", self.rank, self.depth)?;
        match self.evaluation {
            Evaluation::Mate(distance) => write!(f, " #{distance}")?,
            Evaluation::Score(score) => write!(f, " ({score})")?,
        }
        write!(f, ": {}", self.pv())
    }
}
