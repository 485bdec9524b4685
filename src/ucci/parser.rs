//! Parser for engine `info` lines.
//!
//! Only lines that look like full analysis reports are turned into
//! [`Line`]s. Handshake acknowledgements, `info` lines carrying only search
//! statistics, and any other chatter are reported as "not an analysis line"
//! (`Ok(None)`).
//!
//! | Keyword   | Value                                   |
//! |-----------|-----------------------------------------|
//! | `depth`   | next token, unsigned integer            |
//! | `multipv` | next token, unsigned integer (rank)     |
//! | `score`   | next token, float                       |
//! | `mate`    | next token, signed integer              |
//! | `pv`      | every remaining token up to the cap     |
//! | *(other)* | skipped                                 |

use std::str::FromStr;

use crate::models::line::Line;
use crate::{AppError, Result};

/// Default minimum token count for a line to be considered an analysis report.
pub const MIN_INFO_TOKENS: usize = 20;

/// Default cap on principal-variation moves kept per line.
pub const MAX_PV_MOVES: usize = 12;

/// Thresholds applied by [`parse_info_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Lines with fewer whitespace-separated tokens are ignored.
    pub min_tokens: usize,
    /// Principal variations are truncated to this many moves.
    pub max_pv_moves: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            min_tokens: MIN_INFO_TOKENS,
            max_pv_moves: MAX_PV_MOVES,
        }
    }
}

/// Parse one raw engine output line.
///
/// # Return value
///
/// - `Ok(Some(line))`: an analysis report.
/// - `Ok(None)`: no `info` token, or fewer than `limits.min_tokens` tokens.
///
/// A missing `multipv` field means rank 1, as single-PV engines omit it.
///
/// # Errors
///
/// Returns [`AppError::Protocol`] when a numeric field is malformed or a
/// keyword has no value. The caller drops the line.
pub fn parse_info_line(raw: &str, limits: &ParseLimits) -> Result<Option<Line>> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < limits.min_tokens || !tokens.contains(&"info") {
        return Ok(None);
    }

    let mut rank = 1;
    let mut depth = 0;
    let mut score = 0.0;
    let mut mate = None;
    let mut moves = Vec::new();

    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match token {
            "depth" => depth = numeric_value(token, iter.next())?,
            "multipv" => rank = numeric_value(token, iter.next())?,
            "score" => score = numeric_value(token, iter.next())?,
            "mate" => mate = Some(numeric_value(token, iter.next())?),
            "pv" => {
                moves = iter
                    .by_ref()
                    .take(limits.max_pv_moves)
                    .map(str::to_owned)
                    .collect();
                break;
            }
            _ => {}
        }
    }

    Ok(Some(Line::new(rank, depth, score, mate, moves)))
}

fn numeric_value<T>(keyword: &str, value: Option<&str>) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value =
        value.ok_or_else(|| AppError::Protocol(format!("missing value for `{keyword}`")))?;
    value
        .parse()
        .map_err(|e| AppError::Protocol(format!("malformed `{keyword}` value {value:?}: {e}")))
}
