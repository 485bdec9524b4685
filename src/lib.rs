#![forbid(unsafe_code)]

//! Client for UCCI analysis engines driven over stdio.
//!
//! Start an [`EngineSession`], ask it to think about a position, and poll
//! the returned [`Analysis`](engine::Analysis) for the current best lines.

pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod ucci;

pub use config::EngineConfig;
pub use engine::EngineSession;
pub use errors::{AppError, Result};
pub use models::line::{Evaluation, Line};
