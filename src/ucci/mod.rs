//! UCCI engine stdio protocol.
//!
//! This module owns everything that touches the engine's pipes. The session
//! layer in [`crate::engine`] sequences these pieces into a state machine.
//!
//! Submodules:
//! - `codec`: [`LinesCodec`](tokio_util::codec::LinesCodec)-based line framing with a length cap.
//! - `command`: typed outbound commands and their wire text.
//! - `parser`: `info` line → [`Line`](crate::models::line::Line).
//! - `drain`: background task forwarding stdout lines into the hand-off channel.
//! - `handshake`: bounded wait for `ucciok` / `readyok`.
//! - `spawner`: executable validation, process spawn, and teardown.

pub mod codec;
pub mod command;
pub mod drain;
pub mod handshake;
pub mod parser;
pub mod spawner;
