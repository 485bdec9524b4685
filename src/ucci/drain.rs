//! Engine output drain task.
//!
//! Reads newline-delimited text from the engine's stdout and hands every line,
//! in order, to the single consumer through a tokio [`mpsc`] channel. The
//! session creates that channel with capacity one, so the drain parks on
//! `send` until the consumer takes the previous line.
//!
//! The drain never interprets lines; parsing belongs to whoever is consuming
//! (the handshake wait or the analysis poller).

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ucci::codec::UcciCodec;
use crate::AppError;

/// Drain task: forwards each stdout line from the engine into `line_tx`.
///
/// The task returns when:
/// - `cancel` fires, including while parked on a full channel,
/// - the engine closes stdout (EOF),
/// - an I/O error occurs on the pipe, or
/// - the receiving side has been dropped.
///
/// It never restarts; dropping `line_tx` on return is what tells the consumer
/// the engine is gone. Over-long lines are logged and skipped.
pub async fn run_drain<R>(
    stdout: R,
    max_line_bytes: usize,
    line_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stdout, UcciCodec::with_max_length(max_line_bytes));

    loop {
        let item = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("ucci drain: cancellation received, stopping");
                break;
            }

            item = framed.next() => item,
        };

        match item {
            None => {
                debug!("ucci drain: EOF on engine stdout");
                break;
            }

            Some(Err(AppError::Protocol(ref msg))) => {
                warn!(error = msg.as_str(), "ucci drain: framing error, skipping");
            }

            Some(Err(e)) => {
                warn!(error = %e, "ucci drain: IO error, stopping");
                break;
            }

            Some(Ok(line)) => {
                tokio::select! {
                    biased;

                    () = cancel.cancelled() => {
                        debug!("ucci drain: cancelled during hand-off, stopping");
                        break;
                    }

                    sent = line_tx.send(line) => {
                        if sent.is_err() {
                            debug!("ucci drain: consumer dropped, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}
