//! Line codec for UCCI engine pipes.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a maximum line length so an
//! engine that never emits a newline cannot make the drain allocate without
//! bound.
//!
//! Use [`UcciCodec`] with [`tokio_util::codec::FramedRead`] over the engine's
//! stdout and [`tokio_util::codec::FramedWrite`] over its stdin. Trailing
//! `\r` bytes are stripped on decode, so engines built for Windows line
//! endings are read transparently.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Default maximum inbound line length: 64 KiB.
///
/// A full `info` line with a long principal variation is a few hundred bytes;
/// anything near this limit is garbage.
pub const MAX_LINE_BYTES: usize = 65_536;

/// Newline-delimited UTF-8 codec for engine stdio.
#[derive(Debug)]
pub struct UcciCodec {
    inner: LinesCodec,
    max_length: usize,
}

impl UcciCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_BYTES)
    }

    /// Create a codec that rejects inbound lines longer than `max_length`.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
            max_length,
        }
    }

    /// Configured inbound limit in bytes.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn map_error(&self, e: LinesCodecError) -> AppError {
        match e {
            LinesCodecError::MaxLineLengthExceeded => AppError::Protocol(format!(
                "line too long: exceeded {} bytes",
                self.max_length
            )),
            LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
        }
    }
}

impl Default for UcciCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for UcciCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.inner.decode(src).map_err(|e| self.map_error(e))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.inner.decode_eof(src).map_err(|e| self.map_error(e))
    }
}

impl Encoder<String> for UcciCodec {
    type Error = AppError;

    /// Encode `item` as a `\n`-terminated line.
    ///
    /// The length limit is a decoder-side concern and is not applied here.
    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.inner.encode(item, dst).map_err(|e| self.map_error(e))
    }
}
