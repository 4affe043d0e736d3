//! Frame decoding
//!
//! A frame is everything up to and including the first `\r\n\r\n` in the
//! stream. [`FrameDecoder`] does the cutting on an in-memory buffer and knows
//! nothing about I/O; [`FrameReader`] feeds it from any [`AsyncRead`].
//!
//! When the stream ends with bytes that never saw a delimiter, those bytes are
//! still handed out as one last frame.

use std::fmt;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use super::fields::{parse_fields, FieldMap};
use super::{CRLF, FRAME_DELIMITER};
use crate::error::{AmiError, Result};

/// Upper bound on bytes buffered while waiting for a delimiter
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

const READ_CHUNK: usize = 4096;

/// One undecoded protocol message
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame(String);

impl RawFrame {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse this frame into its fields
    pub fn fields(&self) -> FieldMap {
        parse_fields(&self.0)
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawFrame({:?})", self.0)
    }
}

/// Buffer-level frame splitter
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    // Bytes before this offset are known not to start a delimiter.
    scanned: usize,
    max_frame_size: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_size(MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            max_frame_size,
        }
    }

    /// Append received bytes
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes buffered but not yet handed out
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Cut the next complete frame out of the buffer, if there is one
    pub fn decode(&mut self) -> Result<Option<RawFrame>> {
        let delimiter = FRAME_DELIMITER.as_bytes();
        match find(&self.buf[self.scanned..], delimiter) {
            Some(pos) => {
                let end = self.scanned + pos + delimiter.len();
                let frame = RawFrame::from_bytes(&self.buf[..end]);
                self.buf.advance(end);
                self.scanned = 0;
                Ok(Some(frame))
            }
            None => {
                if self.buf.len() > self.max_frame_size {
                    return Err(AmiError::FrameTooLarge {
                        size: self.buf.len(),
                        limit: self.max_frame_size,
                    });
                }
                // A delimiter may straddle the next read.
                self.scanned = self.buf.len().saturating_sub(delimiter.len() - 1);
                Ok(None)
            }
        }
    }

    /// Like [`decode`](Self::decode), but once the stream has ended any
    /// remaining bytes become a final frame
    pub fn decode_eof(&mut self) -> Result<Option<RawFrame>> {
        if let Some(frame) = self.decode()? {
            return Ok(Some(frame));
        }
        if self.buf.is_empty() {
            return Ok(None);
        }
        let frame = RawFrame::from_bytes(&self.buf);
        self.buf.clear();
        self.scanned = 0;
        Ok(Some(frame))
    }

    /// Cut one CRLF-terminated line out of the buffer, without the terminator
    pub fn decode_line(&mut self) -> Result<Option<String>> {
        match find(&self.buf, CRLF.as_bytes()) {
            Some(pos) => {
                let line = String::from_utf8_lossy(&self.buf[..pos]).into_owned();
                self.buf.advance(pos + CRLF.len());
                self.scanned = 0;
                Ok(Some(line))
            }
            None if self.buf.len() > self.max_frame_size => Err(AmiError::FrameTooLarge {
                size: self.buf.len(),
                limit: self.max_frame_size,
            }),
            None => Ok(None),
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Reads frames from an async byte stream
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    decoder: FrameDecoder,
    eof: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_decoder(inner, FrameDecoder::new())
    }

    pub fn with_decoder(inner: R, decoder: FrameDecoder) -> Self {
        Self {
            inner,
            decoder,
            eof: false,
        }
    }

    /// Next frame, or `None` once the stream has ended and the buffer is drained
    pub async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            if let Some(frame) = self.decoder.decode()? {
                trace!("Decoded {} byte frame", frame.as_str().len());
                return Ok(Some(frame));
            }
            if self.eof {
                return self.decoder.decode_eof();
            }
            self.fill().await?;
        }
    }

    /// Next CRLF-terminated line; a trailing unterminated line is returned at
    /// end of stream
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.decoder.decode_line()? {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(self
                    .decoder
                    .decode_eof()?
                    .map(RawFrame::into_string));
            }
            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> Result<()> {
        let buf = self.decoder.buffer_mut();
        buf.reserve(READ_CHUNK);
        let n = self.inner.read_buf(buf).await?;
        trace!("Read {} bytes", n);
        if n == 0 {
            self.eof = true;
        }
        Ok(())
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
