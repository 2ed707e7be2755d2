//! Byte channel pair bound to one child session.
//!
//! The outbound half feeds the child's input; the inbound half reads its
//! output through a buffer with a single byte of push-back.

use std::io;

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Default capacity of the inbound read buffer.
pub const DEFAULT_READ_CAPACITY: usize = 8 * 1024;

/// Outbound sink and inbound source for a single child.
///
/// Reads never report errors: the protocol treats a failed read the same as
/// end of input, so both surface as `None`.
#[derive(Debug)]
pub struct ChatChannel<W, R> {
    /// Stream to the child's input.
    to: W,

    /// Buffered stream from the child's output.
    from: BufReader<R>,

    /// One-byte lookahead slot filled by [`unread`](Self::unread).
    pushback: Option<u8>,
}

/// The streams held by a channel, handed back by
/// [`ChatChannel::into_parts`].
#[derive(Debug)]
pub struct ChannelParts<W, R> {
    /// Stream to the child's input.
    pub to: W,

    /// Stream from the child's output, including anything already buffered.
    pub from: BufReader<R>,

    /// A byte that was pushed back and not yet re-read.
    pub unread: Option<u8>,
}

impl<W, R> ChatChannel<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Bind a channel to an already-open pair of streams.
    pub fn new(to: W, from: R) -> Self {
        Self::with_capacity(DEFAULT_READ_CAPACITY, to, from)
    }

    /// Bind a channel with a specific inbound buffer capacity (at least 1).
    pub fn with_capacity(capacity: usize, to: W, from: R) -> Self {
        Self {
            to,
            from: BufReader::with_capacity(capacity.max(1), from),
            pushback: None,
        }
    }

    /// Read the next inbound byte, or `None` at end of input.
    pub async fn next_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.pushback.take() {
            return Some(byte);
        }

        match self.from.read_u8().await {
            Ok(byte) => Some(byte),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => None,
            Err(e) => {
                debug!("read from child failed: {}", e);
                None
            }
        }
    }

    /// Push a byte back so the next read returns it again.
    ///
    /// Only one byte of lookahead exists; callers must re-read before
    /// pushing back another.
    pub fn unread(&mut self, byte: u8) {
        debug_assert!(self.pushback.is_none(), "push-back slot already full");
        self.pushback = Some(byte);
    }

    /// Read one line including its `\n`, or up to end of input.
    ///
    /// Returns `None` when nothing at all could be read.
    pub async fn read_line_raw(&mut self) -> Option<Vec<u8>> {
        let mut line = Vec::new();

        if let Some(byte) = self.pushback.take() {
            line.push(byte);
            if byte == b'\n' {
                return Some(line);
            }
        }

        if let Err(e) = self.from.read_until(b'\n', &mut line).await {
            debug!("read from child failed: {}", e);
            return None;
        }

        if line.is_empty() { None } else { Some(line) }
    }

    /// Write bytes to the child without flushing.
    pub async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.to.write_all(data).await
    }

    /// Flush pending outbound bytes.
    pub async fn flush(&mut self) -> io::Result<()> {
        self.to.flush().await
    }

    /// Take the streams back out of the channel.
    pub fn into_parts(self) -> ChannelParts<W, R> {
        ChannelParts {
            to: self.to,
            from: self.from,
            unread: self.pushback,
        }
    }
}
