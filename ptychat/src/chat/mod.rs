//! Chat session: the expect-style protocol spoken with an interactive shell.
//!
//! A [`Chat`] owns the byte channel to one child. The primitives here read
//! and assert single bytes; [`Chat::swallow_prompt`] finds the shell prompt
//! while answering terminal status queries, and [`Chat::talk`] sends a
//! command line and verifies its echo.
//!
//! Every failure is fatal: once an error is returned the session is out of
//! step with the child and must be dropped.

mod config;
mod flags;
mod scanner;
mod talk;

pub use config::{ChatBuilder, ChatConfig};
pub use flags::TalkFlags;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

use crate::channel::{ChannelParts, ChatChannel};
use crate::error::{CommError, Error, Result};

/// One interactive session with a child process.
///
/// # Example
///
/// ```rust,no_run
/// use ptychat::{Chat, TalkFlags};
///
/// # async fn example(pty: tokio::fs::File) -> Result<(), ptychat::Error> {
/// let mut chat = Chat::from_stream(pty);
/// chat.talk("uname -r", TalkFlags::SWALLOW_PROMPT).await?;
/// let release = chat.read_line().await?;
/// println!("kernel {}", release);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Chat<W, R> {
    /// The byte channel to the child.
    channel: ChatChannel<W, R>,

    /// Session configuration (validated).
    config: ChatConfig,
}

impl<W, R> Chat<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Create a session with the default configuration.
    pub fn new(to: W, from: R) -> Self {
        let config = ChatConfig::default();
        Self {
            channel: ChatChannel::with_capacity(config.read_buffer_capacity, to, from),
            config,
        }
    }

    /// Create a session with a custom configuration.
    pub fn with_config(to: W, from: R, config: ChatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            channel: ChatChannel::with_capacity(config.read_buffer_capacity, to, from),
            config,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Read one byte from the child.
    ///
    /// End of input is fatal.
    pub async fn read_byte(&mut self) -> Result<u8> {
        self.channel.next_byte().await.ok_or_else(lost_connection)
    }

    /// Read one byte and fail unless it is `expected`.
    pub async fn expect_byte(&mut self, expected: u8) -> Result<()> {
        let found = self.read_byte().await?;
        if found != expected {
            let err = CommError::UnexpectedByte { expected, found };
            debug!("{}", err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Read one byte; if it is not `expected`, push it back.
    ///
    /// Returns whether the byte matched. A mismatch is not an error; end of
    /// input still is.
    pub async fn expect_byte_or_unread(&mut self, expected: u8) -> Result<bool> {
        let found = self.read_byte().await?;
        if found != expected {
            self.channel.unread(found);
            return Ok(false);
        }
        Ok(true)
    }

    /// Read one line of output with trailing `\r` and `\n` removed.
    pub async fn read_line(&mut self) -> Result<String> {
        let line = self.read_line_bytes().await?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Read one line of output as raw bytes with trailing `\r` and `\n`
    /// removed.
    pub async fn read_line_bytes(&mut self) -> Result<Vec<u8>> {
        let mut line = self
            .channel
            .read_line_raw()
            .await
            .ok_or_else(lost_connection)?;

        let keep = line
            .iter()
            .rposition(|b| *b != b'\r' && *b != b'\n')
            .map_or(0, |pos| pos + 1);
        line.truncate(keep);

        trace!("read line: {:?}", String::from_utf8_lossy(&line));
        Ok(line)
    }

    /// Write `data` and flush it; failure is fatal.
    async fn send_flushed(&mut self, data: &[&[u8]]) -> Result<()> {
        for chunk in data {
            if let Err(e) = self.channel.send(chunk).await {
                debug!("write to child failed: {}", e);
                return Err(lost_connection());
            }
        }
        if let Err(e) = self.channel.flush().await {
            debug!("flush to child failed: {}", e);
            return Err(lost_connection());
        }
        Ok(())
    }

    /// End the session and take the streams back.
    pub fn into_parts(self) -> ChannelParts<W, R> {
        self.channel.into_parts()
    }
}

impl<S> Chat<WriteHalf<S>, ReadHalf<S>>
where
    S: AsyncRead + AsyncWrite,
{
    /// Create a session around one bidirectional stream (e.g. a PTY master).
    pub fn from_stream(stream: S) -> Self {
        let (from, to) = tokio::io::split(stream);
        Self::new(to, from)
    }
}

fn lost_connection() -> Error {
    debug!("lost connection to child");
    CommError::LostConnection.into()
}
