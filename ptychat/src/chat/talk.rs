//! Command/echo exchange.

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};

use super::scanner::ESC;
use super::{Chat, TalkFlags};
use crate::error::{CommError, Result};

impl<W, R> Chat<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Send `command` as one line and verify the child echoes it.
    ///
    /// With [`TalkFlags::SWALLOW_PROMPT`] the prompt is consumed first. On
    /// return the inbound channel is positioned just after the echoed line
    /// ending (`\r\n` or `\r\r\n`), ready for [`read_line`](Self::read_line).
    ///
    /// # Errors
    ///
    /// Any echo mismatch or disconnect is fatal. A command containing `\n`
    /// is rejected before anything is sent.
    pub async fn talk(&mut self, command: &str, flags: TalkFlags) -> Result<()> {
        self.talk_bytes(command.as_bytes(), flags).await
    }

    /// Like [`talk`](Self::talk), for command lines that are not UTF-8.
    pub async fn talk_bytes(&mut self, command: &[u8], flags: TalkFlags) -> Result<()> {
        if command.contains(&b'\n') {
            return Err(CommError::InvalidCommand {
                command: String::from_utf8_lossy(command).into_owned(),
            }
            .into());
        }

        let swallow_prompt = flags.contains(TalkFlags::SWALLOW_PROMPT);
        if swallow_prompt {
            self.swallow_prompt().await?;
        }

        if self.config.log_commands {
            debug!("sending command: {:?}", String::from_utf8_lossy(command));
        } else {
            debug!("sending command: <hidden>");
        }
        self.send_flushed(&[command, b"\n"]).await?;

        let mut echo = command;

        // busybox built with FEATURE_EDITING_ASK_TERMINAL may send ESC[6n
        // right after the prompt when its input buffer is empty. It gives up
        // waiting after 20ms, so no reply is needed.
        if swallow_prompt {
            if let Some((&first, rest)) = echo.split_first() {
                if self.expect_byte_or_unread(first).await? {
                    echo = rest;
                } else if self.expect_byte_or_unread(ESC).await? {
                    self.expect_byte(b'[').await?;
                    self.expect_byte(b'6').await?;
                    self.expect_byte(b'n').await?;
                    debug!("absorbed cursor position query ahead of echo");
                }
            }
        }

        for &byte in echo {
            self.expect_byte(byte).await?;
        }

        // What a terminal sends back for our \n; some layers double the \r.
        self.expect_byte(b'\r').await?;
        self.expect_byte_or_unread(b'\r').await?;
        self.expect_byte(b'\n').await
    }

    /// Talk each command in order, stopping at the first failure.
    pub async fn talk_all<I, S>(&mut self, commands: I, flags: TalkFlags) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for command in commands {
            self.talk(command.as_ref(), flags).await?;
        }
        Ok(())
    }
}
