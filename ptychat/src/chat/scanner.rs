//! Prompt detection.
//!
//! Shell output is consumed a byte at a time until a prompt terminator
//! shows up. Along the way the scanner decodes just enough of the CSI
//! escape syntax to spot device status reports (`ESC [ 5 n` and
//! `ESC [ 6 n`) and answer them. Some systems run busybox `resize` when an
//! interactive shell connects; left unanswered, its cursor query stalls the
//! shell for several seconds before the prompt appears.
//!
//! Control sequence reference:
//! <http://invisible-island.net/xterm/ctlseqs/ctlseqs.html>

use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use super::Chat;
use crate::channel::PrePromptBuffer;
use crate::error::{CommError, Result};

pub(crate) const ESC: u8 = 0x1b;

/// Reply to `ESC [ 5 n`: "terminal OK".
const STATUS_OK: &[u8] = b"\x1b[0n";

/// Where the scanner is within an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Ordinary text.
    Normal,

    /// Saw `ESC`.
    AfterEscape,

    /// Saw `ESC [`, accumulating a numeric argument.
    AfterCsi { arg: u32 },
}

/// What the session should do with the byte just scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Nothing.
    Skip,

    /// Keep the byte as plain pre-prompt text.
    Plain(u8),

    /// A device status report request with the given argument.
    StatusQuery(u32),
}

impl ScanState {
    /// Advance by one byte.
    fn advance(self, byte: u8) -> (ScanState, Action) {
        match self {
            ScanState::Normal => Self::on_normal(byte),
            ScanState::AfterEscape => Self::on_escape(byte),
            ScanState::AfterCsi { arg } => Self::on_csi(arg, byte),
        }
    }

    fn on_normal(byte: u8) -> (ScanState, Action) {
        if byte == ESC {
            (ScanState::AfterEscape, Action::Skip)
        } else {
            (ScanState::Normal, Action::Plain(byte))
        }
    }

    // Anything but `[` abandons the sequence; the byte is dropped too.
    fn on_escape(byte: u8) -> (ScanState, Action) {
        if byte == b'[' {
            (ScanState::AfterCsi { arg: 0 }, Action::Skip)
        } else {
            (ScanState::Normal, Action::Skip)
        }
    }

    fn on_csi(arg: u32, byte: u8) -> (ScanState, Action) {
        match byte {
            b'0'..=b'9' => {
                let arg = arg
                    .saturating_mul(10)
                    .saturating_add(u32::from(byte - b'0'));
                (ScanState::AfterCsi { arg }, Action::Skip)
            }
            b'n' => (ScanState::Normal, Action::StatusQuery(arg)),
            _ => (ScanState::Normal, Action::Skip),
        }
    }
}

impl<W, R> Chat<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Consume output up to and including the shell prompt.
    ///
    /// Status queries seen on the way are answered. The prompt terminator
    /// must be followed by the prompt suffix (a space by default).
    ///
    /// If the child disconnects first, the error carries whatever plain text
    /// it printed, trailing whitespace trimmed.
    pub async fn swallow_prompt(&mut self) -> Result<()> {
        let mut state = ScanState::Normal;
        let mut pre_prompt = PrePromptBuffer::new(self.config.pre_prompt_capacity);

        loop {
            let Some(byte) = self.channel.next_byte().await else {
                pre_prompt.trim_trailing_whitespace();
                if pre_prompt.is_empty() {
                    return Err(super::lost_connection());
                }
                let output = pre_prompt.into_string_lossy();
                debug!("child disconnected before prompting: {:?}", output);
                return Err(CommError::ChildOutput(output).into());
            };

            // A prompt character wins in every state.
            if self.config.is_prompt_terminator(byte) {
                debug!("prompt detected: {:?}", char::from(byte));
                break;
            }

            let (next, action) = state.advance(byte);
            if next != state {
                trace!("scanner {:?} -> {:?} on 0x{:02x}", state, next, byte);
            }

            match action {
                Action::Skip => {}
                Action::Plain(byte) => pre_prompt.push(byte),
                Action::StatusQuery(arg) => self.answer_status_query(arg).await?,
            }
            state = next;
        }

        let suffix = self.config.prompt_suffix_byte();
        self.expect_byte(suffix).await
    }

    /// Reply to `ESC [ <arg> n`.
    async fn answer_status_query(&mut self, arg: u32) -> Result<()> {
        match arg {
            5 => {
                debug!("answering terminal status query");
                self.send_flushed(&[STATUS_OK]).await
            }
            6 => {
                debug!("answering cursor position query");
                let report = self.config.cursor_report();
                self.send_flushed(&[report.as_slice()]).await
            }
            other => {
                warn!("ignoring device status report request {}", other);
                self.send_flushed(&[]).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatBuilder;
    use crate::error::Error;
    use tokio_test::io::Builder;

    fn scan(bytes: &[u8]) -> (ScanState, Vec<Action>) {
        let mut state = ScanState::Normal;
        let mut actions = Vec::new();
        for &b in bytes {
            let (next, action) = state.advance(b);
            state = next;
            actions.push(action);
        }
        (state, actions)
    }

    #[test]
    fn test_plain_text_stays_normal() {
        let (state, actions) = scan(b"ok");
        assert_eq!(state, ScanState::Normal);
        assert_eq!(actions, vec![Action::Plain(b'o'), Action::Plain(b'k')]);
    }

    #[test]
    fn test_csi_accumulates_argument() {
        let (state, actions) = scan(b"\x1b[12");
        assert_eq!(state, ScanState::AfterCsi { arg: 12 });
        assert!(actions.iter().all(|a| *a == Action::Skip));
    }

    #[test]
    fn test_csi_argument_resets() {
        let (_, actions) = scan(b"\x1b[9m\x1b[6n");
        assert_eq!(actions.last(), Some(&Action::StatusQuery(6)));
    }

    #[test]
    fn test_csi_argument_saturates() {
        let (state, _) = scan(b"\x1b[99999999999999999999");
        assert_eq!(state, ScanState::AfterCsi { arg: u32::MAX });
    }

    #[test]
    fn test_abandoned_escape_drops_byte() {
        let (state, actions) = scan(b"\x1bx");
        assert_eq!(state, ScanState::Normal);
        assert_eq!(actions, vec![Action::Skip, Action::Skip]);
    }

    #[tokio::test]
    async fn test_answers_cursor_query_before_prompt() {
        let mock = Builder::new()
            .read(b"some text\x1b[6n")
            .write(b"\x1b[25;80R")
            .read(b"$ ")
            .build();

        let mut chat = Chat::from_stream(mock);
        chat.swallow_prompt().await.unwrap();
    }

    #[tokio::test]
    async fn test_answers_status_query() {
        let mock = Builder::new()
            .read(b"\x1b[5n")
            .write(b"\x1b[0n")
            .read(b"# ")
            .build();

        let mut chat = Chat::from_stream(mock);
        chat.swallow_prompt().await.unwrap();
    }

    #[tokio::test]
    async fn test_stops_right_after_prompt_space() {
        let mut chat = Chat::new(Vec::new(), &b"some text\x1b[6n$ rest"[..]);
        chat.swallow_prompt().await.unwrap();
        assert_eq!(chat.read_line().await.unwrap(), "rest");

        let parts = chat.into_parts();
        assert_eq!(parts.to, b"\x1b[25;80R");
    }

    #[tokio::test]
    async fn test_status_query_reply_written_once() {
        let mut chat = Chat::new(Vec::new(), &b"\x1b[5n# "[..]);
        chat.swallow_prompt().await.unwrap();
        assert_eq!(chat.into_parts().to, b"\x1b[0n");
    }

    #[tokio::test]
    async fn test_unknown_csi_final_writes_nothing() {
        let mut chat = Chat::new(Vec::new(), &b"\x1b[6m$ "[..]);
        chat.swallow_prompt().await.unwrap();
        assert!(chat.into_parts().to.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_argument_writes_nothing() {
        let mut chat = Chat::new(Vec::new(), &b"\x1b[7n# "[..]);
        chat.swallow_prompt().await.unwrap();
        assert!(chat.into_parts().to.is_empty());
    }

    #[tokio::test]
    async fn test_escape_bytes_are_not_plain_text() {
        let mut chat = Chat::new(Vec::new(), &b"ab\x1b[6mcd\x1bxe\n"[..]);
        let err = chat.swallow_prompt().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Communication(CommError::ChildOutput(ref text)) if text == "abcde"
        ));
    }

    #[tokio::test]
    async fn test_eof_reports_pre_prompt_text() {
        let mut chat = Chat::new(Vec::new(), &b"boot failed \r\n"[..]);
        let err = chat.swallow_prompt().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "boot failed");
    }

    #[tokio::test]
    async fn test_eof_without_output_is_lost_connection() {
        let mut chat = Chat::new(Vec::new(), &b" \r\n\x1b[5"[..]);
        let err = chat.swallow_prompt().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Communication(CommError::LostConnection)
        ));
    }

    #[tokio::test]
    async fn test_prompt_wins_inside_escape_sequence() {
        let mut chat = Chat::new(Vec::new(), &b"\x1b[1$ "[..]);
        chat.swallow_prompt().await.unwrap();
        assert!(chat.into_parts().to.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_requires_space() {
        let mut chat = Chat::new(Vec::new(), &b"cost: 5$x"[..]);
        let err = chat.swallow_prompt().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Communication(CommError::UnexpectedByte {
                expected: b' ',
                found: b'x'
            })
        ));
    }

    #[tokio::test]
    async fn test_custom_terminators_and_cursor() {
        let mut chat = ChatBuilder::new()
            .prompt_terminators(">")
            .cursor_position(50, 132)
            .build(Vec::new(), &b"$#\x1b[6n> "[..])
            .unwrap();
        chat.swallow_prompt().await.unwrap();
        assert_eq!(chat.into_parts().to, b"\x1b[50;132R");
    }
}
