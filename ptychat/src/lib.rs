//! # ptychat
//!
//! Async expect-style engine for driving an interactive shell over a
//! pseudo-terminal.
//!
//! ptychat talks to a shell running in a child process through two byte
//! streams: one to the child's input, one from its output. It sends command
//! lines and checks that the terminal echoes them back byte for byte, finds
//! the shell prompt even when it is tangled up with terminal escape
//! sequences, and answers the terminal status queries some shells send
//! before prompting so they do not stall.
//!
//! ## Features
//!
//! - Works over any `tokio` `AsyncRead`/`AsyncWrite` pair (PTY master, SSH
//!   channel stream, in-memory duplex)
//! - Prompt detection that answers `ESC [ 5 n` and `ESC [ 6 n`
//! - Exact echo verification, tolerating `\r\r\n` line endings
//! - Fatal, non-recoverable errors with diagnostics (expected vs. found
//!   byte, or whatever the child printed before dying)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ptychat::{Chat, TalkFlags};
//!
//! # async fn example(pty: tokio::fs::File) -> Result<(), ptychat::Error> {
//! let mut chat = Chat::from_stream(pty);
//!
//! chat.talk("echo hello", TalkFlags::SWALLOW_PROMPT).await?;
//! let line = chat.read_line().await?;
//! assert_eq!(line, "hello");
//! # Ok(())
//! # }
//! ```
//!
//! Errors are never retried: if `talk` fails, the session is out of step
//! with the child. Drop it and exit with [`Error::exit_code`].

pub mod channel;
pub mod chat;
pub mod error;

// Re-export main types for convenience
pub use channel::{ChannelParts, ChatChannel};
pub use chat::{Chat, ChatBuilder, ChatConfig, TalkFlags};
pub use error::{CommError, ConfigError, Error, ErrorCategory, Result};
