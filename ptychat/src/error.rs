//! Error types for ptychat.
//!
//! Every communication error is fatal to the session that raised it: once
//! the echo stream is out of step there is no safe way to resynchronize, so
//! the caller must drop the session (and usually exit).

use thiserror::Error;

/// Exit status used for communication failures (`ECOMM` on Linux).
pub const ECOMM: i32 = 70;

/// Exit status used for configuration failures (`EX_CONFIG` from sysexits).
pub const EX_CONFIG: i32 = 78;

/// Main error type for ptychat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Protocol-level failure talking to the child
    #[error(transparent)]
    Communication(#[from] CommError),

    /// Invalid session configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The child disconnected or violated the echo/prompt protocol.
    Communication,

    /// The session was configured with unusable settings.
    Config,
}

impl Error {
    /// The category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Communication(_) => ErrorCategory::Communication,
            Error::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether the session that produced this error must be abandoned.
    ///
    /// Always true for communication errors. Configuration errors are raised
    /// before a session exists.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Communication(_))
    }

    /// Process exit status a binary should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Communication => ECOMM,
            ErrorCategory::Config => EX_CONFIG,
        }
    }
}

/// Communication errors between the engine and the child.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// End of input (or a read/write failure) on the channel
    #[error("lost connection to child")]
    LostConnection,

    /// The child sent a byte other than the one the protocol requires
    #[error(
        "[child] expected 0x{expected:02x} {}, found 0x{found:02x} {}",
        printable(.expected),
        printable(.found)
    )]
    UnexpectedByte { expected: u8, found: u8 },

    /// The child went away before prompting; carries what it printed
    #[error("{0}")]
    ChildOutput(String),

    /// A command line that cannot be sent as a single line
    #[error("command contains a newline: {command:?}")]
    InvalidCommand { command: String },
}

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No prompt terminator characters configured
    #[error("at least one prompt terminator is required")]
    NoPromptTerminators,

    /// Prompt characters must be single ASCII bytes
    #[error("prompt character {0:?} is not ASCII")]
    NonAsciiPrompt(char),

    /// A terminator that would swallow part of an escape sequence
    #[error("prompt terminator {0:?} collides with escape sequence parsing")]
    ReservedTerminator(char),

    /// Fabricated cursor position with a zero coordinate
    #[error("cursor position must be non-zero, got row {row} column {col}")]
    InvalidCursorPosition { row: u16, col: u16 },

    /// An inbound buffer that cannot hold a single byte
    #[error("read buffer capacity must be at least 1")]
    ZeroReadCapacity,
}

/// Render a byte the way the mismatch diagnostic shows it.
fn printable(byte: &u8) -> char {
    if byte.is_ascii_graphic() || *byte == b' ' {
        char::from(*byte)
    } else {
        '.'
    }
}

/// Result type alias using ptychat's Error.
pub type Result<T> = std::result::Result<T, Error>;
