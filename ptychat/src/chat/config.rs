//! Session configuration and builder.

use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

use super::Chat;
use crate::channel::DEFAULT_READ_CAPACITY;
use crate::error::{ConfigError, Result};

/// Configuration for a chat session.
///
/// Deserializable so a host application can embed it in its own config
/// file; every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Characters that end a shell prompt.
    pub prompt_terminators: String,

    /// Character that must follow a prompt terminator.
    pub prompt_suffix: char,

    /// Row reported in answer to a cursor position query.
    pub cursor_row: u16,

    /// Column reported in answer to a cursor position query.
    pub cursor_col: u16,

    /// Initial capacity of the pre-prompt diagnostic buffer.
    pub pre_prompt_capacity: usize,

    /// Capacity of the inbound read buffer.
    pub read_buffer_capacity: usize,

    /// Whether command text appears in debug logs.
    pub log_commands: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            prompt_terminators: "#$".to_string(),
            prompt_suffix: ' ',
            cursor_row: 25,
            cursor_col: 80,
            pre_prompt_capacity: 256,
            read_buffer_capacity: DEFAULT_READ_CAPACITY,
            log_commands: true,
        }
    }
}

impl ChatConfig {
    /// Check that the configuration can drive the protocol.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.prompt_terminators.is_empty() {
            return Err(ConfigError::NoPromptTerminators);
        }

        for c in self.prompt_terminators.chars() {
            if !c.is_ascii() {
                return Err(ConfigError::NonAsciiPrompt(c));
            }
            if c == '\x1b' || c == '[' || c.is_ascii_digit() {
                return Err(ConfigError::ReservedTerminator(c));
            }
        }

        if !self.prompt_suffix.is_ascii() {
            return Err(ConfigError::NonAsciiPrompt(self.prompt_suffix));
        }

        if self.cursor_row == 0 || self.cursor_col == 0 {
            return Err(ConfigError::InvalidCursorPosition {
                row: self.cursor_row,
                col: self.cursor_col,
            });
        }

        // A zero-sized BufReader reports every fill as end of input.
        if self.read_buffer_capacity == 0 {
            return Err(ConfigError::ZeroReadCapacity);
        }

        Ok(())
    }

    /// Whether `byte` ends a prompt.
    pub fn is_prompt_terminator(&self, byte: u8) -> bool {
        self.prompt_terminators.as_bytes().contains(&byte)
    }

    /// The byte required right after a prompt terminator.
    ///
    /// Only meaningful once [`validate`](Self::validate) has passed.
    pub(crate) fn prompt_suffix_byte(&self) -> u8 {
        let mut buf = [0u8; 4];
        self.prompt_suffix.encode_utf8(&mut buf).as_bytes()[0]
    }

    /// The cursor position report sent in answer to `ESC [ 6 n`.
    pub fn cursor_report(&self) -> Vec<u8> {
        format!("\x1b[{};{}R", self.cursor_row, self.cursor_col).into_bytes()
    }
}

/// Builder for constructing chat sessions.
///
/// # Example
///
/// ```rust
/// use ptychat::ChatBuilder;
///
/// # async fn example() -> Result<(), ptychat::Error> {
/// let (engine_side, _child_side) = tokio::io::duplex(1024);
/// let chat = ChatBuilder::new()
///     .prompt_terminators("#$>")
///     .cursor_position(24, 132)
///     .log_commands(false)
///     .build_from_stream(engine_side)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChatBuilder {
    config: ChatConfig,
}

impl ChatBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ChatConfig) -> Self {
        Self { config }
    }

    /// Set the characters that end a shell prompt (default: `#$`).
    pub fn prompt_terminators(mut self, terminators: impl Into<String>) -> Self {
        self.config.prompt_terminators = terminators.into();
        self
    }

    /// Set the character required after a prompt terminator (default: space).
    pub fn prompt_suffix(mut self, suffix: char) -> Self {
        self.config.prompt_suffix = suffix;
        self
    }

    /// Set the fabricated cursor position (default: row 25, column 80).
    pub fn cursor_position(mut self, row: u16, col: u16) -> Self {
        self.config.cursor_row = row;
        self.config.cursor_col = col;
        self
    }

    /// Set the initial capacity of the pre-prompt buffer.
    pub fn pre_prompt_capacity(mut self, capacity: usize) -> Self {
        self.config.pre_prompt_capacity = capacity;
        self
    }

    /// Set the capacity of the inbound read buffer.
    pub fn read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.read_buffer_capacity = capacity;
        self
    }

    /// Control whether command text is logged (disable for secrets).
    pub fn log_commands(mut self, enabled: bool) -> Self {
        self.config.log_commands = enabled;
        self
    }

    /// Build a session around an outbound and an inbound stream.
    pub fn build<W, R>(self, to: W, from: R) -> Result<Chat<W, R>>
    where
        W: AsyncWrite + Unpin,
        R: AsyncRead + Unpin,
    {
        Chat::with_config(to, from, self.config)
    }

    /// Build a session around one bidirectional stream.
    pub fn build_from_stream<S>(self, stream: S) -> Result<Chat<WriteHalf<S>, ReadHalf<S>>>
    where
        S: AsyncRead + AsyncWrite,
    {
        let (from, to) = tokio::io::split(stream);
        self.build(to, from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChatConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_prompt_terminator(b'#'));
        assert!(config.is_prompt_terminator(b'$'));
        assert!(!config.is_prompt_terminator(b'>'));
        assert_eq!(config.prompt_suffix_byte(), b' ');
        assert_eq!(config.cursor_report(), b"\x1b[25;80R");
    }

    #[test]
    fn test_validate_rejects_empty_terminators() {
        let config = ChatConfig {
            prompt_terminators: String::new(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoPromptTerminators));
    }

    #[test]
    fn test_validate_rejects_reserved_terminators() {
        for reserved in ["\x1b", "[", "$5"] {
            let config = ChatConfig {
                prompt_terminators: reserved.to_string(),
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::ReservedTerminator(_))
            ));
        }
    }

    #[test]
    fn test_validate_rejects_non_ascii() {
        let config = ChatConfig {
            prompt_terminators: "»".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NonAsciiPrompt('»')));

        let config = ChatConfig {
            prompt_suffix: '→',
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NonAsciiPrompt('→')));
    }

    #[test]
    fn test_validate_rejects_zero_cursor() {
        let config = ChatConfig {
            cursor_row: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCursorPosition { row: 0, col: 80 })
        );
    }

    #[test]
    fn test_validate_rejects_zero_read_capacity() {
        let config = ChatConfig {
            read_buffer_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroReadCapacity));

        let result = ChatBuilder::new()
            .read_buffer_capacity(0)
            .build(Vec::new(), &b"hi\r\n"[..]);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::ZeroReadCapacity))
        ));
    }

    #[tokio::test]
    async fn test_small_read_capacity_reads_lines() {
        let mut chat = ChatBuilder::new()
            .read_buffer_capacity(1)
            .build(Vec::new(), &b"hi\r\n"[..])
            .unwrap();
        assert_eq!(chat.read_line().await.unwrap(), "hi");
    }

    #[test]
    fn test_builder_sets_fields() {
        let chat = ChatBuilder::new()
            .prompt_terminators(">")
            .prompt_suffix(':')
            .cursor_position(24, 132)
            .pre_prompt_capacity(16)
            .read_buffer_capacity(64)
            .log_commands(false)
            .build(Vec::new(), &b""[..])
            .unwrap();

        let config = chat.config();
        assert_eq!(config.prompt_terminators, ">");
        assert_eq!(config.prompt_suffix, ':');
        assert_eq!(config.cursor_report(), b"\x1b[24;132R");
        assert_eq!(config.pre_prompt_capacity, 16);
        assert_eq!(config.read_buffer_capacity, 64);
        assert!(!config.log_commands);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = ChatBuilder::new()
            .cursor_position(0, 0)
            .build(Vec::new(), &b""[..]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ChatConfig =
            serde_json::from_str(r##"{"prompt_terminators": "#$%", "cursor_col": 132}"##).unwrap();
        assert_eq!(config.prompt_terminators, "#$%");
        assert_eq!(config.cursor_col, 132);
        assert_eq!(config.cursor_row, 25);
        assert!(config.log_commands);
    }
}
