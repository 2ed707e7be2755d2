//! Growable buffer for the plain text a child prints before its prompt.
//!
//! The scanner only keeps this around for diagnostics: if the child dies
//! before prompting, whatever it managed to print is the most useful error
//! message we have.

use bytes::{BufMut, BytesMut};

/// Plain (non-escape) bytes seen ahead of a prompt.
#[derive(Debug, Default)]
pub struct PrePromptBuffer {
    buffer: BytesMut,
}

impl PrePromptBuffer {
    /// Create an empty buffer with room for `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a single byte.
    pub fn push(&mut self, byte: u8) {
        self.buffer.put_u8(byte);
    }

    /// Drop trailing whitespace (space, tab, CR, LF, VT, FF).
    pub fn trim_trailing_whitespace(&mut self) {
        let keep = self
            .buffer
            .iter()
            .rposition(|b| !is_space(*b))
            .map_or(0, |pos| pos + 1);
        self.buffer.truncate(keep);
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Consume the buffer into an owned string (lossy UTF-8 conversion).
    pub fn into_string_lossy(self) -> String {
        self.as_str_lossy().into_owned()
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

// Same set as C's isspace() in the "C" locale.
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}
