//! Channel layer: the byte stream pair and the pre-prompt buffer.
//!
//! Everything the engine reads from or writes to the child goes through a
//! [`ChatChannel`]; nothing else touches the underlying streams.

mod buffer;
mod pty;

pub use buffer::PrePromptBuffer;
pub use pty::{ChannelParts, ChatChannel, DEFAULT_READ_CAPACITY};
