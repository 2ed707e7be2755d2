//! Per-call protocol flags for [`Chat::talk`](super::Chat::talk).

use bitflags::bitflags;

bitflags! {
    /// Options controlling a single talk exchange.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TalkFlags: u32 {
        /// Wait for (and consume) the shell prompt before sending.
        const SWALLOW_PROMPT = 1 << 0;
    }
}
