//! Simulated incremental display of an already complete reply.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::time::Duration;

use crate::timer::TimerId;

/// Pacing of the reveal effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RevealConfig {
    chunk_chars: NonZeroUsize,
    interval: Duration,
}

impl RevealConfig {
    /// Reveals `chunk_chars` characters every `interval`.
    #[inline]
    pub const fn new(chunk_chars: NonZeroUsize, interval: Duration) -> Self {
        Self {
            chunk_chars,
            interval,
        }
    }

    /// Characters (Unicode scalar values) added per step.
    #[inline]
    pub fn chunk_chars(&self) -> NonZeroUsize {
        self.chunk_chars
    }

    /// Time between two steps.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self::new(
            NonZeroUsize::new(3).unwrap_or(NonZeroUsize::MIN),
            Duration::from_millis(20),
        )
    }
}

/// Cursor over a reply being revealed into one message.
#[derive(Debug)]
pub(crate) struct Reveal {
    id: u64,
    message_index: usize,
    message_id: String,
    full_text: String,
    shown_bytes: usize,
    timer: Option<TimerId>,
}

impl Reveal {
    pub fn new(
        id: u64,
        message_index: usize,
        message_id: String,
        full_text: String,
    ) -> Self {
        Self {
            id,
            message_index,
            message_id,
            full_text,
            shown_bytes: 0,
            timer: None,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn message_index(&self) -> usize {
        self.message_index
    }

    #[inline]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    #[inline]
    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    #[inline]
    pub fn set_timer(&mut self, timer: TimerId) {
        self.timer = Some(timer);
    }

    #[inline]
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.shown_bytes >= self.full_text.len()
    }

    /// Moves the cursor forward by at most `chunk_chars` characters and
    /// returns the byte range of `full_text` that became visible.
    ///
    /// The range always ends on a character boundary.
    pub fn advance(&mut self, chunk_chars: NonZeroUsize) -> Range<usize> {
        let rest = &self.full_text[self.shown_bytes..];
        let len = rest
            .char_indices()
            .nth(chunk_chars.get())
            .map_or(rest.len(), |(idx, _)| idx);
        let start = self.shown_bytes;
        self.shown_bytes += len;
        start..self.shown_bytes
    }

    /// Number of steps left until the whole text is visible.
    pub fn remaining_steps(&self, chunk_chars: NonZeroUsize) -> usize {
        let rest = self.full_text[self.shown_bytes..].chars().count();
        rest.div_ceil(chunk_chars.get())
    }

    #[inline]
    pub fn into_full_text(self) -> String {
        self.full_text
    }
}
