//! `InputState` — one producer-facing input stream.

use crate::buffer::BufferQueue;

/// One input stream's queue plus the flags and cursor the mixer needs to
/// admit and consume it (spec.md §3).
#[derive(Debug, Default)]
pub struct InputState {
    pub queue: BufferQueue,
    /// Byte offset into `queue.head().payload`; `None` whenever the head
    /// buffer is dropped (non-owning — valid only while that exact head
    /// buffer remains queued).
    pub begin: Option<usize>,
    /// Producer-set: the input has withdrawn and will not recover without
    /// external reset.
    pub error: bool,
    /// Producer-set: temporarily suspended.
    pub paused: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `error || paused`, recomputed every tick (spec.md §3: "transient").
    pub fn is_invalid(&self) -> bool {
        self.error || self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AudioBuffer;

    #[test]
    fn fresh_input_is_valid_and_has_no_cursor() {
        let input = InputState::new();
        assert!(!input.is_invalid());
        assert!(input.begin.is_none());
    }

    #[test]
    fn paused_or_errored_input_is_invalid() {
        let mut input = InputState::new();
        input.paused = true;
        assert!(input.is_invalid());
        input.paused = false;
        input.error = true;
        assert!(input.is_invalid());
    }

    #[test]
    fn dropping_head_resets_begin() {
        let mut input = InputState::new();
        input.queue.push(AudioBuffer::with_frames(0, 1024, 48_000, vec![0; 4096]));
        input.begin = Some(2048);
        input.queue.pop();
        input.begin = None; // mixer resets this whenever a head is dropped
        assert!(input.begin.is_none());
    }
}
