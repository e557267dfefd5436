//! `OutputFifo` — the downstream sink's clock and record of produced blocks.

use std::collections::VecDeque;

use crate::buffer::AudioBuffer;
use crate::clock::Date;

/// Caller-supplied sink that actually plays out an assembled block
/// (spec.md §6: `output_play`). Device I/O is out of scope for this crate;
/// this trait is the seam.
pub trait PlayoutSink: Send + Sync {
    fn play(&self, block: AudioBuffer);
}

/// A `PlayoutSink` that drops every block, for callers that only want the
/// mixer's scheduling decisions (e.g. tests verifying `AssembleOutcome`).
#[derive(Debug, Default)]
pub struct NullSink;

impl PlayoutSink for NullSink {
    fn play(&self, _block: AudioBuffer) {}
}

/// Cap on how many recently-played blocks [`OutputFifo`] retains for the
/// monotonicity assertions in spec.md §8. Mechanics of the real device
/// queue are out of scope (spec.md §1); this is just enough bookkeeping to
/// test against.
const HISTORY_CAP: usize = 8;

/// The downstream sink's queue with its own `end_date` (spec.md §3).
#[derive(Debug)]
pub struct OutputFifo {
    date: Date,
    history: VecDeque<AudioBuffer>,
}

impl OutputFifo {
    pub fn new(rate: u32) -> Self {
        Self {
            date: Date::new(rate),
            history: VecDeque::new(),
        }
    }

    /// The PTS of the next sample slot the output device expects.
    pub fn end_date(&self) -> i64 {
        self.date.get()
    }

    /// Advance the date accumulator by `nb_samples`, returning the new
    /// `end_date` (spec.md §4.2 Step E).
    pub fn advance(&mut self, nb_samples: u32) -> i64 {
        self.date.increment(nb_samples)
    }

    /// Reset the clock to zero and drop all history (spec.md §4.2 Step C,
    /// the late-output recovery).
    pub fn reset(&mut self) {
        self.date.set(0);
        self.history.clear();
    }

    /// Anchor the accumulator to a freshly-discovered start date (spec.md
    /// §4.2 Step D), without touching history.
    pub fn anchor(&mut self, start_date: i64) {
        self.date.set(start_date);
    }

    /// Record a produced block for monotonicity testing; the real handoff
    /// to the device happens via [`PlayoutSink::play`], which this does
    /// not call — `MixerContext::run` does both.
    pub fn record(&mut self, block: &AudioBuffer) {
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(block.clone());
    }

    /// The most recently recorded block, if any.
    pub fn last(&self) -> Option<&AudioBuffer> {
        self.history.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_matches_date_increment() {
        let mut fifo = OutputFifo::new(48_000);
        assert_eq!(fifo.advance(1024), 21_333);
        assert_eq!(fifo.end_date(), 21_333);
    }

    #[test]
    fn reset_clears_date_and_history() {
        let mut fifo = OutputFifo::new(48_000);
        fifo.advance(1024);
        fifo.record(&AudioBuffer::with_frames(0, 1024, 48_000, vec![]));
        fifo.reset();
        assert_eq!(fifo.end_date(), 0);
        assert!(fifo.last().is_none());
    }

    #[test]
    fn history_respects_cap() {
        let mut fifo = OutputFifo::new(48_000);
        for i in 0..(HISTORY_CAP + 3) {
            fifo.record(&AudioBuffer::with_frames(i as i64, 1, 48_000, vec![]));
        }
        assert_eq!(fifo.last().unwrap().pts, (HISTORY_CAP + 2) as i64);
    }
}
