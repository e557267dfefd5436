//! Audio output mixer core.
//!
//! This crate is the scheduling and alignment engine that repeatedly
//! assembles one output-sized audio block by combining time-stamped sample
//! buffers arriving from N independent input streams, and hands each
//! assembled block to a downstream output pipeline.
//!
//! The pluggable mixing kernel (format-specific sample combination,
//! resampling, dither), input producers, and output device I/O are all
//! external collaborators — see [`kernel::MixKernel`] and
//! [`output::PlayoutSink`] for the seams this crate expects them at.
//!
//! # Architecture
//!
//! - [`clock`] — monotonic wall clock and the sample-accurate date
//!   accumulator used to derive block boundaries.
//! - [`buffer`] — `AudioBuffer` and the per-input `BufferQueue` FIFO.
//! - [`format`] — `AudioFormat`, the immutable per-mixer PCM layout.
//! - [`input`] — `InputState`, wrapping a queue with producer-controlled
//!   flags and the linear-PCM byte cursor.
//! - [`output`] — `OutputFifo`, the downstream sink's clock and queue.
//! - [`kernel`] — the `MixKernel`/`KernelResolver` capability traits.
//! - [`error`] — error types surfaced across the public API.
//! - [`config`] — caller-tunable knobs (`MixerConfig`).
//! - [`mixer`] — the alignment loop (`assemble_one`), its driver (`run`),
//!   and the `attach`/`detach`/`set_gain` lifecycle.

pub mod buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod input;
pub mod kernel;
pub mod mixer;
pub mod output;

pub mod testing;

pub use buffer::{AudioBuffer, BufferQueue};
pub use clock::{Clock, Date, ManualClock, SystemClock};
pub use config::MixerConfig;
pub use error::{AssembleOutcome, AttachError};
pub use format::AudioFormat;
pub use input::InputState;
pub use kernel::{KernelResolver, MixContext, MixKernel};
pub use mixer::MixerContext;
pub use output::{OutputFifo, PlayoutSink};
