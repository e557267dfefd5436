//! The alignment loop (`assemble_one`), its driver (`run`), and the
//! `attach`/`detach`/`set_gain` lifecycle (spec.md §4).
//!
//! `MixerContext` is the explicit context struct spec.md §9 asks for in
//! place of the source's ambient global `aout`: it owns the two documented
//! locks (input-FIFO, output-FIFO) plus a third guarding the kernel
//! binding itself, which doubles as the "mixer lock" spec.md §5 requires
//! callers to hold across every entry point. Rather than have callers
//! acquire that lock and pass a guard into each method (the C calling
//! convention), each entry point (`attach`, `detach`, `set_gain`, `run`)
//! acquires and releases it for the duration of its own call — this keeps
//! every acquisition-order guarantee in spec.md §5 while making "forgot to
//! lock" unrepresentable.

use parking_lot::{Mutex, MutexGuard};

use crate::buffer::AudioBuffer;
use crate::clock::Clock;
use crate::config::MixerConfig;
use crate::error::{AssembleOutcome, AttachError};
use crate::format::AudioFormat;
use crate::input::InputState;
use crate::kernel::{KernelResolver, MixContext, MixKernel};
use crate::output::{OutputFifo, PlayoutSink};

/// State installed by a successful `attach`, torn down by `detach`.
struct MixerBinding {
    format: AudioFormat,
    gain: f32,
    kernel: Box<dyn MixKernel>,
    allocates_output: bool,
}

/// The mixer core's explicit context: inputs, output, the kernel binding,
/// clock, sink, and config, all in one value instead of ambient globals.
pub struct MixerContext {
    /// Input-FIFO lock (spec.md §5): guards every input's queue and
    /// cursor. Producers acquire this directly via [`MixerContext::inputs`]
    /// to enqueue.
    inputs: Mutex<Vec<InputState>>,
    /// Output-FIFO lock (spec.md §5): guards `end_date` and the produced
    /// block queue.
    output: Mutex<OutputFifo>,
    /// Mixer lock (spec.md §5): guards the kernel binding and doubles as
    /// the lock every public entry point holds for its own duration.
    binding: Mutex<Option<MixerBinding>>,
    /// Authoritative gain (spec.md §4.1 `set_gain`): survives detach,
    /// mirrored into `binding.gain` whenever attached.
    gain: Mutex<f32>,
    clock: Box<dyn Clock>,
    sink: Box<dyn PlayoutSink>,
    config: MixerConfig,
}

impl MixerContext {
    /// Build a context with `nb_inputs` initially-empty input slots, a
    /// clock, a sink, and sizing/fairness config.
    pub fn new(
        nb_inputs: usize,
        output_rate: u32,
        clock: Box<dyn Clock>,
        sink: Box<dyn PlayoutSink>,
        config: MixerConfig,
    ) -> Self {
        Self {
            inputs: Mutex::new((0..nb_inputs).map(|_| InputState::new()).collect()),
            output: Mutex::new(OutputFifo::new(output_rate)),
            binding: Mutex::new(None),
            gain: Mutex::new(1.0),
            clock,
            sink,
            config,
        }
    }

    /// The input-FIFO lock. Producers lock this to enqueue buffers or flip
    /// `error`/`paused` on their input.
    pub fn inputs(&self) -> MutexGuard<'_, Vec<InputState>> {
        self.inputs.lock()
    }

    pub fn is_attached(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// Resolve a kernel for `format` and install it (spec.md §4.1).
    ///
    /// # Panics
    /// Panics (debug builds) if a mixer is already attached — attaching
    /// twice without an intervening `detach` is a precondition violation
    /// (spec.md §7), not a recoverable condition.
    pub fn attach(
        &self,
        format: AudioFormat,
        resolver: &dyn KernelResolver,
    ) -> Result<(), AttachError> {
        let mut binding = self.binding.lock();
        debug_assert!(binding.is_none(), "attach called while already attached");

        let gain = *self.gain.lock();
        let kernel = resolver.resolve(&format, gain).ok_or(AttachError::NoKernel)?;
        let allocates_output = kernel.allocates_output();

        tracing::debug!(rate = format.rate, allocates_output, "mixer attached");
        *binding = Some(MixerBinding {
            format,
            gain,
            kernel,
            allocates_output,
        });
        Ok(())
    }

    /// Unload the kernel binding. Idempotent (spec.md §4.1, §8 invariant
    /// 5). Does not touch input FIFOs.
    pub fn detach(&self) {
        let mut binding = self.binding.lock();
        if binding.is_none() {
            return;
        }
        *binding = None;
        tracing::debug!("mixer detached");
    }

    /// Update the authoritative gain, and the live binding's gain if one
    /// is attached. No validation — callers clamp (spec.md §4.1).
    pub fn set_gain(&self, gain: f32) {
        *self.gain.lock() = gain;
        if let Some(binding) = self.binding.lock().as_mut() {
            binding.gain = gain;
        }
    }

    /// Drive `assemble_one` until it reports `NotReady`, handing every
    /// `Ready` block to the configured `PlayoutSink`. Returns the number
    /// of blocks emitted.
    ///
    /// The source loops with no upper bound; this honors that by default
    /// (`MixerConfig::max_blocks_per_run == None`). When a soft cap is
    /// configured, `run` stops early even if the next tick would still be
    /// `Ready` — a deliberate deviation from the source, for schedulers
    /// that need fairness (spec.md §9, second open question).
    pub fn run(&self) -> usize {
        let mut binding = self.binding.lock();
        let mut emitted = 0usize;
        loop {
            if let Some(cap) = self.config.max_blocks_per_run {
                if emitted >= cap {
                    break;
                }
            }
            match self.assemble_one(&mut binding) {
                AssembleOutcome::Ready => emitted += 1,
                AssembleOutcome::NotReady => break,
            }
        }
        emitted
    }

    /// One tick of the alignment/admission loop (spec.md §4.2, Steps A–I).
    /// Precondition: `binding_slot` is the already-locked mixer binding
    /// (only ever called from `run`, which holds it for the whole call).
    fn assemble_one(&self, binding_slot: &mut MutexGuard<'_, Option<MixerBinding>>) -> AssembleOutcome {
        // Step A — unbound fast path.
        let binding = match binding_slot.as_mut() {
            Some(b) => b,
            None => {
                let mut inputs = self.inputs.lock();
                for input in inputs.iter_mut() {
                    if !input.error {
                        input.queue.clear();
                        input.begin = None;
                    }
                }
                return AssembleOutcome::NotReady;
            }
        };

        // Step B — lock input-FIFO, then output-FIFO; read the output
        // clock.
        let mut inputs = self.inputs.lock();
        let mut output = self.output.lock();
        let mut start_date = output.end_date();

        // Step C — late-output reset.
        let now = self.clock.now_us();
        if start_date != 0 && start_date < now {
            tracing::warn!(start_date, now, "output clock in the past, resetting");
            output.reset();
            start_date = 0;
        }
        drop(output);

        // Step D — start-date discovery, only when the clock is fresh.
        if start_date == 0 {
            for input in inputs.iter_mut() {
                if input.is_invalid() {
                    continue;
                }
                while let Some(head) = input.queue.head() {
                    if head.pts >= now {
                        break;
                    }
                    let lag = now - head.pts;
                    input.queue.pop();
                    input.begin = None;
                    tracing::warn!(lag, "dropping stale buffer ahead of start-date discovery");
                }
                if input.queue.is_empty() {
                    return AssembleOutcome::NotReady;
                }
                start_date = start_date.max(input.queue.head().unwrap().pts);
            }
            self.output.lock().anchor(start_date);
        }

        // Step E — compute end_date by advancing the output date
        // accumulator.
        let end_date = self.output.lock().advance(self.config.nb_samples_per_block);

        // Step F — per-input admission & pruning.
        let mut clock_reset = false;
        for input in inputs.iter_mut() {
            if input.is_invalid() {
                continue;
            }
            if input.queue.is_empty() {
                return AssembleOutcome::NotReady;
            }

            // Past-packet drop, ±1 µs rounding tolerance.
            while let Some(head) = input.queue.head() {
                if head.end_pts() >= start_date - 1 {
                    break;
                }
                input.queue.pop();
                input.begin = None;
                tracing::warn!("dropping past packet before start_date");
            }
            if input.queue.is_empty() {
                return AssembleOutcome::NotReady;
            }

            // Sufficiency + contiguity scan, restarting after any gap drop.
            loop {
                let mut gap_at = None;
                let mut covered = false;
                {
                    let mut prev: Option<(i64, i64)> = None;
                    for (idx, buf) in input.queue.iter().enumerate() {
                        if let Some((prev_pts, prev_len)) = prev {
                            if prev_pts + prev_len != buf.pts {
                                gap_at = Some(idx);
                                break;
                            }
                        }
                        prev = Some((buf.pts, buf.length));
                        if buf.end_pts() >= end_date {
                            covered = true;
                            break;
                        }
                    }
                }
                if let Some(idx) = gap_at {
                    let dropped = input.queue.drop_front(idx);
                    input.begin = None;
                    tracing::warn!(dropped, "dropping buffers before a contiguity gap");
                    continue;
                }
                if covered {
                    break;
                }
                return AssembleOutcome::NotReady;
            }

            // A contiguity gap may have pruned the head past start_date,
            // leaving a hole at the front of the window rather than in the
            // middle of it. That is still insufficient data for this tick.
            if input.queue.head().unwrap().pts > start_date + 1 {
                return AssembleOutcome::NotReady;
            }

            // Linear cursor reconciliation.
            if binding.format.is_linear {
                let head = input.queue.head().unwrap();
                let fmt = &binding.format;
                let i_buffer_exact = (start_date - head.pts) * fmt.bytes_per_frame as i64
                    * fmt.rate as i64
                    / (fmt.frame_length.max(1) as i64 * 1_000_000);

                if input.begin.is_none() {
                    input.begin = Some(0);
                }
                let cursor_bytes = input.begin.unwrap() as i64;

                let tolerance = fmt.bytes_per_frame as i64;
                if (cursor_bytes - i_buffer_exact).abs() > tolerance {
                    tracing::warn!(
                        cursor_bytes,
                        i_buffer_exact,
                        "linear cursor drift exceeds tolerance, rounding"
                    );
                    let bpf = fmt.bytes_per_frame.max(1) as i64;
                    let rounded = (i_buffer_exact.div_euclid(bpf)) * bpf;
                    if rounded < 0 {
                        self.output.lock().reset();
                        clock_reset = true;
                        break;
                    }
                    input.begin = Some(rounded as usize);
                }
            }
        }

        // Step G — global feasibility.
        if clock_reset {
            return AssembleOutcome::NotReady;
        }
        let first_valid_input = inputs.iter().position(|i| !i.is_invalid());
        let Some(first_valid_input) = first_valid_input else {
            return AssembleOutcome::NotReady;
        };

        // Step H — destination buffer.
        let mut out = if binding.allocates_output {
            let nb_samples = self.config.nb_samples_per_block;
            let nb_bytes = binding.format.frames_to_bytes(nb_samples) as usize;
            AudioBuffer {
                pts: start_date,
                length: end_date - start_date,
                nb_samples,
                payload: vec![0u8; nb_bytes],
            }
        } else {
            let Some(head) = inputs[first_valid_input].queue.head() else {
                return AssembleOutcome::NotReady;
            };
            let nb_samples = self.config.nb_samples_per_block;
            let nb_bytes = binding.format.frames_to_bytes(nb_samples) as usize;
            let mut reused = head.clone();
            reused.pts = start_date;
            reused.length = end_date - start_date;
            reused.nb_samples = nb_samples;
            reused.payload.resize(nb_bytes, 0);
            reused
        };

        let mut ctx = MixContext::new(&mut inputs[..], binding.gain);
        binding.kernel.mix(&mut ctx, &mut out);

        // Step I — handoff: release input-FIFO lock before playing out.
        drop(inputs);
        let mut output = self.output.lock();
        output.record(&out);
        drop(output);
        self.sink.play(out);

        AssembleOutcome::Ready
    }
}
