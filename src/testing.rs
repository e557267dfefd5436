//! Reference `MixKernel` implementations used to exercise [`crate::mixer`]
//! end to end.
//!
//! The mixing kernel itself is out of scope for this crate (spec.md §1),
//! but `assemble_one` cannot be driven without *something* behind the
//! trait. `SilenceKernel` plays the same role the teacher's `NullDecoder`
//! plays for the decoder vtable: a deliberately inert implementation that
//! unblocks the surrounding harness. `SummingKernel` goes one step further
//! and performs literal 16-bit linear-PCM addition with gain, so the
//! end-to-end scenario tests can assert on real sample values rather than
//! just "some block was produced".

use crate::buffer::AudioBuffer;
use crate::format::AudioFormat;
use crate::kernel::{KernelResolver, MixContext, MixKernel};

/// A `MixKernel` that writes silence and advances no cursors.
pub struct SilenceKernel {
    allocates_output: bool,
}

impl SilenceKernel {
    pub fn allocating() -> Self {
        Self {
            allocates_output: true,
        }
    }

    pub fn in_place() -> Self {
        Self {
            allocates_output: false,
        }
    }
}

impl MixKernel for SilenceKernel {
    fn allocates_output(&self) -> bool {
        self.allocates_output
    }

    fn mix(&mut self, _ctx: &mut MixContext<'_>, out: &mut AudioBuffer) {
        for byte in out.payload.iter_mut() {
            *byte = 0;
        }
    }
}

/// A resolver that always hands back an allocating [`SilenceKernel`],
/// regardless of requested format.
#[derive(Debug, Default)]
pub struct AlwaysSilenceResolver;

impl KernelResolver for AlwaysSilenceResolver {
    fn resolve(&self, _format: &AudioFormat, _gain: f32) -> Option<Box<dyn MixKernel>> {
        Some(Box::new(SilenceKernel::allocating()))
    }
}

/// A resolver that always hands back an in-place [`SilenceKernel`] — the
/// core reuses the lead valid input's head buffer as the destination
/// instead of allocating a fresh one (spec.md §3, `allocates_output`).
#[derive(Debug, Default)]
pub struct AlwaysInPlaceSilenceResolver;

impl KernelResolver for AlwaysInPlaceSilenceResolver {
    fn resolve(&self, _format: &AudioFormat, _gain: f32) -> Option<Box<dyn MixKernel>> {
        Some(Box::new(SilenceKernel::in_place()))
    }
}

/// A resolver that always fails — exercises spec.md §4.1's `NoKernel`
/// path.
#[derive(Debug, Default)]
pub struct NeverResolver;

impl KernelResolver for NeverResolver {
    fn resolve(&self, _format: &AudioFormat, _gain: f32) -> Option<Box<dyn MixKernel>> {
        None
    }
}

/// A `MixKernel` that sums every valid input's 16-bit little-endian
/// samples starting at their `begin` cursor, scales by `ctx.gain`, clips
/// to `i16`, and advances every cursor by the bytes it consumed. Assumes
/// `bytes_per_frame == 2` (mono 16-bit) for simplicity; good enough to
/// verify gain transparency (spec.md §8, invariant 6) and admission
/// correctness against literal sample values.
pub struct SummingKernel {
    allocates_output: bool,
}

impl SummingKernel {
    pub fn allocating() -> Self {
        Self {
            allocates_output: true,
        }
    }

    pub fn in_place() -> Self {
        Self {
            allocates_output: false,
        }
    }
}

impl MixKernel for SummingKernel {
    fn allocates_output(&self) -> bool {
        self.allocates_output
    }

    fn mix(&mut self, ctx: &mut MixContext<'_>, out: &mut AudioBuffer) {
        let nb_frames = out.payload.len() / 2;
        for frame in 0..nb_frames {
            let mut acc: i32 = 0;
            for input in ctx.inputs.iter_mut() {
                if input.is_invalid() {
                    continue;
                }
                let begin = match input.begin {
                    Some(b) => b,
                    None => continue,
                };
                let Some(head) = input.queue.head() else {
                    continue;
                };
                let off = begin + frame * 2;
                if off + 1 >= head.payload.len() {
                    continue;
                }
                let sample = i16::from_le_bytes([head.payload[off], head.payload[off + 1]]);
                acc += (sample as f32 * ctx.gain) as i32;
            }
            let clipped = acc.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            let bytes = clipped.to_le_bytes();
            out.payload[frame * 2] = bytes[0];
            out.payload[frame * 2 + 1] = bytes[1];
        }
        for input in ctx.inputs.iter_mut() {
            if let Some(begin) = input.begin.as_mut() {
                *begin += nb_frames * 2;
            }
        }
    }
}

/// A resolver that always hands back an allocating [`SummingKernel`].
#[derive(Debug, Default)]
pub struct AlwaysSummingResolver;

impl KernelResolver for AlwaysSummingResolver {
    fn resolve(&self, _format: &AudioFormat, _gain: f32) -> Option<Box<dyn MixKernel>> {
        Some(Box::new(SummingKernel::allocating()))
    }
}

/// A resolver that always hands back an in-place [`SummingKernel`].
#[derive(Debug, Default)]
pub struct AlwaysInPlaceSummingResolver;

impl KernelResolver for AlwaysInPlaceSummingResolver {
    fn resolve(&self, _format: &AudioFormat, _gain: f32) -> Option<Box<dyn MixKernel>> {
        Some(Box::new(SummingKernel::in_place()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;

    #[test]
    fn silence_kernel_zeroes_output() {
        let mut kernel = SilenceKernel::allocating();
        let mut inputs: Vec<InputState> = vec![];
        let mut ctx = MixContext::new(&mut inputs, 1.0);
        let mut out = AudioBuffer::with_frames(0, 4, 48_000, vec![0xFFu8; 8]);
        kernel.mix(&mut ctx, &mut out);
        assert!(out.payload.iter().all(|&b| b == 0));
    }

    #[test]
    fn never_resolver_yields_none() {
        let resolver = NeverResolver;
        let fmt = AudioFormat::linear(2, 1, 48_000);
        assert!(resolver.resolve(&fmt, 1.0).is_none());
    }

    #[test]
    fn summing_kernel_applies_gain_and_advances_cursor() {
        let mut input = InputState::new();
        let samples: [i16; 2] = [1000, 2000];
        let mut payload = Vec::new();
        for s in samples {
            payload.extend_from_slice(&s.to_le_bytes());
        }
        input.queue.push(AudioBuffer::with_frames(0, 2, 48_000, payload));
        input.begin = Some(0);

        let mut inputs = vec![input];
        let mut kernel = SummingKernel::allocating();
        let mut out = AudioBuffer::with_frames(0, 2, 48_000, vec![0u8; 4]);
        {
            let mut ctx = MixContext::new(&mut inputs, 0.5);
            kernel.mix(&mut ctx, &mut out);
        }

        let s0 = i16::from_le_bytes([out.payload[0], out.payload[1]]);
        let s1 = i16::from_le_bytes([out.payload[2], out.payload[3]]);
        assert_eq!(s0, 500);
        assert_eq!(s1, 1000);
        assert_eq!(inputs[0].begin, Some(4));
    }
}
