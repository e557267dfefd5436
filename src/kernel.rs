//! The pluggable mixing kernel contract (spec.md §4.4).
//!
//! The kernel's actual sample arithmetic — format-specific combination,
//! resampling, dither — is explicitly out of scope for this crate
//! (spec.md §1). What lives here is the capability boundary: a
//! `MixKernel` trait the core drives, and a `KernelResolver` the core asks
//! to produce one at `attach` time, mapping spec.md §9's "plug-in module
//! resolution" onto "a capability-based `MixKernel` trait/interface
//! resolved by a small registry keyed on format" with no dynamic symbol
//! loading.

use crate::buffer::AudioBuffer;
use crate::format::AudioFormat;
use crate::input::InputState;

/// Everything a `MixKernel::mix` call needs to read from, beyond the
/// destination buffer it is handed: every input's current head buffer and
/// cursor, plus the gain the core is authoritative over.
pub struct MixContext<'a> {
    pub inputs: &'a mut [InputState],
    pub gain: f32,
}

impl<'a> MixContext<'a> {
    pub fn new(inputs: &'a mut [InputState], gain: f32) -> Self {
        Self { inputs, gain }
    }
}

/// The mixing kernel contract (spec.md §4.4).
///
/// Implementations must not block or fail; format mismatches are
/// configuration errors caught at `attach` time by the resolver, not at
/// mix time.
pub trait MixKernel: Send {
    /// Whether the core should allocate the destination buffer
    /// (`true`) or reuse the first valid input's head buffer in place
    /// (`false`). Read once at `attach` time and assumed constant for the
    /// kernel's lifetime.
    fn allocates_output(&self) -> bool;

    /// Read every valid input's head buffer starting at its `begin`
    /// cursor, advance those cursors, apply `ctx.gain`, and write into
    /// `out`. `out.pts` and `out.length` are already set by the core;
    /// the kernel only fills `out.payload` (and `out.nb_samples` when it
    /// allocated the buffer itself).
    fn mix(&mut self, ctx: &mut MixContext<'_>, out: &mut AudioBuffer);
}

/// Resolves a `MixKernel` for a given format and initial gain at `attach`
/// time (spec.md §6: `resolve_kernel(format, gain) -> Option<MixKernel>`).
pub trait KernelResolver: Send + Sync {
    fn resolve(&self, format: &AudioFormat, gain: f32) -> Option<Box<dyn MixKernel>>;
}
