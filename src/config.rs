//! Caller-tunable knobs.
//!
//! Modeled on the teacher's `config::Options` (a plain struct of
//! caller-supplied settings, no file parsing, no environment variables) —
//! trimmed to the two knobs this crate actually has, since spec.md §6 is
//! explicit that there is "no persisted state, no file format, no CLI"
//! here.

/// Output block sizing and scheduler-fairness knobs.
#[derive(Debug, Clone, Copy)]
pub struct MixerConfig {
    /// Samples per output block (`output.nb_samples_per_block` in
    /// spec.md §4.2 Step E).
    pub nb_samples_per_block: u32,
    /// Soft cap on blocks emitted by one `run()` call.
    ///
    /// The source loops `run` until `NotReady` with no upper bound
    /// (spec.md §9, second open question). `None` preserves that. Set
    /// this only when the enclosing scheduler needs fairness — e.g. a
    /// cooperative scheduler that must not let one mixer monopolize a
    /// tick by draining an unbounded producer backlog.
    pub max_blocks_per_run: Option<usize>,
}

impl MixerConfig {
    pub fn new(nb_samples_per_block: u32) -> Self {
        Self {
            nb_samples_per_block,
            max_blocks_per_run: None,
        }
    }

    pub fn with_soft_cap(mut self, max_blocks: usize) -> Self {
        self.max_blocks_per_run = Some(max_blocks);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_soft_cap() {
        let cfg = MixerConfig::new(1024);
        assert_eq!(cfg.max_blocks_per_run, None);
    }

    #[test]
    fn with_soft_cap_sets_the_cap() {
        let cfg = MixerConfig::new(1024).with_soft_cap(32);
        assert_eq!(cfg.max_blocks_per_run, Some(32));
    }
}
