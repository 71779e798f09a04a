//! Policy knobs for a traversal pass.

/// Configuration for a single `apply` call.
///
/// Constructed via [`Default`] and refined with `with_*` builder methods, the
/// same shape the rest of this codebase's core crates use for their own
/// per-algorithm configuration structs - a plain struct, no file format, no
/// runtime reconfiguration.
#[derive(Debug, Clone)]
pub struct TraversalConfig {
    /// Whether Inspector's visit-once policy is on by default for a node the
    /// registry has not seen before. Individual nodes can still override this
    /// for the rest of the pass via `visit_once()`/`visit_again()`.
    pub default_visit_once: bool,
    /// Whether `loop_revisit` is fatal (`LoopDetected`) by default. When
    /// `false`, a cycle is silently suppressed: the driver returns the node
    /// unchanged without descending again. See the open question on this in
    /// the design notes - this crate resolves it as `true`.
    pub fatal_loop_revisit: bool,
    /// Stack depth, in frames, after which the driver grows the OS thread's
    /// stack via `stacker` before recursing further.
    pub stack_growth_depth: usize,
    /// Amount of additional stack (in bytes) `stacker::maybe_grow` reserves
    /// each time the growth threshold is crossed.
    pub stack_growth_bytes: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        TraversalConfig {
            default_visit_once: true,
            fatal_loop_revisit: true,
            stack_growth_depth: 128,
            stack_growth_bytes: 8 * 1024 * 1024,
        }
    }
}

impl TraversalConfig {
    pub fn new() -> Self {
        TraversalConfig::default()
    }

    pub fn with_default_visit_once(mut self, enabled: bool) -> Self {
        self.default_visit_once = enabled;
        self
    }

    pub fn with_fatal_loop_revisit(mut self, fatal: bool) -> Self {
        self.fatal_loop_revisit = fatal;
        self
    }

    pub fn with_stack_growth_depth(mut self, depth: usize) -> Self {
        self.stack_growth_depth = depth;
        self
    }

    pub fn with_stack_growth_bytes(mut self, bytes: usize) -> Self {
        self.stack_growth_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_visit_once_and_fatal_loops() {
        let config = TraversalConfig::default();
        assert!(config.default_visit_once);
        assert!(config.fatal_loop_revisit);
    }

    #[test]
    fn builders_override_one_field_at_a_time() {
        let config = TraversalConfig::new()
            .with_fatal_loop_revisit(false)
            .with_default_visit_once(false);
        assert!(!config.fatal_loop_revisit);
        assert!(!config.default_visit_once);
        assert_eq!(config.stack_growth_depth, 128);
    }
}
