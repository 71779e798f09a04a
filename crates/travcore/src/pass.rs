//! Pass identity and lifecycle: the bits that apply to a *pass* as a whole,
//! rather than to a single `apply_visitor` descent - a
//! displayable name, a back-pointer to whichever pass invoked this one, and a
//! profiling scope that brackets one `apply` call end to end.
//!
//! The driver (component D) doesn't know about any of this: `apply_visitor`
//! is generic over [`crate::flavor::Flavor`] and never calls back into
//! `PassIdentity`. A pass author who wants the lifecycle opts in by calling
//! [`Profile::start`] around their own `inspector::apply`/`modifier::apply`/
//! `transform::apply` call, the same way other top-level algorithms in this
//! codebase (`pagerank`, `graph_builder`) bracket a unit of work with a
//! `tracing` span rather than threading a profiler through every internal
//! function.

use std::time::Instant;

use tracing::{info_span, span::EnteredSpan};

/// Identity a pass exposes for telemetry: a displayable name (default: its
/// Rust type name) and an optional back-pointer to whichever pass invoked it.
///
/// `called_by` is not a runtime-mutable field - it is a `&'static str` a pass
/// simply overrides, since the invoking pass is known statically at the call
/// site in idiomatic Rust.
pub trait PassIdentity {
    /// Displayable name for this pass, used in profiling spans and error
    /// context. Defaults to the pass's Rust type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The pass that invoked this one, if any, for telemetry chains.
    fn called_by(&self) -> Option<&'static str> {
        None
    }
}

/// A profiling scope bracketing one `apply` call end to end. Each `apply`
/// scope acquires and releases a profiling record at entry and exit; the
/// record is destroyed even on failure.
///
/// Built on a `tracing` span rather than a bespoke timer registry, matching
/// how the rest of this codebase's core crates expose per-operation timing:
/// the span carries the pass name as a field, and `Drop` logs the elapsed
/// time unconditionally - including when the traversal unwinds via `?`.
pub struct Profile {
    pass_name: &'static str,
    started_at: Instant,
    _span: EnteredSpan,
}

impl Profile {
    /// `init_apply`: start a profiling scope for `pass_name`. The returned
    /// handle must be held for the duration of the traversal; dropping it
    /// (on success or on error unwind) is `end_apply`.
    pub fn start(pass_name: &'static str) -> Self {
        let span = info_span!("travcore::apply", pass = pass_name).entered();
        Profile {
            pass_name,
            started_at: Instant::now(),
            _span: span,
        }
    }

    /// Elapsed time since this scope began.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Drop for Profile {
    fn drop(&mut self) {
        tracing::debug!(pass = self.pass_name, elapsed = ?self.elapsed(), "pass complete");
    }
}

/// A typed signal a later pass may deliver to earlier ones, requesting a
/// redo. The pass pipeline that decides whether to honor a trigger lives
/// outside this crate; `Backtrack` only defines the capability a pass exposes
/// so such a pipeline can query it.
pub trait Backtrack {
    /// Handle `trigger`, returning whether this pass recognised and acted on
    /// it. A pass that never backtracks should prefer overriding
    /// [`never_backtracks`](Backtrack::never_backtracks) so callers can skip
    /// the dispatch entirely rather than returning `false` here every time.
    fn backtrack(&mut self, trigger: &dyn std::any::Any) -> bool;

    /// Whether this pass can be skipped entirely when deciding who to notify
    /// of a trigger - `backtrack` would always return `false`.
    fn never_backtracks(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPass;
    impl PassIdentity for NoopPass {}

    #[test]
    fn default_name_is_the_rust_type_name() {
        let pass = NoopPass;
        assert!(pass.name().ends_with("NoopPass"));
        assert!(pass.called_by().is_none());
    }

    #[test]
    fn profile_reports_nonzero_elapsed_after_work() {
        let profile = Profile::start("test_pass");
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(profile.elapsed().as_nanos() > 0);
    }

    struct CountingBacktracker {
        handled: usize,
    }

    impl Backtrack for CountingBacktracker {
        fn backtrack(&mut self, trigger: &dyn std::any::Any) -> bool {
            if trigger.downcast_ref::<&str>().is_some() {
                self.handled += 1;
                true
            } else {
                false
            }
        }
    }

    #[test]
    fn backtrack_reports_whether_it_handled_the_trigger() {
        let mut pass = CountingBacktracker { handled: 0 };
        let trigger: &str = "retry";
        assert!(pass.backtrack(&trigger));
        assert_eq!(pass.handled, 1);
        assert!(!pass.backtrack(&42i32));
    }
}
