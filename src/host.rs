//! Host callbacks and solver tunables, bundled into one config struct handed
//! to [`crate::grid::Grid`] at construction rather than threaded through
//! every call.
//!
//! Mirrors the source's `CNurikabe` virtuals (`setBusy`, `notifyChanged`,
//! `checkBreak`): an embedder (a GUI, a CLI progress bar) implements `Host`
//! to observe long solves and ask for cooperative cancellation. The default
//! `NullHost` never cancels and does nothing on the other two hooks, which
//! is exactly what a headless one-shot solve wants.

/// Cooperative hooks a long-running solve checks into.
pub trait Host {
    /// Called with `true` before a multi-step `solve()` begins and `false`
    /// once it returns, win or lose.
    fn set_busy(&mut self, _busy: bool) {}

    /// Called whenever a rule pass or region-completion step actually
    /// changed the board, so a GUI can repaint incrementally.
    fn notify_changed(&mut self) {}

    /// Polled at the top of every rule pass and every recursive enumeration
    /// step. Returning `true` unwinds the current solve with
    /// [`crate::error::SolveError::Cancelled`]; any open hypothesis is
    /// rolled back first.
    fn check_break(&mut self) -> bool {
        false
    }
}

/// A `Host` that never cancels and ignores the progress callbacks.
#[derive(Default)]
pub struct NullHost;

impl Host for NullHost {}

/// Solver tunables plus the host, bundled per construction instead of per
/// call. `max_remaining` and `max_solutions` default to the same values the
/// source uses both at construction and on `reset` (it inconsistently used
/// different defaults in each place; this crate unifies them, see
/// `DESIGN.md`).
pub struct SolveOptions {
    /// A region whose remaining cell count exceeds this is skipped by
    /// `recurse_solve_step` rather than enumerated; the budget grows and the
    /// step is retried whenever every region is otherwise stuck.
    pub max_remaining: u8,
    /// Enumerating a region's completions aborts (and doubles this budget
    /// for the next attempt) once more than this many candidates have been
    /// found.
    pub max_solutions: usize,
    pub host: Box<dyn Host>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            max_remaining: 8,
            max_solutions: 4096,
            host: Box::new(NullHost),
        }
    }
}
