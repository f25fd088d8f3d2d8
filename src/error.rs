//! The solver's public error type.
//!
//! `HypothesisReject` from the design notes has no variant here: it is
//! always fully recovered inside [`crate::region`]'s solution validator and
//! never escapes as a `SolveError`. Only genuine top-level contradictions
//! and cooperative cancellation are surfaced to a caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    /// The board has been proven inconsistent at the top level. The board
    /// is left at its last consistent state; the message names the rule or
    /// invariant that failed.
    #[error("logic error: {0}")]
    Logic(String),

    /// The host's `check_break` hook returned `true`. The board is left at
    /// its last committed state with any in-flight hypothesis rolled back.
    #[error("solve cancelled")]
    Cancelled,
}

pub type SolveResult<T> = Result<T, SolveError>;

/// Outcome of one rule application or one rule pass: did it mutate the
/// board? This is the explicit status the design notes mandate in place of
/// the source's `changedSignal` exception.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    NoChange,
    Changed,
}

impl StepOutcome {
    pub fn changed(self) -> bool {
        self == StepOutcome::Changed
    }

    pub fn merge(self, other: StepOutcome) -> StepOutcome {
        if self.changed() || other.changed() {
            StepOutcome::Changed
        } else {
            StepOutcome::NoChange
        }
    }

    pub fn from_bool(changed: bool) -> StepOutcome {
        if changed {
            StepOutcome::Changed
        } else {
            StepOutcome::NoChange
        }
    }
}
