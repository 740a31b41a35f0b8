//! Payout Run FSM State Definitions
//!
//! One run moves through these states strictly left to right:
//!
//! ```text
//! IDLE → EXECUTING(i) → AWAITING_CONFIRMATION(i) → ... → COMPLETED
//!             ↓                    ↓
//!           FAILED ←──────── (abort / job failure)
//! ```

use std::fmt;

use serde::Serialize;

/// Why a run ended in [`RunState::Failed`].
///
/// `reason` is a stable code (`job-<i>-failed` or `aborted`); `detail`
/// carries the underlying message from the ledger, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureInfo {
    /// Index of the failing job, `None` for operator aborts.
    pub job_index: Option<usize>,
    /// Stable reason code.
    pub reason: String,
    /// Underlying error detail, empty for aborts.
    pub detail: String,
    /// Jobs that had already completed when the run halted.
    pub completed_before: usize,
}

impl FailureInfo {
    /// Failure record for job `index` halting the run.
    pub fn job(index: usize, detail: impl Into<String>, completed_before: usize) -> Self {
        Self {
            job_index: Some(index),
            reason: format!("job-{}-failed", index),
            detail: detail.into(),
            completed_before,
        }
    }

    /// Failure record for an operator abort at a job boundary.
    pub fn aborted(completed_before: usize) -> Self {
        Self {
            job_index: None,
            reason: "aborted".to_string(),
            detail: String::new(),
            completed_before,
        }
    }
}

/// Payout run FSM states
///
/// Terminal states: COMPLETED, FAILED. The indices in the two active
/// states are the queue cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunState {
    /// No run active; the only state `start` accepts.
    Idle,

    /// Job `i` is next to be submitted (or in flight inside `step`).
    Executing(usize),

    /// Job `i` settled successfully; waiting for the operator before the
    /// next irreversible submission.
    AwaitingConfirmation(usize),

    /// Terminal: every job submitted and confirmed.
    Completed,

    /// Terminal: run halted by a job failure or an operator abort.
    Failed(FailureInfo),
}

impl RunState {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed(_))
    }

    /// Check if a run is in progress (jobs may still be submitted)
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunState::Executing(_) | RunState::AwaitingConfirmation(_)
        )
    }

    /// Queue cursor, if the run is active.
    pub fn job_index(&self) -> Option<usize> {
        match self {
            RunState::Executing(i) | RunState::AwaitingConfirmation(i) => Some(*i),
            _ => None,
        }
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "IDLE",
            RunState::Executing(_) => "EXECUTING",
            RunState::AwaitingConfirmation(_) => "AWAITING_CONFIRMATION",
            RunState::Completed => "COMPLETED",
            RunState::Failed(_) => "FAILED",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Executing(i) => write!(f, "EXECUTING({})", i),
            RunState::AwaitingConfirmation(i) => write!(f, "AWAITING_CONFIRMATION({})", i),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
