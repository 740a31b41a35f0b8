//! Payout Core Types
//!
//! The queue of money-moving operations for one run, and the report that
//! survives it. Jobs are created by the queue builder, consumed exactly
//! once by the coordinator and never mutated.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core_types::{Address, AmountMinor, BatchId};

/// Ledger-assigned identifier of an accepted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One irreversible transfer: this recipient, this amount.
///
/// `amount` is always greater than zero; zero-value entries are dropped
/// by the builder before a job is ever created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutJob {
    pub recipient: Address,
    pub amount: AmountMinor,
}

/// Ordered sequence of payout jobs plus the run cursor.
///
/// Owned exclusively by the coordinator for the duration of one run and
/// discarded on completion or failure.
#[derive(Debug, Clone)]
pub struct PayoutQueue {
    jobs: Vec<PayoutJob>,
    cursor: usize,
}

impl PayoutQueue {
    /// Wrap a non-empty job list. Callers go through the builder, which
    /// guarantees non-emptiness; this constructor just trusts it.
    pub(crate) fn new(jobs: Vec<PayoutJob>) -> Self {
        Self { jobs, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[PayoutJob] {
        &self.jobs
    }

    /// The job at the cursor, if any remain.
    pub fn current(&self) -> Option<&PayoutJob> {
        self.jobs.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor past the current job.
    pub(crate) fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Sum of all job amounts. Cannot overflow in practice: every amount
    /// is a floor-share of one checked `u128` total.
    pub fn total(&self) -> AmountMinor {
        self.jobs.iter().map(|j| j.amount).sum()
    }
}

/// One completed submission within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedJob {
    pub index: usize,
    pub recipient: Address,
    pub amount: AmountMinor,
    pub tx_id: TransactionId,
}

/// What happened during one run: which jobs the ledger accepted, with
/// their transaction ids, and when the run started and ended.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub batch_id: BatchId,
    pub total_jobs: usize,
    pub completed: Vec<CompletedJob>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub(crate) fn new(batch_id: BatchId, total_jobs: usize) -> Self {
        Self {
            batch_id,
            total_jobs,
            completed: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record(&mut self, job: CompletedJob) {
        self.completed.push(job);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of jobs the ledger accepted.
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}
