//! Payout Coordinator
//!
//! Drives one payout queue through the ledger port, strictly one job at a
//! time. Each transfer is irreversible and draws from a single shared
//! balance, so sequencing is the only concurrency-safety mechanism there
//! is: job i+1 is submitted only after job i's outcome is known and the
//! operator confirmed it.
//!
//! The first failed submission halts the entire run. Remaining jobs are
//! never attempted and nothing is retried; resuming means building a
//! fresh queue and starting a new run, because the partial completion has
//! already moved funds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::error::PayoutError;
use super::events::{EventSender, PayoutEventKind};
use super::ports::{BalanceSource, ConfidentialTransferService, NotificationSink, NotifyLevel};
use super::state::{FailureInfo, RunState};
use super::types::{CompletedJob, PayoutQueue, RunReport};
use crate::core_types::BatchId;

/// The two fixed pauses of a run.
///
/// Both are heuristic stand-ins for real confirmation polling; a
/// poll-until-confirmed primitive would replace them here without
/// touching the state machine.
#[derive(Debug, Clone)]
pub struct DelayConfig {
    /// Pause after a job's submission, before surfacing its result.
    pub settlement: Duration,
    /// Pause after operator confirmation, before the next submission.
    /// Deliberately longer than `settlement` so upstream state settles.
    pub inter_job: Duration,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            settlement: Duration::from_secs(10),
            inter_job: Duration::from_secs(15),
        }
    }
}

impl DelayConfig {
    /// Zero delays, for tests and non-interactive embedders.
    pub fn immediate() -> Self {
        Self {
            settlement: Duration::ZERO,
            inter_job: Duration::ZERO,
        }
    }
}

/// Operator verdict at a confirmation checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorDecision {
    Confirm,
    Abort,
}

/// Payout Coordinator - owns one run's queue, cursor and state
pub struct PayoutCoordinator {
    ledger: Arc<dyn ConfidentialTransferService>,
    balance: Arc<dyn BalanceSource>,
    notifier: Arc<dyn NotificationSink>,
    delays: DelayConfig,
    events: Option<EventSender>,
    batch_id: BatchId,
    state: RunState,
    queue: Option<PayoutQueue>,
    report: Option<RunReport>,
}

impl PayoutCoordinator {
    pub fn new(
        ledger: Arc<dyn ConfidentialTransferService>,
        balance: Arc<dyn BalanceSource>,
        notifier: Arc<dyn NotificationSink>,
        delays: DelayConfig,
    ) -> Self {
        if delays.inter_job <= delays.settlement && delays.inter_job != Duration::ZERO {
            warn!(
                settlement_ms = delays.settlement.as_millis() as u64,
                inter_job_ms = delays.inter_job.as_millis() as u64,
                "Inter-job delay should exceed the settlement delay"
            );
        }
        Self {
            ledger,
            balance,
            notifier,
            delays,
            events: None,
            batch_id: BatchId::new(),
            state: RunState::Idle,
            queue: None,
            report: None,
        }
    }

    /// Attach an event channel sender for state-transition observation.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    /// Report of the current or most recent run.
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    /// Begin a run: `Idle -> Executing(0)`.
    ///
    /// Validates the queue total against the available balance before
    /// anything is submitted; on rejection the state stays `Idle` and no
    /// external transfer call has been made.
    pub async fn start(&mut self, queue: PayoutQueue) -> Result<(), PayoutError> {
        if !matches!(self.state, RunState::Idle) {
            return Err(PayoutError::InvalidState {
                state: self.state.as_str(),
            });
        }

        let need = queue.total();
        let have = self.balance.available_balance().await;
        if need > have {
            self.notifier.notify(
                NotifyLevel::Error,
                &format!("Insufficient balance: need {}, have {}", need, have),
            );
            return Err(PayoutError::InsufficientBalance { need, have });
        }

        self.batch_id = BatchId::new();
        self.report = Some(RunReport::new(self.batch_id, queue.len()));
        info!(
            batch_id = %self.batch_id,
            jobs = queue.len(),
            total = %need,
            "Payout run started"
        );
        self.emit(PayoutEventKind::RunStarted {
            job_count: queue.len(),
            total: need,
        });
        self.notifier.notify(
            NotifyLevel::Info,
            &format!("Starting payout of {} jobs", queue.len()),
        );

        self.queue = Some(queue);
        self.state = RunState::Executing(0);
        Ok(())
    }

    /// Execute one step of the FSM: submit the job at the cursor.
    ///
    /// In `Executing(i)` this submits job i, waits the settlement delay,
    /// then transitions to `AwaitingConfirmation(i)` on success or halts
    /// the run in `Failed` on submission failure. In every other state
    /// the call is a no-op returning the current state.
    pub async fn step(&mut self) -> RunState {
        let RunState::Executing(index) = self.state else {
            return self.state.clone();
        };

        // the cursor and the state index move in lockstep
        let job = self
            .queue
            .as_ref()
            .and_then(|q| q.current())
            .cloned()
            .expect("Executing state without a job at the cursor");

        info!(
            batch_id = %self.batch_id,
            job_index = index,
            recipient = %job.recipient.short(),
            amount = %job.amount,
            "Submitting payout job"
        );
        self.emit(PayoutEventKind::JobSubmitting {
            index,
            recipient: job.recipient.short(),
            amount: job.amount,
        });

        let outcome = self.ledger.transfer(&job.recipient, job.amount).await;

        // settlement window: give the operator a look at the outcome
        // before the next irreversible step can be queued
        tokio::time::sleep(self.delays.settlement).await;

        match outcome {
            Ok(tx_id) => {
                info!(
                    batch_id = %self.batch_id,
                    job_index = index,
                    tx_id = %tx_id,
                    "Payout job settled"
                );
                self.notifier.notify(
                    NotifyLevel::Success,
                    &format!("Sent {} to {}", job.amount, job.recipient.short()),
                );
                self.emit(PayoutEventKind::JobSettled {
                    index,
                    tx_id: tx_id.to_string(),
                });
                if let Some(report) = self.report.as_mut() {
                    report.record(CompletedJob {
                        index,
                        recipient: job.recipient,
                        amount: job.amount,
                        tx_id,
                    });
                }

                self.emit(PayoutEventKind::AwaitingConfirmation { index });
                self.state = RunState::AwaitingConfirmation(index);
            }
            Err(failure) => {
                self.fail(FailureInfo::job(index, failure.reason, self.completed()));
            }
        }

        self.state.clone()
    }

    /// Operator confirmation of the settled job.
    ///
    /// `AwaitingConfirmation(i) -> Executing(i+1)` when jobs remain
    /// (after the inter-job delay), or `-> Completed` when job i was the
    /// last. Any other state is a state error: there is nothing to
    /// confirm.
    pub async fn confirm(&mut self) -> Result<RunState, PayoutError> {
        let RunState::AwaitingConfirmation(index) = self.state else {
            return Err(PayoutError::InvalidState {
                state: self.state.as_str(),
            });
        };

        let len = self.queue.as_ref().map(|q| q.len()).unwrap_or(0);
        if index + 1 == len {
            self.complete().await;
        } else {
            if let Some(queue) = self.queue.as_mut() {
                queue.advance();
            }
            // let the upstream balance settle before the next submission
            tokio::time::sleep(self.delays.inter_job).await;
            info!(
                batch_id = %self.batch_id,
                job_index = index + 1,
                "Operator confirmed, advancing to next job"
            );
            self.state = RunState::Executing(index + 1);
        }

        Ok(self.state.clone())
    }

    /// Operator abort at a job boundary.
    ///
    /// Honored in `Executing(i)` (before `step` submitted the job) and
    /// `AwaitingConfirmation(i)`; a job already handed to the ledger
    /// cannot be cancelled. Remaining jobs are never submitted.
    pub fn abort(&mut self) -> Result<RunState, PayoutError> {
        if !self.state.is_active() {
            return Err(PayoutError::InvalidState {
                state: self.state.as_str(),
            });
        }

        self.fail(FailureInfo::aborted(self.completed()));
        Ok(self.state.clone())
    }

    /// Drive a run to a terminal state, consulting `policy` at every
    /// confirmation checkpoint.
    ///
    /// The policy sees the settled job's index and the report so far.
    pub async fn run_to_completion<F>(
        &mut self,
        queue: PayoutQueue,
        mut policy: F,
    ) -> Result<RunState, PayoutError>
    where
        F: FnMut(usize, &RunReport) -> OperatorDecision,
    {
        self.start(queue).await?;

        loop {
            match self.state {
                RunState::Executing(_) => {
                    self.step().await;
                }
                RunState::AwaitingConfirmation(index) => {
                    let report = self.report.as_ref().expect("active run has a report");
                    match policy(index, report) {
                        OperatorDecision::Confirm => {
                            self.confirm().await?;
                        }
                        OperatorDecision::Abort => {
                            self.abort()?;
                        }
                    }
                }
                _ => return Ok(self.state.clone()),
            }
        }
    }

    /// Reset a terminal coordinator back to `Idle` for a fresh run.
    pub fn reset(&mut self) -> Result<(), PayoutError> {
        if !self.state.is_terminal() {
            return Err(PayoutError::InvalidState {
                state: self.state.as_str(),
            });
        }
        self.state = RunState::Idle;
        Ok(())
    }

    fn completed(&self) -> usize {
        self.report.as_ref().map(|r| r.completed_count()).unwrap_or(0)
    }

    async fn complete(&mut self) {
        info!(
            batch_id = %self.batch_id,
            completed = self.completed(),
            "Payout run completed"
        );

        self.balance.refresh().await;

        if let Some(report) = self.report.as_mut() {
            report.finish();
        }
        self.emit(PayoutEventKind::RunCompleted {
            completed: self.completed(),
        });
        self.notifier.notify(
            NotifyLevel::Success,
            &format!("All {} payouts completed", self.completed()),
        );

        // session state is discarded; only the report survives the run
        self.queue = None;
        self.state = RunState::Completed;
    }

    fn fail(&mut self, failure: FailureInfo) {
        warn!(
            batch_id = %self.batch_id,
            reason = %failure.reason,
            detail = %failure.detail,
            completed_before = failure.completed_before,
            "Payout run halted"
        );

        if let Some(report) = self.report.as_mut() {
            report.finish();
        }
        self.emit(PayoutEventKind::RunFailed {
            failure: failure.clone(),
        });
        self.notifier.notify(
            NotifyLevel::Error,
            &format!(
                "Payout halted ({}) after {} completed jobs",
                failure.reason, failure.completed_before
            ),
        );

        self.queue = None;
        self.state = RunState::Failed(failure);
    }

    fn emit(&self, kind: PayoutEventKind) {
        if let Some(events) = &self.events {
            events.emit(self.batch_id, kind);
        }
    }
}
