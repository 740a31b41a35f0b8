//! Batch Payout FSM
//!
//! Sequential orchestration of one batch of irreversible transfers
//! through an external confidential-ledger service.
//!
//! # State Machine
//!
//! ```text
//! IDLE → EXECUTING(0) → AWAITING_CONFIRMATION(0) → EXECUTING(1) → ... → COMPLETED
//!             ↓                      ↓
//!           FAILED ←───────── (abort / job failure)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **One job in flight, ever**: job i+1 is submitted only after job i's
//!    outcome is known and the operator confirmed. The shared balance has
//!    no lock; sequencing is the lock.
//! 2. **Halt on first failure**: a failed submission ends the run. No
//!    automatic retry, no skipping ahead.
//! 3. **Boundary-only abort**: a job already accepted by the ledger is
//!    irreversible and cannot be cancelled.
//! 4. **Session-scoped state**: queue and cursor are discarded at every
//!    terminal transition; only the run report survives.

pub mod coordinator;
pub mod error;
pub mod events;
pub mod ports;
pub mod queue;
pub mod state;
pub mod types;


// Re-exports for convenience
pub use coordinator::{DelayConfig, OperatorDecision, PayoutCoordinator};
pub use error::{ErrorKind, PayoutError};
pub use events::{EventReceiver, EventSender, PayoutEvent, PayoutEventKind, event_channel};
pub use ports::{
    BalanceSource, ConfidentialTransferService, NotificationSink, NotifyLevel, TransferFailure,
};
#[cfg(any(test, feature = "mock-ledger"))]
pub use ports::MockLedger;
pub use queue::build_queue;
pub use state::{FailureInfo, RunState};
pub use types::{CompletedJob, PayoutJob, PayoutQueue, RunReport, TransactionId};
