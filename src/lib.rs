//! multipay - Multi-Recipient Confidential Payout Core
//!
//! Splits a total amount across a recipient roster by whole percents and
//! drives the resulting batch of irreversible transfers through an
//! external confidential-ledger service, strictly one job at a time.
//!
//! # Modules
//!
//! - [`core_types`] - Address, amount and batch-id types
//! - [`distribution`] - Percent-share allocator (equal split + manual rebalance)
//! - [`money`] - Decimal string ⇄ minor-unit conversion
//! - [`payout`] - Queue builder and the sequential orchestration FSM
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing initialization

pub mod config;
pub mod core_types;
pub mod distribution;
pub mod logging;
pub mod money;
pub mod payout;

// Convenient re-exports at crate root
pub use core_types::{Address, AddressError, AmountMinor, BatchId};
pub use distribution::{
    Allocator, DistributionEntry, DistributionMode, MAX_RECIPIENTS, equal_split, rebalance,
};
pub use money::{MoneyError, format_amount, format_amount_full, parse_amount};
pub use payout::{
    BalanceSource, CompletedJob, ConfidentialTransferService, DelayConfig, ErrorKind,
    FailureInfo, NotificationSink, NotifyLevel, OperatorDecision, PayoutCoordinator, PayoutError,
    PayoutEvent, PayoutEventKind, PayoutJob, PayoutQueue, RunReport, RunState, TransactionId,
    TransferFailure, build_queue, event_channel,
};

#[cfg(any(test, feature = "mock-ledger"))]
pub use payout::MockLedger;
