//! Payout Error Types
//!
//! One taxonomy for the whole batch-payout core: validation problems that
//! block a run before any external call, a single job's submission failure
//! (which halts the run), and operations requested in an incompatible state.

use thiserror::Error;

use crate::core_types::{AddressError, AmountMinor};

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, caught before any external call.
    Validation,
    /// A job's external submission failed. Never retried.
    Transfer,
    /// Operation incompatible with the current run state.
    State,
}

/// Payout error types
///
/// Error codes are stable strings so embedders and logs can match on them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayoutError {
    // === Validation Errors ===
    #[error("Invalid recipient address: {0:?}")]
    InvalidAddress(String),

    #[error("Duplicate recipient: {0}")]
    DuplicateRecipient(String),

    #[error("Recipient roster is full (limit {0})")]
    RosterFull(usize),

    #[error("No recipients configured")]
    EmptyRoster,

    #[error("Distribution sums to {0}, expected exactly 100")]
    DistributionSum(u32),

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Amount would overflow")]
    AmountOverflow,

    #[error("No eligible transfers (every computed amount is zero)")]
    NoEligibleTransfers,

    #[error("Insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: AmountMinor, have: AmountMinor },

    // === Transfer Errors ===
    #[error("Job {index} failed: {reason}")]
    JobFailed { index: usize, reason: String },

    // === State Errors ===
    #[error("Operation not valid in state {state}")]
    InvalidState { state: &'static str },
}

impl PayoutError {
    /// Stable error code for logs and notifications.
    pub fn code(&self) -> &'static str {
        match self {
            PayoutError::InvalidAddress(_) => "invalid-address",
            PayoutError::DuplicateRecipient(_) => "duplicate-recipient",
            PayoutError::RosterFull(_) => "roster-full",
            PayoutError::EmptyRoster => "empty-roster",
            PayoutError::DistributionSum(_) => "distribution-sum",
            PayoutError::InvalidAmount => "invalid-amount",
            PayoutError::AmountOverflow => "amount-overflow",
            PayoutError::NoEligibleTransfers => "no-eligible-transfers",
            PayoutError::InsufficientBalance { .. } => "insufficient-balance",
            PayoutError::JobFailed { .. } => "job-failed",
            PayoutError::InvalidState { .. } => "invalid-state",
        }
    }

    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PayoutError::InvalidAddress(_)
            | PayoutError::DuplicateRecipient(_)
            | PayoutError::RosterFull(_)
            | PayoutError::EmptyRoster
            | PayoutError::DistributionSum(_)
            | PayoutError::InvalidAmount
            | PayoutError::AmountOverflow
            | PayoutError::NoEligibleTransfers
            | PayoutError::InsufficientBalance { .. } => ErrorKind::Validation,
            PayoutError::JobFailed { .. } => ErrorKind::Transfer,
            PayoutError::InvalidState { .. } => ErrorKind::State,
        }
    }
}

impl From<AddressError> for PayoutError {
    fn from(e: AddressError) -> Self {
        PayoutError::InvalidAddress(e.0)
    }
}
