//! Payout Queue Builder
//!
//! Turns a total amount plus a validated distribution into the exact list
//! of money-moving operations for one run. Everything here is checked
//! integer arithmetic; floating point could silently misallocate funds
//! and is forbidden.

use std::collections::HashSet;

use super::error::PayoutError;
use super::types::{PayoutJob, PayoutQueue};
use crate::core_types::{Address, AmountMinor};
use crate::distribution::FULL_SHARE;

/// Build the payout queue for one run.
///
/// Preconditions are checked fail-fast, before any amount is computed,
/// so a rejected call never produces a partial queue:
/// - roster and share vector are non-empty and the same length
/// - no duplicate recipients
/// - shares sum to exactly 100
/// - `total` is greater than zero
///
/// Each recipient gets `floor(total * share / 100)`. Entries whose
/// computed amount is zero are dropped, not queued; a zero-value transfer
/// is not a valid on-ledger operation. The survivors keep recipient
/// insertion order. If nothing survives the queue is not built and
/// `no-eligible-transfers` is reported instead.
pub fn build_queue(
    total: AmountMinor,
    recipients: &[Address],
    shares: &[u8],
) -> Result<PayoutQueue, PayoutError> {
    if recipients.is_empty() {
        return Err(PayoutError::EmptyRoster);
    }
    if recipients.len() != shares.len() {
        return Err(PayoutError::DistributionSum(
            shares.iter().map(|&s| u32::from(s)).sum(),
        ));
    }

    let mut seen = HashSet::with_capacity(recipients.len());
    for addr in recipients {
        if !seen.insert(addr) {
            return Err(PayoutError::DuplicateRecipient(addr.short()));
        }
    }

    let sum: u32 = shares.iter().map(|&s| u32::from(s)).sum();
    if sum != FULL_SHARE {
        return Err(PayoutError::DistributionSum(sum));
    }

    if total == 0 {
        return Err(PayoutError::InvalidAmount);
    }

    let mut jobs = Vec::with_capacity(recipients.len());
    for (recipient, &share) in recipients.iter().zip(shares) {
        let amount = total
            .checked_mul(AmountMinor::from(share))
            .ok_or(PayoutError::AmountOverflow)?
            / AmountMinor::from(FULL_SHARE);

        if amount > 0 {
            jobs.push(PayoutJob {
                recipient: recipient.clone(),
                amount,
            });
        }
    }

    if jobs.is_empty() {
        return Err(PayoutError::NoEligibleTransfers);
    }

    Ok(PayoutQueue::new(jobs))
}
