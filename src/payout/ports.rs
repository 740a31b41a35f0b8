//! External Ports
//!
//! The three capabilities the payout core touches in the outside world.
//! All of them are object-safe traits injected as `Arc<dyn …>`; the
//! ledger's cryptography and session handling live behind them and are
//! out of scope here.

use async_trait::async_trait;
use thiserror::Error;

use super::types::TransactionId;
use crate::core_types::{Address, AmountMinor};

/// A single job's submission was rejected by the ledger service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct TransferFailure {
    pub reason: String,
}

impl TransferFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The single money-moving capability.
///
/// A returned `TransactionId` means the ledger accepted the transfer and
/// it is irreversible; there is no cancel.
#[async_trait]
pub trait ConfidentialTransferService: Send + Sync {
    async fn transfer(
        &self,
        recipient: &Address,
        amount: AmountMinor,
    ) -> Result<TransactionId, TransferFailure>;
}

/// Read-side view of the shared balance the run draws from.
///
/// Used only for pre-run validation; nothing here is transactional.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Currently spendable balance, in minor units.
    async fn available_balance(&self) -> AmountMinor;

    /// Ask the upstream source to re-read its balance. Called once on
    /// run completion.
    async fn refresh(&self);
}

/// Severity of an operator-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Error,
}

/// One-way reporting channel towards the operator.
///
/// Strictly observational: nothing the sink does may influence control
/// flow, so the method is infallible and synchronous.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str);
}

// ============================================================================
// Mock ledger (tests and the demo binary)
// ============================================================================

/// In-process stand-in for the confidential ledger.
#[cfg(any(test, feature = "mock-ledger"))]
pub mod mock {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Implements all three ports with failure injection and call
    /// counting so tests can verify ordering and halt behavior.
    pub struct MockLedger {
        balance: Mutex<AmountMinor>,
        transfers: Mutex<Vec<(Address, AmountMinor)>>,
        notices: Mutex<Vec<(NotifyLevel, String)>>,
        transfer_count: AtomicUsize,
        refresh_count: AtomicUsize,
        /// 0-based transfer call that should fail, if any.
        fail_on_call: Mutex<Option<usize>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockLedger {
        pub fn new(balance: AmountMinor) -> Self {
            Self {
                balance: Mutex::new(balance),
                transfers: Mutex::new(Vec::new()),
                notices: Mutex::new(Vec::new()),
                transfer_count: AtomicUsize::new(0),
                refresh_count: AtomicUsize::new(0),
                fail_on_call: Mutex::new(None),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        /// Make the n-th transfer call (0-based) fail.
        pub fn set_fail_on_call(&self, n: usize) {
            *self.fail_on_call.lock().unwrap() = Some(n);
        }

        pub fn transfer_count(&self) -> usize {
            self.transfer_count.load(Ordering::SeqCst)
        }

        pub fn refresh_count(&self) -> usize {
            self.refresh_count.load(Ordering::SeqCst)
        }

        /// Every accepted transfer, in submission order.
        pub fn transfers(&self) -> Vec<(Address, AmountMinor)> {
            self.transfers.lock().unwrap().clone()
        }

        /// Highest number of transfer calls ever in flight at once.
        /// Anything above 1 means the coordinator overlapped submissions.
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn notices(&self) -> Vec<(NotifyLevel, String)> {
            self.notices.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConfidentialTransferService for MockLedger {
        async fn transfer(
            &self,
            recipient: &Address,
            amount: AmountMinor,
        ) -> Result<TransactionId, TransferFailure> {
            let active = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(active, Ordering::SeqCst);
            // Yield so an overlapping submission would actually be observed
            tokio::task::yield_now().await;

            let call = self.transfer_count.fetch_add(1, Ordering::SeqCst);
            let result = if *self.fail_on_call.lock().unwrap() == Some(call) {
                Err(TransferFailure::new("mock transfer failure"))
            } else {
                let mut balance = self.balance.lock().unwrap();
                *balance = balance.saturating_sub(amount);
                self.transfers
                    .lock()
                    .unwrap()
                    .push((recipient.clone(), amount));
                Ok(TransactionId(format!("0xmock{:08x}", call)))
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    #[async_trait]
    impl BalanceSource for MockLedger {
        async fn available_balance(&self) -> AmountMinor {
            *self.balance.lock().unwrap()
        }

        async fn refresh(&self) {
            self.refresh_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl NotificationSink for MockLedger {
        fn notify(&self, level: NotifyLevel, message: &str) {
            self.notices
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn addr(n: u8) -> Address {
            format!("0x{:040x}", n).parse().unwrap()
        }

        #[tokio::test]
        async fn test_mock_ledger_success_deducts_balance() {
            let ledger = MockLedger::new(1_000);

            let tx = ledger.transfer(&addr(1), 400).await.unwrap();
            assert!(tx.0.starts_with("0xmock"));
            assert_eq!(ledger.available_balance().await, 600);
            assert_eq!(ledger.transfer_count(), 1);
            assert_eq!(ledger.transfers().len(), 1);
        }

        #[tokio::test]
        async fn test_mock_ledger_failure_injection() {
            let ledger = MockLedger::new(1_000);
            ledger.set_fail_on_call(1);

            assert!(ledger.transfer(&addr(1), 100).await.is_ok());
            let err = ledger.transfer(&addr(2), 100).await.unwrap_err();
            assert_eq!(err.reason, "mock transfer failure");

            // failed call moved no funds and recorded no transfer
            assert_eq!(ledger.available_balance().await, 900);
            assert_eq!(ledger.transfers().len(), 1);
            assert_eq!(ledger.transfer_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_ledger_counts_refresh_and_notices() {
            let ledger = MockLedger::new(0);
            ledger.refresh().await;
            ledger.notify(NotifyLevel::Info, "hello");

            assert_eq!(ledger.refresh_count(), 1);
            assert_eq!(ledger.notices(), vec![(NotifyLevel::Info, "hello".into())]);
        }
    }
}

#[cfg(any(test, feature = "mock-ledger"))]
pub use mock::MockLedger;
