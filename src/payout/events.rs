//! Payout Event Channel
//!
//! Typed state-transition events over an mpsc channel. This is the
//! observation surface embedders subscribe to instead of re-render
//! callbacks; the coordinator never blocks on it and never finds out
//! whether anyone is listening.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use super::state::FailureInfo;
use crate::core_types::{AmountMinor, BatchId};

/// What happened.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PayoutEventKind {
    RunStarted {
        job_count: usize,
        total: AmountMinor,
    },
    JobSubmitting {
        index: usize,
        recipient: String,
        amount: AmountMinor,
    },
    JobSettled {
        index: usize,
        tx_id: String,
    },
    AwaitingConfirmation {
        index: usize,
    },
    RunCompleted {
        completed: usize,
    },
    RunFailed {
        failure: FailureInfo,
    },
}

/// One state transition of one run.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutEvent {
    pub batch_id: BatchId,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: PayoutEventKind,
}

/// Sender side of the event channel (held by the coordinator)
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<PayoutEvent>,
}

impl EventSender {
    /// Emit an event without waiting. A full or closed channel drops the
    /// event; observation must never stall the run.
    pub fn emit(&self, batch_id: BatchId, kind: PayoutEventKind) {
        let event = PayoutEvent {
            batch_id,
            at: Utc::now(),
            kind,
        };
        if let Err(e) = self.tx.try_send(event) {
            debug!(batch_id = %batch_id, "Payout event dropped: {}", e);
        }
    }
}

/// Receiver side of the event channel (held by the embedder)
pub struct EventReceiver {
    rx: mpsc::Receiver<PayoutEvent>,
}

impl EventReceiver {
    /// Receive the next event (None once the sender is gone).
    pub async fn recv(&mut self) -> Option<PayoutEvent> {
        self.rx.recv().await
    }

    /// Non-blocking receive.
    pub fn try_recv(&mut self) -> Option<PayoutEvent> {
        self.rx.try_recv().ok()
    }
}

/// Create a new event channel pair
pub fn event_channel(buffer: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender { tx }, EventReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_channel_delivers_in_order() {
        let (sender, mut receiver) = event_channel(8);
        let batch_id = BatchId::new();

        sender.emit(
            batch_id,
            PayoutEventKind::RunStarted {
                job_count: 2,
                total: 100,
            },
        );
        sender.emit(
            batch_id,
            PayoutEventKind::JobSubmitting {
                index: 0,
                recipient: "0x1234...5678".into(),
                amount: 50,
            },
        );

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.batch_id, batch_id);
        assert!(matches!(
            first.kind,
            PayoutEventKind::RunStarted { job_count: 2, .. }
        ));

        let second = receiver.recv().await.unwrap();
        assert!(matches!(
            second.kind,
            PayoutEventKind::JobSubmitting { index: 0, .. }
        ));
    }

    #[test]
    fn test_full_channel_drops_instead_of_blocking() {
        let (sender, mut receiver) = event_channel(1);
        let batch_id = BatchId::new();

        sender.emit(batch_id, PayoutEventKind::RunCompleted { completed: 1 });
        // second emit overflows the buffer and is dropped silently
        sender.emit(batch_id, PayoutEventKind::RunCompleted { completed: 2 });

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = PayoutEvent {
            batch_id: BatchId::new(),
            at: Utc::now(),
            kind: PayoutEventKind::JobSettled {
                index: 1,
                tx_id: "0xmock00000001".into(),
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"job_settled\""));
        assert!(json.contains("\"tx_id\":\"0xmock00000001\""));
    }
}
