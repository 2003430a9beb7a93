use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the checkout core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    PaymentIntentCreated {
        order_id: Uuid,
        intent_id: String,
    },
    OrderConfirmed {
        order_id: Uuid,
        payment_id: String,
    },
    /// A capture arrived for an order that was already settled; no side
    /// effects were applied.
    OrderCaptureReplayed(Uuid),
    /// Stock was clamped at zero during capture: a concurrent order consumed
    /// inventory between this order's intent and its capture. The hook for a
    /// downstream reconciliation workflow.
    OversellDetected {
        order_id: Uuid,
        product_id: Uuid,
        requested: i32,
        fulfilled: i32,
    },
    CartPurged(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Event worker: drains the channel and records each event. Runs until the
/// sending side is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OversellDetected {
                order_id,
                product_id,
                requested,
                fulfilled,
            } => {
                warn!(
                    order_id = %order_id,
                    product_id = %product_id,
                    requested = requested,
                    fulfilled = fulfilled,
                    "oversell detected; order needs manual reconciliation"
                );
            }
            other => {
                info!(event = ?other, "domain event");
            }
        }
    }
    info!("Event processor stopped");
}
