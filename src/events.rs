use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Cloneable handle for publishing domain events onto the internal bus.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event. Failures are logged by callers that care; the bus is
    /// best-effort and never blocks a request on delivery.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Domain events emitted by the services after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    CustomerDeleted(Uuid),

    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),

    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    StockAdjusted {
        product_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
    },

    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderDeleted(Uuid),

    ReceivablesRecorded {
        order_id: Uuid,
        installments: i32,
    },
}

/// Drains the event channel and logs each event. Runs as a background task
/// for the lifetime of the process.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockAdjusted {
                product_id,
                old_quantity,
                new_quantity,
            } => {
                info!(
                    %product_id,
                    old_quantity,
                    new_quantity,
                    "Stock level adjusted"
                );
                if *new_quantity == 0 {
                    warn!(%product_id, "Product is out of stock");
                }
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "Order status changed");
            }
            Event::ReceivablesRecorded {
                order_id,
                installments,
            } => {
                info!(%order_id, installments, "Receivables recorded for order");
            }
            other => {
                info!(event = ?other, "Event processed");
            }
        }
    }

    info!("Event channel closed, stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::OrderCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::CustomerCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
