use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services. Consumed in-process by the
/// logging worker; the channel is the seam where outbound integrations
/// (webhooks, queues) would attach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        order_number: String,
    },
    CouponApplied {
        order_id: Uuid,
        code: String,
    },
    StockDeducted {
        product_id: Uuid,
        previous: i32,
        remaining: i32,
    },
    StockDepleted {
        product_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates the event channel pair used at startup and in tests.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until every sender
/// is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                order_number,
            } => {
                info!(%order_id, %order_number, "order created");
            }
            Event::CouponApplied { order_id, code } => {
                info!(%order_id, %code, "coupon applied to order");
            }
            Event::StockDeducted {
                product_id,
                previous,
                remaining,
            } => {
                info!(%product_id, previous, remaining, "stock deducted");
            }
            Event::StockDepleted { product_id } => {
                warn!(%product_id, "product stock depleted");
            }
        }
    }
    info!("event channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (sender, mut receiver) = channel(4);
        let product_id = Uuid::new_v4();
        sender
            .send(Event::StockDepleted { product_id })
            .await
            .expect("send succeeds");
        match receiver.recv().await {
            Some(Event::StockDepleted { product_id: got }) => assert_eq!(got, product_id),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_fails_once_the_receiver_is_gone() {
        let (sender, receiver) = channel(1);
        drop(receiver);
        let result = sender
            .send(Event::StockDepleted {
                product_id: Uuid::new_v4(),
            })
            .await;
        assert!(result.is_err());
    }
}
