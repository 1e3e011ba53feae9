//! In-process change feeds for orders and carts.
//!
//! Writers publish after the row is persisted; readers hold a
//! `broadcast::Receiver` and see every event published while subscribed
//! (at-least-once, no coalescing). Dropping the receiver unsubscribes.
//! The HTTP layer decides how to push events out (currently long-poll),
//! so the transport can change without touching the services.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, Totals};

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
}

/// A persisted change to a single order record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderChange {
    pub kind: ChangeKind,
    pub order: Order,
}

/// Aggregate snapshot broadcast after every cart mutation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartChange {
    pub item_count: i64,
    pub totals: Totals,
}

struct Feed<E> {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<E>>>,
}

impl<E: Clone> Feed<E> {
    fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn subscribe(&self, key: Uuid) -> broadcast::Receiver<E> {
        let mut channels = self.channels.lock().expect("feed lock poisoned");
        // Abandoned keys are dropped here as well as on publish, so a key
        // that is never published again does not pin a channel forever.
        channels.retain(|_, tx| tx.receiver_count() > 0);
        channels
            .entry(key)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn publish(&self, key: Uuid, event: E) {
        let mut channels = self.channels.lock().expect("feed lock poisoned");
        if let Some(tx) = channels.get(&key) {
            // send only fails when every receiver is gone; drop the channel
            // so abandoned keys don't accumulate.
            if tx.send(event).is_err() {
                channels.remove(&key);
            }
        }
    }
}

/// Change feed keyed by order id. The seller dashboard writes through the
/// order service, which publishes here; the customer tracking view reads.
pub struct OrderFeed {
    inner: Feed<OrderChange>,
}

impl OrderFeed {
    pub fn new() -> Self {
        Self { inner: Feed::new() }
    }

    pub fn subscribe(&self, order_id: Uuid) -> broadcast::Receiver<OrderChange> {
        self.inner.subscribe(order_id)
    }

    pub fn publish(&self, change: OrderChange) {
        self.inner.publish(change.order.id, change);
    }
}

impl Default for OrderFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Change feed keyed by the cart owner's user id, used for the header badge
/// count and the cart page.
pub struct CartFeed {
    inner: Feed<CartChange>,
}

impl CartFeed {
    pub fn new() -> Self {
        Self { inner: Feed::new() }
    }

    pub fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<CartChange> {
        self.inner.subscribe(user_id)
    }

    pub fn publish(&self, user_id: Uuid, change: CartChange) {
        self.inner.publish(user_id, change);
    }
}

impl Default for CartFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeeSchedule, OrderStatus, Totals};
    use chrono::Utc;

    fn order(id: Uuid, status: OrderStatus) -> Order {
        Order {
            id,
            customer_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            restaurant_name: "Spice Garden".into(),
            status,
            subtotal: 1000,
            delivery_fee: 299,
            service_fee: 150,
            total: 1449,
            delivery_address: "12 Main St".into(),
            estimated_delivery: "25-30 min".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_sees_every_update_in_order() {
        let feed = OrderFeed::new();
        let id = Uuid::new_v4();
        let mut rx = feed.subscribe(id);

        feed.publish(OrderChange {
            kind: ChangeKind::Update,
            order: order(id, OrderStatus::Confirmed),
        });
        feed.publish(OrderChange {
            kind: ChangeKind::Update,
            order: order(id, OrderStatus::Preparing),
        });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.order.status, OrderStatus::Confirmed);
        assert_eq!(second.order.status, OrderStatus::Preparing);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let feed = OrderFeed::new();
        let id = Uuid::new_v4();
        feed.publish(OrderChange {
            kind: ChangeKind::Insert,
            order: order(id, OrderStatus::Placed),
        });
        // A later subscriber starts from the next event, not history.
        let mut rx = feed.subscribe(id);
        feed.publish(OrderChange {
            kind: ChangeKind::Update,
            order: order(id, OrderStatus::Confirmed),
        });
        assert_eq!(rx.recv().await.unwrap().order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn dropped_receivers_do_not_leak_channels() {
        let feed = OrderFeed::new();
        let id = Uuid::new_v4();
        let rx = feed.subscribe(id);
        drop(rx);
        // First publish after the last receiver is gone prunes the entry.
        feed.publish(OrderChange {
            kind: ChangeKind::Update,
            order: order(id, OrderStatus::Confirmed),
        });
        assert!(feed.inner.channels.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribe_prunes_abandoned_keys() {
        let feed = OrderFeed::new();
        let stale = Uuid::new_v4();
        drop(feed.subscribe(stale));
        // No publish for `stale` ever happens; the next subscribe cleans up.
        let live = Uuid::new_v4();
        let _rx = feed.subscribe(live);
        let channels = feed.inner.channels.lock().unwrap();
        assert_eq!(channels.len(), 1);
        assert!(channels.contains_key(&live));
    }

    #[tokio::test]
    async fn feeds_are_scoped_per_key() {
        let feed = OrderFeed::new();
        let tracked = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut rx = feed.subscribe(tracked);

        feed.publish(OrderChange {
            kind: ChangeKind::Update,
            order: order(other, OrderStatus::Confirmed),
        });
        assert!(rx.try_recv().is_err());

        feed.publish(OrderChange {
            kind: ChangeKind::Update,
            order: order(tracked, OrderStatus::Confirmed),
        });
        assert_eq!(rx.try_recv().unwrap().order.id, tracked);
    }

    #[tokio::test]
    async fn cart_feed_carries_count_and_totals() {
        let feed = CartFeed::new();
        let user = Uuid::new_v4();
        let mut rx = feed.subscribe(user);

        let totals = Totals::compute(
            &[],
            FeeSchedule {
                delivery_fee: 299,
                service_fee: 150,
            },
        );
        feed.publish(
            user,
            CartChange {
                item_count: 3,
                totals,
            },
        );
        let change = rx.recv().await.unwrap();
        assert_eq!(change.item_count, 3);
        assert_eq!(change.totals.total, 449);
    }
}
