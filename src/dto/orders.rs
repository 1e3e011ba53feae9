use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem, OrderStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub delivery_address: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvanceStatusRequest {
    /// Must be the immediate successor of the order's current status.
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Long-poll result for `GET /orders/{id}/changes`. When nothing changed
/// within the wait window, `changed` is false and `order` holds the current
/// persisted record so the client still converges.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderChangePoll {
    pub changed: bool,
    pub order: Order,
}
