use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Restaurant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cuisine: String,
    pub rating: f64,
    pub delivery_time: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: String,
    pub is_veg: bool,
    pub is_spicy: bool,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

/// One distinct menu item in the shopper's cart. A cart holds at most one
/// line per menu item id; repeat adds bump the quantity instead.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CartLine {
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub is_veg: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub service_fee: i64,
    pub total: i64,
    pub delivery_address: String,
    pub estimated_delivery: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of an order. Strictly forward-only: a status may only move to
/// its immediate successor, and `Delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Placed,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Placed,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "outForDelivery",
            OrderStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn next(self) -> Option<Self> {
        match self {
            OrderStatus::Placed => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Check a seller-requested advance. Only the immediate successor is
    /// accepted; everything else (skips, repeats, moves backwards, moves out
    /// of `Delivered`) is an invalid transition.
    pub fn validate_advance(self, target: Self) -> Result<(), String> {
        match self.next() {
            Some(next) if next == target => Ok(()),
            Some(_) => Err(format!(
                "cannot move from '{}' to '{}', expected '{}'",
                self.as_str(),
                target.as_str(),
                self.next().map(|s| s.as_str()).unwrap_or_default()
            )),
            None => Err(format!("'{}' is a terminal status", self.as_str())),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat per-order fees in cents, shared by cart totals and order creation.
#[derive(Debug, Clone, Copy)]
pub struct FeeSchedule {
    pub delivery_fee: i64,
    pub service_fee: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Totals {
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub service_fee: i64,
    pub total: i64,
}

impl Totals {
    /// Pure totals computation: line subtotal plus the flat fees. An empty
    /// cart still carries the fees, matching what checkout would charge.
    pub fn compute(lines: &[CartLine], fees: FeeSchedule) -> Self {
        let subtotal: i64 = lines
            .iter()
            .map(|line| line.price * i64::from(line.quantity))
            .sum();
        Self {
            subtotal,
            delivery_fee: fees.delivery_fee,
            service_fee: fees.service_fee,
            total: subtotal + fees.delivery_fee + fees.service_fee,
        }
    }
}

/// Canonical cart badge count: the sum of line quantities, not the number of
/// distinct lines.
pub fn item_count(lines: &[CartLine]) -> i64 {
    lines.iter().map(|line| i64::from(line.quantity)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn line(price: i64, quantity: i32) -> CartLine {
        CartLine {
            menu_item_id: Uuid::new_v4(),
            name: "Test Item".into(),
            price,
            quantity,
            is_veg: false,
        }
    }

    #[test]
    fn status_sequence_is_linear() {
        let mut status = OrderStatus::Placed;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            status = next;
            seen.push(status);
        }
        assert_eq!(seen, OrderStatus::ALL);
        assert!(status.is_terminal());
        assert_eq!(status, OrderStatus::Delivered);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("cancelled"), None);
        assert_eq!(OrderStatus::OutForDelivery.as_str(), "outForDelivery");
    }

    #[test]
    fn status_serde_uses_camel_case() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"outForDelivery\"");
        let back: OrderStatus = serde_json::from_str("\"placed\"").unwrap();
        assert_eq!(back, OrderStatus::Placed);
    }

    #[test]
    fn advance_accepts_only_immediate_successor() {
        assert!(OrderStatus::Placed.validate_advance(OrderStatus::Confirmed).is_ok());
        assert!(OrderStatus::Preparing
            .validate_advance(OrderStatus::OutForDelivery)
            .is_ok());
        // Skips, repeats and backwards moves are all rejected.
        assert!(OrderStatus::Placed.validate_advance(OrderStatus::Delivered).is_err());
        assert!(OrderStatus::Placed.validate_advance(OrderStatus::Placed).is_err());
        assert!(OrderStatus::Preparing.validate_advance(OrderStatus::Confirmed).is_err());
    }

    #[test]
    fn delivered_is_terminal_for_every_target() {
        for target in OrderStatus::ALL {
            assert!(OrderStatus::Delivered.validate_advance(target).is_err());
        }
    }

    #[test]
    fn totals_sum_lines_and_fees() {
        let fees = FeeSchedule {
            delivery_fee: 4999,
            service_fee: 2950,
        };
        let totals = Totals::compute(&[line(29999, 1)], fees);
        assert_eq!(totals.subtotal, 29999);
        assert_eq!(totals.total, 37948);
    }

    #[test]
    fn totals_of_empty_cart_are_just_fees() {
        let fees = FeeSchedule {
            delivery_fee: 299,
            service_fee: 150,
        };
        let totals = Totals::compute(&[], fees);
        assert_eq!(totals.subtotal, 0);
        assert_eq!(totals.total, 449);
    }

    #[test]
    fn totals_multiply_quantity() {
        let fees = FeeSchedule {
            delivery_fee: 0,
            service_fee: 0,
        };
        let totals = Totals::compute(&[line(1000, 2), line(500, 1)], fees);
        assert_eq!(totals.subtotal, 2500);
    }

    #[test]
    fn item_count_sums_quantities() {
        assert_eq!(item_count(&[]), 0);
        assert_eq!(item_count(&[line(1000, 2), line(500, 3)]), 5);
    }
}
