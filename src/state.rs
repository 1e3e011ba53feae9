use std::sync::Arc;

use crate::db::{DbPool, OrmConn};
use crate::events::{CartFeed, OrderFeed};
use crate::models::FeeSchedule;

/// Everything a handler needs, built once at startup and cloned per request.
/// The feeds live here (not in module globals) so tests can run isolated
/// instances side by side.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub fees: FeeSchedule,
    pub order_feed: Arc<OrderFeed>,
    pub cart_feed: Arc<CartFeed>,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, fees: FeeSchedule) -> Self {
        Self {
            pool,
            orm,
            fees,
            order_feed: Arc::new(OrderFeed::new()),
            cart_feed: Arc::new(CartFeed::new()),
        }
    }
}
