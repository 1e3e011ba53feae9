use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Restaurant;

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantList {
    pub items: Vec<Restaurant>,
}
