use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{menu::MenuItemList, restaurants::RestaurantList},
    error::AppResult,
    models::Restaurant,
    response::ApiResponse,
    routes::params::{MenuQuery, RestaurantQuery},
    services::restaurant_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_restaurants))
        .route("/{id}", get(get_restaurant))
        .route("/{id}/menu", get(list_menu))
}

#[utoipa::path(
    get,
    path = "/api/restaurants",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search by name or cuisine")
    ),
    responses(
        (status = 200, description = "List restaurants", body = ApiResponse<RestaurantList>)
    ),
    tag = "Restaurants"
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(query): Query<RestaurantQuery>,
) -> AppResult<Json<ApiResponse<RestaurantList>>> {
    let resp = restaurant_service::list_restaurants(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Restaurant details", body = ApiResponse<Restaurant>),
        (status = 404, description = "Not Found")
    ),
    tag = "Restaurants"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::get_restaurant(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/{id}/menu",
    params(
        ("id" = Uuid, Path, description = "Restaurant ID"),
        ("category" = Option<String>, Query, description = "Filter by category")
    ),
    responses(
        (status = 200, description = "Available menu items", body = ApiResponse<MenuItemList>),
        (status = 404, description = "Not Found")
    ),
    tag = "Restaurants"
)]
pub async fn list_menu(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<MenuQuery>,
) -> AppResult<Json<ApiResponse<MenuItemList>>> {
    let resp = restaurant_service::list_menu(&state, id, query).await?;
    Ok(Json(resp))
}
