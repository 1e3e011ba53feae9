use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::{
        menu::{
            CreateMenuItemRequest, MenuItemList, SetAvailabilityRequest, UpdateMenuItemRequest,
        },
        orders::{AdvanceStatusRequest, OrderList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{MenuItem, Order},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{menu_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", patch(advance_status))
        .route("/menu", get(list_menu).post(create_menu_item))
        .route("/menu/{id}", patch(update_menu_item))
        .route("/menu/{id}/availability", patch(set_availability))
}

#[utoipa::path(
    get,
    path = "/api/seller/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Orders for the seller's restaurant", body = ApiResponse<OrderList>),
        (status = 403, description = "Not a seller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let restaurant = menu_service::restaurant_for_owner(&state, &user).await?;
    let resp = order_service::list_restaurant_orders(&state, restaurant.id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/seller/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AdvanceStatusRequest,
    responses(
        (status = 200, description = "Status advanced", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Not the immediate successor status"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn advance_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let restaurant = menu_service::restaurant_for_owner(&state, &user).await?;
    let resp =
        order_service::advance_status(&state, &user, restaurant.id, id, payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller/menu",
    responses(
        (status = 200, description = "Full menu including unavailable items", body = ApiResponse<MenuItemList>),
        (status = 403, description = "Not a seller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn list_menu(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MenuItemList>>> {
    let resp = menu_service::list_menu(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/seller/menu",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item created", body = ApiResponse<MenuItem>),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::create_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/seller/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<MenuItem>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::update_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/seller/menu/{id}/availability",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = SetAvailabilityRequest,
    responses(
        (status = 200, description = "Availability toggled", body = ApiResponse<MenuItem>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn set_availability(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetAvailabilityRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::set_availability(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
