use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutRequest, OrderChangePoll, OrderList, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::{ChangesQuery, OrderListQuery},
    services::order_service,
    state::AppState,
};

const DEFAULT_WAIT_SECS: u64 = 25;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/{id}", get(get_order))
        .route("/{id}/changes", get(order_changes))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "List the caller's orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_customer_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Cart converted into a placed order", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart or missing address")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::checkout(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_customer_order(&state, &user, id).await?;
    Ok(Json(resp))
}

/// Long-poll for the next change to an order. Subscribes to the in-process
/// feed, waits up to `wait` seconds, and falls back to the current persisted
/// record so a quiet window still returns the latest state. Clients simply
/// poll again; dropping out of the loop is the unsubscribe.
#[utoipa::path(
    get,
    path = "/api/orders/{id}/changes",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("wait" = Option<u64>, Query, description = "Seconds to wait, 1-60, default 25")
    ),
    responses(
        (status = 200, description = "Next change or current state", body = ApiResponse<OrderChangePoll>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_changes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ChangesQuery>,
) -> AppResult<Json<ApiResponse<OrderChangePoll>>> {
    order_service::authorize_watch(&state, &user, id).await?;

    let mut rx = state.order_feed.subscribe(id);
    let wait = query.wait.unwrap_or(DEFAULT_WAIT_SECS).clamp(1, 60);

    let poll = match tokio::time::timeout(Duration::from_secs(wait), rx.recv()).await {
        Ok(Ok(change)) => OrderChangePoll {
            changed: true,
            order: change.order,
        },
        // Lagged, closed or timed out: hand back the latest persisted state
        // so the client converges either way.
        Ok(Err(_)) | Err(_) => OrderChangePoll {
            changed: false,
            order: order_service::fetch_order(&state, id).await?,
        },
    };

    let message = if poll.changed { "Order changed" } else { "No change" };
    Ok(Json(ApiResponse::success(message, poll, Some(Meta::empty()))))
}
