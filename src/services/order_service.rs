use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        menu_items::{Column as MenuCol, Entity as MenuItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        restaurants::Entity as Restaurants,
    },
    error::{AppError, AppResult},
    events::{ChangeKind, OrderChange},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, Totals},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::cart_service,
    state::AppState,
};

/// Snapshot of one line at order-creation time. Name and price are copied
/// out of the menu so later menu edits never rewrite an old order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

/// Create an order in `placed` with totals computed from the items plus the
/// flat fees. Publishes an insert on the order feed once committed.
pub async fn create_order(
    state: &AppState,
    customer_id: Uuid,
    restaurant_id: Uuid,
    items: Vec<NewOrderItem>,
    delivery_address: String,
) -> AppResult<OrderWithItems> {
    if items.is_empty() {
        return Err(AppError::Validation(
            "Order must contain at least one item".into(),
        ));
    }
    if items.iter().any(|item| item.quantity < 1) {
        return Err(AppError::Validation(
            "Order item quantity must be at least 1".into(),
        ));
    }

    let restaurant = Restaurants::find_by_id(restaurant_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let subtotal: i64 = items
        .iter()
        .map(|item| item.price * i64::from(item.quantity))
        .sum();
    let totals = Totals {
        subtotal,
        delivery_fee: state.fees.delivery_fee,
        service_fee: state.fees.service_fee,
        total: subtotal + state.fees.delivery_fee + state.fees.service_fee,
    };

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        restaurant_id: Set(restaurant.id),
        restaurant_name: Set(restaurant.name.clone()),
        status: Set(OrderStatus::Placed.as_str().to_string()),
        subtotal: Set(totals.subtotal),
        delivery_fee: Set(totals.delivery_fee),
        service_fee: Set(totals.service_fee),
        total: Set(totals.total),
        delivery_address: Set(delivery_address),
        estimated_delivery: Set(restaurant.delivery_time.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items = Vec::with_capacity(items.len());
    for item in items {
        let inserted = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            menu_item_id: Set(item.menu_item_id),
            name: Set(item.name),
            price: Set(item.price),
            quantity: Set(item.quantity),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(inserted));
    }

    txn.commit().await?;

    let order = order_from_entity(order)?;
    state.order_feed.publish(OrderChange {
        kind: ChangeKind::Insert,
        order: order.clone(),
    });

    Ok(OrderWithItems {
        order,
        items: order_items,
    })
}

/// Turn the shopper's cart into an order, then empty the cart. The cart's
/// single-restaurant invariant means the first line pins the restaurant.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.delivery_address.trim().is_empty() {
        return Err(AppError::Validation("Delivery address is required".into()));
    }

    let lines = cart_service::load_lines(state, user.user_id).await?;
    if lines.is_empty() {
        return Err(AppError::Validation("Cart is empty".into()));
    }

    let restaurant_id: Uuid = MenuItems::find()
        .filter(MenuCol::Id.eq(lines[0].menu_item_id))
        .one(&state.orm)
        .await?
        .map(|item| item.restaurant_id)
        .ok_or(AppError::NotFound)?;

    let items = lines
        .into_iter()
        .map(|line| NewOrderItem {
            menu_item_id: line.menu_item_id,
            name: line.name,
            price: line.price,
            quantity: line.quantity,
        })
        .collect();

    let created = create_order(
        state,
        user.user_id,
        restaurant_id,
        items,
        payload.delivery_address,
    )
    .await?;

    cart_service::clear(state, user).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": created.order.id, "total": created.order.total }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        created,
        Some(Meta::empty()),
    ))
}

/// Read the bare order record.
pub async fn fetch_order(state: &AppState, id: Uuid) -> AppResult<Order> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    order_from_entity(order)
}

async fn fetch_order_items(state: &AppState, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();
    Ok(items)
}

/// Customer view of a single order. A foreign order reads as `NotFound`
/// rather than leaking its existence.
pub async fn get_customer_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = fetch_order(state, id).await?;
    if order.customer_id != user.user_id {
        return Err(AppError::NotFound);
    }
    let items = fetch_order_items(state, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// Both sides of an order may watch it for changes: the customer who placed
/// it and the seller who owns the restaurant. Anyone else sees `NotFound`.
pub async fn authorize_watch(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<Order> {
    let order = fetch_order(state, id).await?;
    if order.customer_id == user.user_id {
        return Ok(order);
    }
    if user.role == crate::middleware::auth::ROLE_SELLER {
        let owned = Restaurants::find_by_id(order.restaurant_id)
            .one(&state.orm)
            .await?;
        if owned.map(|r| r.owner_id) == Some(user.user_id) {
            return Ok(order);
        }
    }
    Err(AppError::NotFound)
}

pub async fn list_customer_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    list_orders(state, OrderCol::CustomerId.eq(user.user_id), query).await
}

pub async fn list_restaurant_orders(
    state: &AppState,
    restaurant_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    list_orders(state, OrderCol::RestaurantId.eq(restaurant_id), query).await
}

async fn list_orders(
    state: &AppState,
    scope: sea_orm::sea_query::SimpleExpr,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(scope);
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = OrderStatus::parse(status)
            .ok_or_else(|| AppError::Validation(format!("Unknown status '{status}'")))?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Seller-side advance. The target must be the immediate successor of the
/// current status; anything else is rejected and the record stays untouched.
/// Publishes an update on the order feed after commit.
pub async fn advance_status(
    state: &AppState,
    seller: &AuthUser,
    restaurant_id: Uuid,
    order_id: Uuid,
    target: OrderStatus,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let existing = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.restaurant_id != restaurant_id {
        return Err(AppError::Forbidden);
    }

    let current = parse_status(&existing.status)?;
    current
        .validate_advance(target)
        .map_err(AppError::InvalidTransition)?;

    let mut active: OrderActive = existing.into();
    active.status = Set(target.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    let order = order_from_entity(updated)?;
    state.order_feed.publish(OrderChange {
        kind: ChangeKind::Update,
        order: order.clone(),
    });

    if let Err(err) = log_audit(
        &state.pool,
        Some(seller.user_id),
        "order_status_advance",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status.as_str() }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Status updated",
        order,
        Some(Meta::empty()),
    ))
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    OrderStatus::parse(raw)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown order status '{raw}' in store")))
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        restaurant_id: model.restaurant_id,
        restaurant_name: model.restaurant_name,
        status: parse_status(&model.status)?,
        subtotal: model.subtotal,
        delivery_fee: model.delivery_fee,
        service_fee: model.service_fee,
        total: model.total,
        delivery_address: model.delivery_address,
        estimated_delivery: model.estimated_delivery,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        menu_item_id: model.menu_item_id,
        name: model.name,
        price: model.price,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
