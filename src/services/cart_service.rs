use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
    error::{AppError, AppResult},
    events::CartChange,
    middleware::auth::AuthUser,
    models::{CartLine, Totals, item_count},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Load the shopper's lines in insertion order, joined against the menu so
/// prices always reflect the current menu record.
pub async fn load_lines(state: &AppState, user_id: Uuid) -> AppResult<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT ci.menu_item_id, mi.name, mi.price, ci.quantity, mi.is_veg
        FROM cart_items ci
        JOIN menu_items mi ON mi.id = ci.menu_item_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(lines)
}

fn build_view(state: &AppState, lines: Vec<CartLine>) -> CartView {
    let totals = Totals::compute(&lines, state.fees);
    CartView {
        item_count: item_count(&lines),
        totals,
        lines,
    }
}

fn broadcast(state: &AppState, user_id: Uuid, view: &CartView) {
    state.cart_feed.publish(
        user_id,
        CartChange {
            item_count: view.item_count,
            totals: view.totals,
        },
    );
}

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let lines = load_lines(state, user.user_id).await?;
    let view = build_view(state, lines);
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

/// Add one unit of a menu item. An existing line is bumped by one; there is
/// never more than one line per menu item id.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let item: Option<(Uuid, bool)> =
        sqlx::query_as("SELECT restaurant_id, available FROM menu_items WHERE id = $1")
            .bind(payload.menu_item_id)
            .fetch_optional(&state.pool)
            .await?;
    let (restaurant_id, available) = match item {
        Some(row) => row,
        None => return Err(AppError::Validation("Menu item not found".into())),
    };
    if !available {
        return Err(AppError::Validation(
            "Menu item is currently unavailable".into(),
        ));
    }

    // One restaurant per cart: reject mixing before touching any rows.
    let cart_restaurant: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT mi.restaurant_id
        FROM cart_items ci
        JOIN menu_items mi ON mi.id = ci.menu_item_id
        WHERE ci.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;
    if let Some((existing,)) = cart_restaurant {
        if existing != restaurant_id {
            return Err(AppError::Validation(
                "Cart already holds items from another restaurant".into(),
            ));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO cart_items (id, user_id, menu_item_id, quantity)
        VALUES ($1, $2, $3, 1)
        ON CONFLICT (user_id, menu_item_id)
        DO UPDATE SET quantity = cart_items.quantity + 1
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.menu_item_id)
    .execute(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "menu_item_id": payload.menu_item_id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let view = build_view(state, load_lines(state, user.user_id).await?);
    broadcast(state, user.user_id, &view);
    Ok(ApiResponse::success("Added to cart", view, None))
}

/// Replace a line's quantity. Removal must go through `remove_item`, so
/// anything below one is rejected up front and the cart is left untouched.
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    menu_item_id: Uuid,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity < 1 {
        return Err(AppError::Validation(
            "Quantity must be at least 1; use remove instead".into(),
        ));
    }

    let result =
        sqlx::query("UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND menu_item_id = $2")
            .bind(user.user_id)
            .bind(menu_item_id)
            .bind(payload.quantity)
            .execute(&state.pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_update_quantity",
        "cart_items",
        serde_json::json!({ "menu_item_id": menu_item_id, "quantity": payload.quantity }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let view = build_view(state, load_lines(state, user.user_id).await?);
    broadcast(state, user.user_id, &view);
    Ok(ApiResponse::success("Quantity updated", view, None))
}

/// Delete a line if present. A missing id is a no-op, not an error, and
/// no change is broadcast for it.
pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    menu_item_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND menu_item_id = $2")
        .bind(user.user_id)
        .bind(menu_item_id)
        .execute(&state.pool)
        .await?;

    let view = build_view(state, load_lines(state, user.user_id).await?);
    if result.rows_affected() > 0 {
        if let Err(err) = log_audit(
            &state.pool,
            Some(user.user_id),
            "cart_remove",
            "cart_items",
            serde_json::json!({ "menu_item_id": menu_item_id }),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }
        broadcast(state, user.user_id, &view);
    }
    Ok(ApiResponse::success(
        "Removed from cart",
        view,
        Some(Meta::empty()),
    ))
}

/// Empty the cart. Checkout is the one caller on the happy path.
pub async fn clear(state: &AppState, user: &AuthUser) -> AppResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    let view = build_view(state, Vec::new());
    broadcast(state, user.user_id, &view);
    Ok(())
}
