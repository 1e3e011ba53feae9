use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::menu::{
        CreateMenuItemRequest, MenuItemList, SetAvailabilityRequest, UpdateMenuItemRequest,
    },
    entity::{
        menu_items::{ActiveModel as MenuItemActive, Column as MenuCol, Entity as MenuItems},
        restaurants::{Column as RestCol, Entity as Restaurants, Model as RestaurantModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::MenuItem,
    response::{ApiResponse, Meta},
    services::restaurant_service::menu_item_from_entity,
    state::AppState,
};

/// Resolve the restaurant the calling seller owns. Every dashboard operation
/// is scoped through this. A seller owns at most one restaurant, enforced by
/// the unique index on `restaurants.owner_id`.
pub async fn restaurant_for_owner(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<RestaurantModel> {
    ensure_seller(user)?;
    Restaurants::find()
        .filter(RestCol::OwnerId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

/// Seller view of the menu: unavailable items included.
pub async fn list_menu(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MenuItemList>> {
    let restaurant = restaurant_for_owner(state, user).await?;

    let items = MenuItems::find()
        .filter(MenuCol::RestaurantId.eq(restaurant.id))
        .order_by_asc(MenuCol::Category)
        .order_by_asc(MenuCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(menu_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        MenuItemList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let restaurant = restaurant_for_owner(state, user).await?;
    validate_name(&payload.name)?;
    validate_price(payload.price)?;

    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant.id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        category: Set(payload.category),
        is_veg: Set(payload.is_veg),
        is_spicy: Set(payload.is_spicy),
        available: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit_menu(state, user, "menu_item_create", item.id).await;

    Ok(ApiResponse::success(
        "Menu item created",
        menu_item_from_entity(item),
        None,
    ))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let restaurant = restaurant_for_owner(state, user).await?;
    let existing = find_owned_item(state, restaurant.id, item_id).await?;

    if let Some(name) = payload.name.as_ref() {
        validate_name(name)?;
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let mut active: MenuItemActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(is_veg) = payload.is_veg {
        active.is_veg = Set(is_veg);
    }
    if let Some(is_spicy) = payload.is_spicy {
        active.is_spicy = Set(is_spicy);
    }
    let item = active.update(&state.orm).await?;

    audit_menu(state, user, "menu_item_update", item.id).await;

    Ok(ApiResponse::success(
        "Menu item updated",
        menu_item_from_entity(item),
        None,
    ))
}

pub async fn set_availability(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: SetAvailabilityRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let restaurant = restaurant_for_owner(state, user).await?;
    let existing = find_owned_item(state, restaurant.id, item_id).await?;

    let mut active: MenuItemActive = existing.into();
    active.available = Set(payload.available);
    let item = active.update(&state.orm).await?;

    audit_menu(state, user, "menu_item_availability", item.id).await;

    Ok(ApiResponse::success(
        "Availability updated",
        menu_item_from_entity(item),
        None,
    ))
}

async fn find_owned_item(
    state: &AppState,
    restaurant_id: Uuid,
    item_id: Uuid,
) -> AppResult<crate::entity::menu_items::Model> {
    let item = MenuItems::find_by_id(item_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if item.restaurant_id != restaurant_id {
        return Err(AppError::Forbidden);
    }
    Ok(item)
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Item name must not be empty".into()));
    }
    Ok(())
}

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::Validation("Price must not be negative".into()));
    }
    Ok(())
}

async fn audit_menu(state: &AppState, user: &AuthUser, action: &str, item_id: Uuid) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        "menu_items",
        serde_json::json!({ "menu_item_id": item_id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
