use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::{menu::MenuItemList, restaurants::RestaurantList},
    entity::{
        menu_items::{Column as MenuCol, Entity as MenuItems, Model as MenuItemModel},
        restaurants::{Column as RestCol, Entity as Restaurants, Model as RestaurantModel},
    },
    error::{AppError, AppResult},
    models::{MenuItem, Restaurant},
    response::{ApiResponse, Meta},
    routes::params::{MenuQuery, RestaurantQuery},
    state::AppState,
};

pub async fn list_restaurants(
    state: &AppState,
    query: RestaurantQuery,
) -> AppResult<ApiResponse<RestaurantList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(q) = query.q.as_ref().filter(|q| !q.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(RestCol::Name.contains(q))
                .add(RestCol::Cuisine.contains(q)),
        );
    }

    let finder = Restaurants::find()
        .filter(condition)
        .order_by_desc(RestCol::Rating);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(restaurant_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", RestaurantList { items }, Some(meta)))
}

pub async fn get_restaurant(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Restaurant>> {
    let restaurant = Restaurants::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "OK",
        restaurant_from_entity(restaurant),
        Some(Meta::empty()),
    ))
}

/// Customer-facing menu: only items currently marked available.
pub async fn list_menu(
    state: &AppState,
    restaurant_id: Uuid,
    query: MenuQuery,
) -> AppResult<ApiResponse<MenuItemList>> {
    Restaurants::find_by_id(restaurant_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut condition = Condition::all()
        .add(MenuCol::RestaurantId.eq(restaurant_id))
        .add(MenuCol::Available.eq(true));
    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(MenuCol::Category.eq(category.clone()));
    }

    let items = MenuItems::find()
        .filter(condition)
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

pub(crate) fn restaurant_from_entity(model: RestaurantModel) -> Restaurant {
    Restaurant {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        description: model.description,
        cuisine: model.cuisine,
        rating: model.rating,
        delivery_time: model.delivery_time,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn menu_item_from_entity(model: MenuItemModel) -> MenuItem {
    MenuItem {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        is_veg: model.is_veg,
        is_spicy: model.is_spicy,
        available: model.available,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
