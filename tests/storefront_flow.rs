use savora_api::{
    db::{create_orm_conn, create_pool},
    dto::{
        auth::RegisterRequest,
        cart::{AddToCartRequest, UpdateQuantityRequest},
        orders::CheckoutRequest,
    },
    entity::{
        menu_items::ActiveModel as MenuItemActive, restaurants::ActiveModel as RestaurantActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{FeeSchedule, OrderStatus},
    routes::orders,
    routes::params::{ChangesQuery, MenuQuery, OrderListQuery, Pagination},
    services::{auth_service, cart_service, menu_service, order_service, restaurant_service},
    state::AppState,
};
use axum::extract::{Path, Query, State};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

const FEES: FeeSchedule = FeeSchedule {
    delivery_fee: 299,
    service_fee: 150,
};

// Full storefront pass: cart aggregation rules, checkout, then the
// seller advancing the order while a subscriber watches the feed.
#[tokio::test]
async fn cart_checkout_and_status_tracking_flow() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let fixtures = seed_fixtures(&state).await?;
    let customer = AuthUser {
        user_id: fixtures.customer_id,
        role: "customer".into(),
    };
    let seller = AuthUser {
        user_id: fixtures.seller_id,
        role: "seller".into(),
    };

    // Registration guards: mismatched confirmation, then a taken email.
    let err = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            email: "pat@example.com".into(),
            password: "secret123".into(),
            confirm_password: "secret124".into(),
            role: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    auth_service::register_user(
        &state.pool,
        RegisterRequest {
            email: "pat@example.com".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
            role: None,
        },
    )
    .await?;
    let err = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            email: "pat@example.com".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
            role: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The customer menu hides unavailable items; the seller menu keeps them.
    let menu = restaurant_service::list_menu(
        &state,
        fixtures.restaurant_id,
        MenuQuery { category: None },
    )
    .await?
    .data
    .unwrap();
    assert!(menu.items.iter().any(|i| i.id == fixtures.burger_id));
    assert!(menu.items.iter().all(|i| i.id != fixtures.shake_id));
    let seller_menu = menu_service::list_menu(&state, &seller).await?.data.unwrap();
    assert!(seller_menu.items.iter().any(|i| i.id == fixtures.shake_id));

    // Unavailable items cannot go into the cart either.
    let err = cart_service::add_item(
        &state,
        &customer,
        AddToCartRequest {
            menu_item_id: fixtures.shake_id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Adding the same item twice yields one line with quantity 2.
    cart_service::add_item(
        &state,
        &customer,
        AddToCartRequest {
            menu_item_id: fixtures.burger_id,
        },
    )
    .await?;
    let view = cart_service::add_item(
        &state,
        &customer,
        AddToCartRequest {
            menu_item_id: fixtures.burger_id,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 2);
    assert_eq!(view.item_count, 2);

    // Items from a second restaurant are rejected.
    let err = cart_service::add_item(
        &state,
        &customer,
        AddToCartRequest {
            menu_item_id: fixtures.pizza_id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Quantity below one is rejected and leaves the cart untouched.
    let err = cart_service::update_quantity(
        &state,
        &customer,
        fixtures.burger_id,
        UpdateQuantityRequest { quantity: 0 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let view = cart_service::view_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(view.lines[0].quantity, 2);

    // Removing an id that is not in the cart is a quiet no-op.
    let view = cart_service::remove_item(&state, &customer, Uuid::new_v4())
        .await?
        .data
        .unwrap();
    assert_eq!(view.item_count, 2);

    // A cart subscriber sees the aggregate after the next mutation.
    let mut cart_rx = state.cart_feed.subscribe(customer.user_id);
    let view = cart_service::add_item(
        &state,
        &customer,
        AddToCartRequest {
            menu_item_id: fixtures.salad_id,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(view.lines.len(), 2);
    assert_eq!(view.item_count, 3);
    assert_eq!(view.totals.subtotal, 2 * 999 + 499);
    let change = cart_rx.try_recv()?;
    assert_eq!(change.item_count, 3);
    assert_eq!(change.totals.subtotal, view.totals.subtotal);

    // Checkout turns the cart into a placed order and empties the cart.
    let placed = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            delivery_address: "12 Main St".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(placed.order.status, OrderStatus::Placed);
    assert_eq!(placed.order.subtotal, 2497);
    assert_eq!(placed.order.total, 2497 + FEES.delivery_fee + FEES.service_fee);
    assert_eq!(placed.items.len(), 2);
    assert_eq!(placed.order.restaurant_name, "Spice Garden");

    let empty = cart_service::view_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(empty.item_count, 0);
    assert_eq!(empty.totals.subtotal, 0);
    assert_eq!(empty.totals.total, FEES.delivery_fee + FEES.service_fee);

    // Checkout with an empty cart fails.
    let err = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            delivery_address: "12 Main St".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Neither can an order be created without items.
    let err = order_service::create_order(
        &state,
        fixtures.customer_id,
        fixtures.restaurant_id,
        Vec::new(),
        "12 Main St".into(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let order_id = placed.order.id;

    // A seller who owns a different restaurant cannot touch the order.
    let intruder = AuthUser {
        user_id: fixtures.other_seller_id,
        role: "seller".into(),
    };
    let err = order_service::advance_status(
        &state,
        &intruder,
        fixtures.other_restaurant_id,
        order_id,
        OrderStatus::Confirmed,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // A subscriber registered before two advances receives both, in order.
    let mut order_rx = state.order_feed.subscribe(order_id);
    order_service::advance_status(
        &state,
        &seller,
        fixtures.restaurant_id,
        order_id,
        OrderStatus::Confirmed,
    )
    .await?;
    order_service::advance_status(
        &state,
        &seller,
        fixtures.restaurant_id,
        order_id,
        OrderStatus::Preparing,
    )
    .await?;
    assert_eq!(order_rx.try_recv()?.order.status, OrderStatus::Confirmed);
    assert_eq!(order_rx.try_recv()?.order.status, OrderStatus::Preparing);

    // Repeating the current status and skipping ahead are both rejected.
    let err = order_service::advance_status(
        &state,
        &seller,
        fixtures.restaurant_id,
        order_id,
        OrderStatus::Preparing,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    let err = order_service::advance_status(
        &state,
        &seller,
        fixtures.restaurant_id,
        order_id,
        OrderStatus::Delivered,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    // Walk to the terminal state; nothing moves out of delivered.
    order_service::advance_status(
        &state,
        &seller,
        fixtures.restaurant_id,
        order_id,
        OrderStatus::OutForDelivery,
    )
    .await?;
    order_service::advance_status(
        &state,
        &seller,
        fixtures.restaurant_id,
        order_id,
        OrderStatus::Delivered,
    )
    .await?;
    for target in OrderStatus::ALL {
        let err = order_service::advance_status(
            &state,
            &seller,
            fixtures.restaurant_id,
            order_id,
            target,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    let current = order_service::fetch_order(&state, order_id).await?;
    assert_eq!(current.status, OrderStatus::Delivered);

    // A quiet long-poll window hands back the current persisted record.
    let poll = orders::order_changes(
        State(state.clone()),
        customer.clone(),
        Path(order_id),
        Query(ChangesQuery { wait: Some(1) }),
    )
    .await?
    .0
    .data
    .unwrap();
    assert!(!poll.changed);
    assert_eq!(poll.order.status, OrderStatus::Delivered);

    // Both listing sides see the order; a stranger does not.
    let mine = order_service::list_customer_orders(&state, &customer, list_query())
        .await?
        .data
        .unwrap();
    assert!(mine.items.iter().any(|o| o.id == order_id));
    let theirs = order_service::list_restaurant_orders(&state, fixtures.restaurant_id, list_query())
        .await?
        .data
        .unwrap();
    assert!(theirs.items.iter().any(|o| o.id == order_id));

    let stranger = AuthUser {
        user_id: Uuid::new_v4(),
        role: "customer".into(),
    };
    let err = order_service::get_customer_order(&state, &stranger, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

fn list_query() -> OrderListQuery {
    OrderListQuery {
        pagination: Pagination {
            page: Some(1),
            per_page: Some(20),
        },
        status: None,
    }
}

struct Fixtures {
    customer_id: Uuid,
    seller_id: Uuid,
    restaurant_id: Uuid,
    other_seller_id: Uuid,
    other_restaurant_id: Uuid,
    burger_id: Uuid,
    salad_id: Uuid,
    shake_id: Uuid,
    pizza_id: Uuid,
}

// Skips (returns None) when no database is configured in the environment.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, menu_items, restaurants, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState::new(pool, orm, FEES)))
}

async fn seed_fixtures(state: &AppState) -> anyhow::Result<Fixtures> {
    let customer_id = create_user(state, "customer", "customer@example.com").await?;
    let seller_id = create_user(state, "seller", "seller@example.com").await?;
    let other_seller_id = create_user(state, "seller", "other-seller@example.com").await?;

    let restaurant_id = create_restaurant(state, seller_id, "Spice Garden").await?;
    let other_restaurant_id = create_restaurant(state, other_seller_id, "Pizza Paradise").await?;

    let burger_id =
        create_menu_item(state, restaurant_id, "Classic Cheeseburger", 999, true).await?;
    let salad_id = create_menu_item(state, restaurant_id, "Garden Salad", 499, true).await?;
    let shake_id =
        create_menu_item(state, restaurant_id, "Chocolate Milkshake", 499, false).await?;
    let pizza_id = create_menu_item(state, other_restaurant_id, "Margherita", 1199, true).await?;

    Ok(Fixtures {
        customer_id,
        seller_id,
        restaurant_id,
        other_seller_id,
        other_restaurant_id,
        burger_id,
        salad_id,
        shake_id,
        pizza_id,
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_restaurant(state: &AppState, owner_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        name: Set(name.to_string()),
        description: Set(None),
        cuisine: Set("Test".into()),
        rating: Set(4.5),
        delivery_time: Set("25-30 min".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(restaurant.id)
}

async fn create_menu_item(
    state: &AppState,
    restaurant_id: Uuid,
    name: &str,
    price: i64,
    available: bool,
) -> anyhow::Result<Uuid> {
    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(price),
        category: Set("mains".into()),
        is_veg: Set(false),
        is_spicy: Set(false),
        available: Set(available),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(item.id)
}
