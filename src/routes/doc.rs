use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, UserProfile},
        cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
        menu::{
            CreateMenuItemRequest, MenuItemList, SetAvailabilityRequest, UpdateMenuItemRequest,
        },
        orders::{
            AdvanceStatusRequest, CheckoutRequest, OrderChangePoll, OrderList, OrderWithItems,
        },
        restaurants::RestaurantList,
    },
    events::{CartChange, ChangeKind, OrderChange},
    models::{CartLine, MenuItem, Order, OrderItem, OrderStatus, Restaurant, Totals},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, orders, params, restaurants, seller},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        restaurants::list_restaurants,
        restaurants::get_restaurant,
        restaurants::list_menu,
        cart::view_cart,
        cart::add_item,
        cart::update_quantity,
        cart::remove_item,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::order_changes,
        seller::list_orders,
        seller::advance_status,
        seller::list_menu,
        seller::create_menu_item,
        seller::update_menu_item,
        seller::set_availability
    ),
    components(
        schemas(
            Restaurant,
            MenuItem,
            CartLine,
            Order,
            OrderItem,
            OrderStatus,
            Totals,
            ChangeKind,
            OrderChange,
            CartChange,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserProfile,
            AddToCartRequest,
            UpdateQuantityRequest,
            CartView,
            CheckoutRequest,
            AdvanceStatusRequest,
            OrderWithItems,
            OrderList,
            OrderChangePoll,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            SetAvailabilityRequest,
            MenuItemList,
            RestaurantList,
            params::Pagination,
            params::RestaurantQuery,
            params::MenuQuery,
            params::OrderListQuery,
            params::ChangesQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<CartView>,
            ApiResponse<RestaurantList>,
            ApiResponse<MenuItemList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Restaurants", description = "Restaurant browsing endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Customer order endpoints"),
        (name = "Seller", description = "Seller dashboard endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
