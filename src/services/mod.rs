pub mod auth_service;
pub mod cart_service;
pub mod menu_service;
pub mod order_service;
pub mod restaurant_service;
