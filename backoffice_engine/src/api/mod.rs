pub mod auth_api;
pub mod cart_api;
pub mod errors;
pub mod order_flow_api;
pub mod staff_api;
