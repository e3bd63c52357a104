pub mod address_service;
pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod notification_service;
pub mod offer_service;
pub mod order_service;
pub mod prescription_service;
pub mod product_request_service;
pub mod product_service;
pub mod report_service;
