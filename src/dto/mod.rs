pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod notifications;
pub mod offers;
pub mod orders;
pub mod prescriptions;
pub mod product_requests;
pub mod products;
pub mod reports;
