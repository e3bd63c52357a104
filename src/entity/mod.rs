pub mod addresses;
pub mod audit_logs;
pub mod cart_items;
pub mod notifications;
pub mod offer_products;
pub mod offers;
pub mod order_items;
pub mod orders;
pub mod prescriptions;
pub mod product_requests;
pub mod products;
pub mod sea_orm_active_enums;
pub mod users;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use notifications::Entity as Notifications;
pub use offer_products::Entity as OfferProducts;
pub use offers::Entity as Offers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use prescriptions::Entity as Prescriptions;
pub use product_requests::Entity as ProductRequests;
pub use products::Entity as Products;
pub use users::Entity as Users;
