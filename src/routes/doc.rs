use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
        admin::{InventoryAdjustRequest, UserList},
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
        notifications::{MarkedRead, NotificationList, UnreadCount},
        offers::{CreateOfferRequest, OfferList, UpdateOfferRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems, PayOrderRequest, UpdateOrderStatusRequest},
        prescriptions::{PrescriptionList, ReviewPrescriptionRequest},
        product_requests::{EditProductRequest, NewProductRequest, ProductRequestList, UpdateRequestStatus},
        products::{CategoryList, CreateProductRequest, ProductList, UpdateProductRequest},
        reports::{
            DashboardSummary, MonthlySales, MonthlySalesReport, StatusBreakdown, StatusReport,
            TopProduct, TopProductsReport,
        },
    },
    entity::sea_orm_active_enums::{
        NotificationKind, OfferStatus, OrderStatus, PaymentMethod, PaymentStatus,
        PrescriptionStatus, RequestStatus, UserRole,
    },
    models::{Address, Notification, Offer, Order, OrderItem, Prescription, Product, ProductRequest, User},
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, auth, cart, health, notifications, offers, orders, params,
        prescriptions, product_requests, products, reports, upload::FileUpload,
    },
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
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_me,
        products::list_products,
        products::list_categories,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::upload_image,
        offers::list_offers,
        offers::list_active_offers,
        offers::get_offer,
        offers::create_offer,
        offers::update_offer,
        offers::delete_offer,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        addresses::list_addresses,
        addresses::get_address,
        addresses::create_address,
        addresses::update_address,
        addresses::set_default,
        addresses::delete_address,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        orders::pay_order,
        prescriptions::upload_prescription,
        prescriptions::list_mine,
        prescriptions::get_prescription,
        prescriptions::list_all,
        prescriptions::review_prescription,
        product_requests::create_request,
        product_requests::list_mine,
        product_requests::update_request,
        product_requests::cancel_request,
        product_requests::list_all,
        product_requests::update_status,
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_users,
        reports::summary,
        reports::monthly_sales,
        reports::orders_by_status,
        reports::top_products
    ),
    components(
        schemas(
            User,
            Product,
            Offer,
            Address,
            Order,
            OrderItem,
            Prescription,
            ProductRequest,
            Notification,
            UserRole,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            OfferStatus,
            PrescriptionStatus,
            RequestStatus,
            NotificationKind,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CategoryList,
            CreateOfferRequest,
            UpdateOfferRequest,
            OfferList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartView,
            CreateAddressRequest,
            UpdateAddressRequest,
            AddressList,
            CheckoutRequest,
            PayOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            InventoryAdjustRequest,
            UserList,
            ReviewPrescriptionRequest,
            PrescriptionList,
            NewProductRequest,
            EditProductRequest,
            UpdateRequestStatus,
            ProductRequestList,
            NotificationList,
            UnreadCount,
            MarkedRead,
            DashboardSummary,
            MonthlySales,
            MonthlySalesReport,
            StatusBreakdown,
            StatusReport,
            TopProduct,
            TopProductsReport,
            FileUpload,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = []),
        ("cookie_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Offers", description = "Time-bounded discounts"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Addresses", description = "Delivery addresses"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Prescriptions", description = "Prescription uploads"),
        (name = "Product requests", description = "Requests for products not in the catalog"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Reports", description = "Sales reports (admin)"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_resource_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/login",
            "/api/products/{id}/image",
            "/api/offers/active",
            "/api/cart/{product_id}",
            "/api/addresses/{id}/default",
            "/api/orders/{id}/cancel",
            "/api/prescriptions",
            "/api/product-requests/{id}/cancel",
            "/api/notifications/read-all",
            "/api/admin/orders/{id}/status",
            "/api/admin/reports/top-products",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
