use pharmacy_store_api::{
    entity::sea_orm_active_enums::{OrderStatus, RequestStatus},
    error::AppError,
    services::{order_service, product_request_service},
};

const ALL_ORDER_STATUSES: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

#[test]
fn only_pending_orders_can_be_cancelled_by_customers() {
    for status in ALL_ORDER_STATUSES {
        assert_eq!(status.customer_can_cancel(), status == OrderStatus::Pending);
    }
}

#[test]
fn delivered_and_cancelled_are_final_for_admins() {
    for from in ALL_ORDER_STATUSES {
        for to in ALL_ORDER_STATUSES {
            let allowed = order_service::ensure_admin_transition(from, to).is_ok();
            let expected = !from.is_terminal() || from == to;
            assert_eq!(allowed, expected, "{} -> {}", from.as_str(), to.as_str());
        }
    }
}

#[test]
fn rejected_transition_is_a_bad_request() {
    let err = order_service::ensure_admin_transition(OrderStatus::Delivered, OrderStatus::Shipped)
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("delivered")));
}

#[test]
fn request_status_wire_names() {
    assert_eq!(
        serde_json::to_value(RequestStatus::NotAvailable).unwrap(),
        serde_json::json!("not_available")
    );
    let parsed: RequestStatus = serde_json::from_str("\"available\"").unwrap();
    assert_eq!(parsed, RequestStatus::Available);
    assert!(serde_json::from_str::<RequestStatus>("\"unknown\"").is_err());
}

#[test]
fn cancelled_requests_stay_cancelled() {
    assert!(product_request_service::ensure_open(RequestStatus::Pending).is_ok());
    assert!(product_request_service::ensure_open(RequestStatus::Cancelled).is_err());
}
