use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::entity::sea_orm_active_enums::{
    OfferStatus, OrderStatus, PrescriptionStatus, RequestStatus,
};

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    /// Returns `(page, per_page, offset)` with page ≥ 1 and per_page in 1..=100.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

// Query structs repeat `page`/`per_page` instead of flattening `Pagination`:
// flattened fields reach serde_urlencoded as strings and fail to parse as numbers.
macro_rules! paged_query {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Debug, Default, Deserialize, ToSchema)]
        pub struct $name {
            pub page: Option<i64>,
            pub per_page: Option<i64>,
            $(pub $field: $ty,)*
        }

        impl $name {
            pub fn pagination(&self) -> Pagination {
                Pagination {
                    page: self.page,
                    per_page: self.per_page,
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
    Stock,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub category: Option<String>,
    #[schema(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

paged_query!(OrderListQuery {
    status: Option<OrderStatus>,
    sort_order: Option<SortOrder>,
});

paged_query!(OfferListQuery {
    status: Option<OfferStatus>,
});

paged_query!(PrescriptionListQuery {
    status: Option<PrescriptionStatus>,
});

paged_query!(ProductRequestListQuery {
    status: Option<RequestStatus>,
});

paged_query!(NotificationQuery {
    unread_only: Option<bool>,
});

paged_query!(LowStockQuery {
    threshold: Option<i32>,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_page_and_size() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        assert_eq!(Pagination::new(0, 500).normalize(), (1, 100, 0));
        assert_eq!(Pagination::new(3, 10).normalize(), (3, 10, 20));
        assert_eq!(Pagination::new(-4, 0).normalize(), (1, 1, 0));
    }

    #[test]
    fn paged_query_exposes_its_pagination() {
        let query = OrderListQuery {
            page: Some(2),
            per_page: Some(5),
            status: Some(OrderStatus::Shipped),
            sort_order: None,
        };
        assert_eq!(query.pagination().normalize(), (2, 5, 5));
    }
}
