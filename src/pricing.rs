//! Money arithmetic for the catalog: discount prices, offer resolution and
//! line totals. Everything here is pure so it can be shared by the product,
//! cart and checkout services.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    entity::sea_orm_active_enums::OfferStatus,
    error::{AppError, AppResult},
    models::Product,
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds half away from zero to two decimal places.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `price − price·discount/100`, rounded to cents.
pub fn discount_price(price: Decimal, discount: Decimal) -> Decimal {
    round2(price - price * discount / HUNDRED)
}

pub fn validate_discount(discount: Decimal) -> AppResult<()> {
    if discount < Decimal::ZERO || discount > HUNDRED {
        return Err(AppError::BadRequest(
            "discount must be between 0 and 100".into(),
        ));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> AppResult<()> {
    if price < Decimal::ZERO {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    Ok(())
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round2(unit_price * Decimal::from(quantity))
}

/// An offer as seen by price resolution: its discount and the products it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveOffer {
    pub offer_id: Uuid,
    pub discount: Decimal,
    pub product_ids: Vec<Uuid>,
}

pub fn offer_is_live(
    status: OfferStatus,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    status == OfferStatus::Active && start <= now && now <= end
}

/// Applies the first offer in `offers` that lists the product.
///
/// `offers` must already be filtered to live offers and ordered; the first
/// match wins. Products not covered by any offer are returned as-is.
pub fn resolve_offer_price(product: Product, offers: &[ActiveOffer]) -> Product {
    let Some(offer) = offers
        .iter()
        .find(|offer| offer.product_ids.contains(&product.id))
    else {
        return product;
    };

    let discount = round2(offer.discount);
    Product {
        discount,
        discount_price: discount_price(product.price, discount),
        offer_id: Some(offer.offer_id),
        ..product
    }
}

pub fn resolve_offer_prices(products: Vec<Product>, offers: &[ActiveOffer]) -> Vec<Product> {
    if offers.is_empty() {
        return products;
    }
    products
        .into_iter()
        .map(|product| resolve_offer_price(product, offers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    #[test]
    fn discount_price_rounds_half_away_from_zero() {
        assert_eq!(discount_price(dec("100.00"), dec("10")), dec("90.00"));
        // 19.99 * 0.875 = 17.49125
        assert_eq!(discount_price(dec("19.99"), dec("12.5")), dec("17.49"));
        // 0.05 * 0.5 = 0.025 -> 0.03
        assert_eq!(discount_price(dec("0.05"), dec("50")), dec("0.03"));
        assert_eq!(discount_price(dec("42.00"), dec("0")), dec("42.00"));
        assert_eq!(discount_price(dec("42.00"), dec("100")), dec("0.00"));
    }

    #[test]
    fn discount_bounds_are_inclusive() {
        assert!(validate_discount(dec("0")).is_ok());
        assert!(validate_discount(dec("100")).is_ok());
        assert!(validate_discount(dec("-0.01")).is_err());
        assert!(validate_discount(dec("100.01")).is_err());
    }

    #[test]
    fn line_total_multiplies_and_rounds() {
        assert_eq!(line_total(dec("17.49"), 3), dec("52.47"));
        assert_eq!(line_total(dec("0.00"), 7), dec("0.00"));
    }
}
