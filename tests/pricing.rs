mod common;

use chrono::{Duration, Utc};
use common::dec;
use pharmacy_store_api::{
    entity::sea_orm_active_enums::OfferStatus,
    models::Product,
    pricing::{self, ActiveOffer},
};
use uuid::Uuid;

fn product(price: &str, discount: &str) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: "Paracetamol 500mg".into(),
        description: None,
        category: "pain relief".into(),
        price: dec(price),
        discount: dec(discount),
        discount_price: pricing::discount_price(dec(price), dec(discount)),
        stock: 10,
        image_url: None,
        requires_prescription: false,
        offer_id: None,
        created_at: now,
        updated_at: now,
    }
}

fn offer(discount: &str, products: &[Uuid]) -> ActiveOffer {
    ActiveOffer {
        offer_id: Uuid::new_v4(),
        discount: dec(discount),
        product_ids: products.to_vec(),
    }
}

#[test]
fn uncovered_products_keep_their_own_discount() {
    let item = product("20.00", "10");
    let offers = vec![offer("50", &[Uuid::new_v4()])];

    let resolved = pricing::resolve_offer_price(item.clone(), &offers);
    assert_eq!(resolved.discount_price, dec("18.00"));
    assert_eq!(resolved.offer_id, None);
}

#[test]
fn first_matching_offer_wins() {
    let item = product("40.00", "0");
    let older = offer("25", &[item.id]);
    let newer = offer("50", &[item.id]);

    let resolved = pricing::resolve_offer_price(item, &[older.clone(), newer]);
    assert_eq!(resolved.offer_id, Some(older.offer_id));
    assert_eq!(resolved.discount, dec("25.00"));
    assert_eq!(resolved.discount_price, dec("30.00"));
}

#[test]
fn offer_replaces_the_product_discount() {
    let item = product("12.99", "5");
    let promo = offer("12.5", &[item.id]);

    let resolved = pricing::resolve_offer_price(item, &[promo]);
    // 12.99 * 0.875 = 11.36625
    assert_eq!(resolved.discount_price, dec("11.37"));
}

#[test]
fn resolving_a_list_touches_only_covered_items() {
    let covered = product("10.00", "0");
    let plain = product("10.00", "0");
    let promo = offer("10", &[covered.id]);

    let resolved = pricing::resolve_offer_prices(vec![covered, plain], &[promo]);
    assert_eq!(resolved[0].discount_price, dec("9.00"));
    assert_eq!(resolved[1].discount_price, dec("10.00"));
}

#[test]
fn offer_window_is_inclusive_and_status_gated() {
    let now = Utc::now();
    let start = now - Duration::days(1);
    let end = now + Duration::days(1);

    assert!(pricing::offer_is_live(OfferStatus::Active, start, end, now));
    assert!(pricing::offer_is_live(OfferStatus::Active, now, now, now));
    assert!(!pricing::offer_is_live(OfferStatus::Inactive, start, end, now));
    assert!(!pricing::offer_is_live(OfferStatus::Active, end, end + Duration::days(1), now));
}
