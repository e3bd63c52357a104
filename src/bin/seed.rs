use chrono::{Duration, Utc};
use pharmacy_store_api::{
    config::AppConfig,
    db::{OrmConn, create_pool, orm_from_pool, run_migrations},
    entity::{
        offer_products::ActiveModel as OfferProductActive,
        offers::{ActiveModel as OfferActive, Column as OfferCol, Entity as Offers},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        sea_orm_active_enums::{OfferStatus, UserRole},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    pricing,
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;
    let orm = orm_from_pool(pool);

    let admin_id = ensure_user(&orm, "Admin", "admin@example.com", "admin12345", UserRole::Admin).await?;
    let user_id = ensure_user(&orm, "Customer", "user@example.com", "user12345", UserRole::User).await?;
    let product_ids = seed_products(&orm).await?;
    seed_offer(&orm, &product_ids).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    name: &str,
    email: &str,
    password: &str,
    role: UserRole,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already exists");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        phone: Set(None),
        role: Set(role),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role={role:?})");
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<Vec<Uuid>> {
    let products = [
        ("Paracetamol 500mg", "Pain relief, 20 tablets", "Pain Relief", "4.50", "0", 120, false),
        ("Ibuprofen 200mg", "Anti-inflammatory, 24 tablets", "Pain Relief", "6.20", "10", 80, false),
        ("Amoxicillin 250mg", "Antibiotic capsules", "Antibiotics", "12.00", "0", 40, true),
        ("Vitamin C 1000mg", "Effervescent, 20 tablets", "Vitamins", "8.99", "5", 3, false),
        ("Digital Thermometer", "Fast read, flexible tip", "Devices", "15.00", "0", 25, false),
    ];

    let mut ids = Vec::with_capacity(products.len());
    for (name, description, category, price, discount, stock, requires_prescription) in products {
        if let Some(existing) = Products::find()
            .filter(ProdCol::Name.eq(name))
            .one(orm)
            .await?
        {
            ids.push(existing.id);
            continue;
        }

        let price: Decimal = price.parse()?;
        let discount: Decimal = discount.parse()?;
        let now = Utc::now();
        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            category: Set(category.to_string()),
            price: Set(price),
            discount: Set(discount),
            discount_price: Set(pricing::discount_price(price, discount)),
            stock: Set(stock),
            image_url: Set(None),
            requires_prescription: Set(requires_prescription),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
        ids.push(product.id);
    }

    println!("Seeded {} products", ids.len());
    Ok(ids)
}

async fn seed_offer(orm: &OrmConn, product_ids: &[Uuid]) -> anyhow::Result<()> {
    const TITLE: &str = "Winter wellness";
    if Offers::find()
        .filter(OfferCol::Title.eq(TITLE))
        .one(orm)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let now = Utc::now();
    let offer = OfferActive {
        id: Set(Uuid::new_v4()),
        title: Set(TITLE.to_string()),
        description: Set(Some("15% off vitamins and pain relief".to_string())),
        discount: Set(Decimal::new(15, 0)),
        start_date: Set(now.into()),
        end_date: Set((now + Duration::days(30)).into()),
        status: Set(OfferStatus::Active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    for product_id in product_ids.iter().take(2) {
        OfferProductActive {
            offer_id: Set(offer.id),
            product_id: Set(*product_id),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded offer {TITLE}");
    Ok(())
}
