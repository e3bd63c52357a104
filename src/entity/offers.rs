use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::OfferStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "offers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub discount: Decimal,
    pub start_date: DateTimeWithTimeZone,
    pub end_date: DateTimeWithTimeZone,
    pub status: OfferStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::offer_products::Entity")]
    OfferProducts,
}

impl Related<super::offer_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OfferProducts.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        super::offer_products::Relation::Products.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::offer_products::Relation::Offers.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
