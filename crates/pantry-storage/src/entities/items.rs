use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub sku: Option<String>,
    #[sea_orm(unique_key = "item_name")]
    pub item_name: String,
    pub unit: String,
    pub qty_available: f64,
    pub is_active: bool,
    pub image_url: Option<String>,
    /// `YYYY-MM-DD`, free text as entered by the manager.
    pub expiry_date: Option<String>,
    pub created_at: OffsetDateTime,
    #[sea_orm(has_many)]
    pub stock_movements: HasMany<super::stock_movements::Entity>,
    #[sea_orm(has_many)]
    pub request_items: HasMany<super::request_items::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
