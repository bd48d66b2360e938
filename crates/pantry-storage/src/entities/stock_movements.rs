use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub item_id: i64,
    /// `IN` or `OUT`.
    pub movement_type: String,
    pub qty: f64,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: OffsetDateTime,
    #[sea_orm(belongs_to, from = "item_id", to = "id", on_delete = "Cascade")]
    pub item: HasOne<super::items::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
