use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "request_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub request_id: i64,
    pub item_id: i64,
    pub qty_requested: f64,
    #[sea_orm(belongs_to, from = "request_id", to = "id", on_delete = "Cascade")]
    pub request: HasOne<super::requests::Entity>,
    #[sea_orm(belongs_to, from = "item_id", to = "id", on_delete = "Cascade")]
    pub item: HasOne<super::items::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
