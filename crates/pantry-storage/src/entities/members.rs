use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub created_at: OffsetDateTime,
    #[sea_orm(has_many)]
    pub requests: HasMany<super::requests::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
