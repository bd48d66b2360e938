use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub member_id: i64,
    /// `PENDING`, `APPROVED` or `REJECTED`.
    pub status: String,
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
    pub decided_at: Option<OffsetDateTime>,
    pub decided_by: Option<String>,
    #[sea_orm(belongs_to, from = "member_id", to = "id", on_delete = "Cascade")]
    pub member: HasOne<super::members::Entity>,
    #[sea_orm(has_many)]
    pub request_items: HasMany<super::request_items::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
