use sea_orm::entity::prelude::*;

/// Short-lived code proving control of an email address.
///
/// Holds either a numeric verification code or a signed reset token. Rows
/// older than the store TTL are never returned and are swept periodically.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "one_time_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub email: String,
    #[sea_orm(column_type = "Text")]
    pub code: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
