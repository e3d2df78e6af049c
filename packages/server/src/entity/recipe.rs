use bigdecimal::BigDecimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub time_minutes: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub price: BigDecimal,
    pub link: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Set on insert, never reassigned.
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(has_many, via = "recipe_tag")]
    pub tags: HasMany<super::tag::Entity>,

    #[sea_orm(has_many, via = "recipe_ingredient")]
    pub ingredients: HasMany<super::ingredient::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
