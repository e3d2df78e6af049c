use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password: String,

    #[sea_orm(has_many)]
    pub recipes: HasMany<super::recipe::Entity>,

    #[sea_orm(has_many)]
    pub tags: HasMany<super::tag::Entity>,

    #[sea_orm(has_many)]
    pub ingredients: HasMany<super::ingredient::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
