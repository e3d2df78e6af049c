use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_ingredient")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub recipe_id: i32,
    #[sea_orm(primary_key)]
    pub ingredient_id: i32,
    #[sea_orm(belongs_to, from = "recipe_id", to = "id")]
    pub recipe: HasOne<super::recipe::Entity>,
    #[sea_orm(belongs_to, from = "ingredient_id", to = "id")]
    pub ingredient: HasOne<super::ingredient::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
