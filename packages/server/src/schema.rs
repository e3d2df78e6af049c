use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::{ingredient, recipe_ingredient, recipe_tag, tag};

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite unique keys, so the
/// per-owner vocabulary constraints are created manually on startup.
/// `services::recipe` relies on them to detect concurrent get-or-create races.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_tag_user_name")
        .table(tag::Entity)
        .col(tag::Column::UserId)
        .col(tag::Column::Name)
        .to_string(PostgresQueryBuilder);
    db.execute_unprepared(&stmt).await?;
    info!("Ensured index idx_tag_user_name exists");

    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_ingredient_user_name")
        .table(ingredient::Entity)
        .col(ingredient::Column::UserId)
        .col(ingredient::Column::Name)
        .to_string(PostgresQueryBuilder);
    db.execute_unprepared(&stmt).await?;
    info!("Ensured index idx_ingredient_user_name exists");

    // Listing filters scan the link tables by vocabulary id.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_recipe_tag_tag")
        .table(recipe_tag::Entity)
        .col(recipe_tag::Column::TagId)
        .to_string(PostgresQueryBuilder);
    if let Err(e) = db.execute_unprepared(&stmt).await {
        tracing::warn!("Failed to create index idx_recipe_tag_tag: {}", e);
    }

    let stmt = Index::create()
        .if_not_exists()
        .name("idx_recipe_ingredient_ingredient")
        .table(recipe_ingredient::Entity)
        .col(recipe_ingredient::Column::IngredientId)
        .to_string(PostgresQueryBuilder);
    if let Err(e) = db.execute_unprepared(&stmt).await {
        tracing::warn!(
            "Failed to create index idx_recipe_ingredient_ingredient: {}",
            e
        );
    }

    Ok(())
}
