//! Recipe persistence and nested tag/ingredient reconciliation.
//!
//! Callers run every operation on an open transaction so that a failure while
//! reconciling vocabulary leaves nothing behind.

use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::{LockType, OnConflict, Query};
use sea_orm::*;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::entity::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use crate::models::recipe::{
    CreateRecipeRequest, RecipeRecord, UpdateRecipeRequest, VocabularyRef,
    normalize_optional_text, validate_create_recipe, validate_update_recipe,
};
use crate::models::shared::ValidationError;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A concurrent request created the same vocabulary entry and it is not visible yet.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Filters applied when listing a user's recipes.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

pub struct RecipeService<'a, C: ConnectionTrait + TransactionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> RecipeService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Create a recipe owned by `owner`, then attach its tags and ingredients.
    #[instrument(skip(self, payload), fields(title = %payload.title))]
    pub async fn create_recipe(
        &self,
        owner: i32,
        payload: CreateRecipeRequest,
    ) -> Result<recipe::Model, RecipeError> {
        validate_create_recipe(&payload)?;

        let CreateRecipeRequest {
            title,
            time_minutes,
            price,
            link,
            description,
            tags,
            ingredients,
        } = payload;

        let now = chrono::Utc::now();
        let model = recipe::ActiveModel {
            title: Set(title.trim().to_string()),
            time_minutes: Set(time_minutes),
            price: Set(price),
            link: Set(normalize_optional_text(link)),
            description: Set(normalize_optional_text(description)),
            user_id: Set(owner),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        self.reconcile_tags(owner, &tags, &model).await?;
        self.reconcile_ingredients(owner, &ingredients, &model).await?;

        Ok(model)
    }

    /// Apply `payload` to an existing recipe the caller owns.
    ///
    /// A present `tags`/`ingredients` list replaces the current associations;
    /// an absent one leaves them untouched. The owner is never reassigned.
    #[instrument(skip(self, existing, payload), fields(recipe_id = existing.id))]
    pub async fn update_recipe(
        &self,
        owner: i32,
        existing: recipe::Model,
        payload: UpdateRecipeRequest,
    ) -> Result<recipe::Model, RecipeError> {
        validate_update_recipe(&payload)?;

        let UpdateRecipeRequest {
            title,
            time_minutes,
            price,
            link,
            description,
            tags,
            ingredients,
        } = payload;

        let mut active: recipe::ActiveModel = existing.into();
        if let Some(title) = title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(time_minutes) = time_minutes {
            active.time_minutes = Set(time_minutes);
        }
        if let Some(price) = price {
            active.price = Set(price);
        }
        if let Some(link) = link {
            active.link = Set(normalize_optional_text(link));
        }
        if let Some(description) = description {
            active.description = Set(normalize_optional_text(description));
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.conn).await?;

        if let Some(tags) = tags {
            recipe_tag::Entity::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(model.id))
                .exec(self.conn)
                .await?;
            self.reconcile_tags(owner, &tags, &model).await?;
        }
        if let Some(ingredients) = ingredients {
            recipe_ingredient::Entity::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(model.id))
                .exec(self.conn)
                .await?;
            self.reconcile_ingredients(owner, &ingredients, &model).await?;
        }

        Ok(model)
    }

    /// Get-or-create each named tag for `owner` and link it to `recipe`.
    pub async fn reconcile_tags(
        &self,
        owner: i32,
        specs: &[VocabularyRef],
        recipe: &recipe::Model,
    ) -> Result<(), RecipeError> {
        for name in distinct_names(specs) {
            let tag = self.ensure_tag(owner, &name).await?;
            let link = recipe_tag::ActiveModel {
                recipe_id: Set(recipe.id),
                tag_id: Set(tag.id),
            };
            let result = recipe_tag::Entity::insert(link)
                .on_conflict(
                    OnConflict::columns([recipe_tag::Column::RecipeId, recipe_tag::Column::TagId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(self.conn)
                .await;
            match result {
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Get-or-create each named ingredient for `owner` and link it to `recipe`.
    pub async fn reconcile_ingredients(
        &self,
        owner: i32,
        specs: &[VocabularyRef],
        recipe: &recipe::Model,
    ) -> Result<(), RecipeError> {
        for name in distinct_names(specs) {
            let ingredient = self.ensure_ingredient(owner, &name).await?;
            let link = recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe.id),
                ingredient_id: Set(ingredient.id),
            };
            let result = recipe_ingredient::Entity::insert(link)
                .on_conflict(
                    OnConflict::columns([
                        recipe_ingredient::Column::RecipeId,
                        recipe_ingredient::Column::IngredientId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(self.conn)
                .await;
            match result {
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Return the tag named `name` for `owner`, creating it if needed.
    ///
    /// The insert runs inside a savepoint: when a concurrent request wins the
    /// race the unique index rejects ours, the savepoint is rolled back and the
    /// winner's row is looked up instead.
    pub async fn ensure_tag(&self, owner: i32, name: &str) -> Result<tag::Model, RecipeError> {
        if let Some(existing) = self.find_tag(owner, name).await? {
            return Ok(existing);
        }

        let savepoint = self.conn.begin().await?;
        let inserted = tag::ActiveModel {
            name: Set(name.to_string()),
            user_id: Set(owner),
            ..Default::default()
        }
        .insert(&savepoint)
        .await;

        match inserted {
            Ok(model) => {
                savepoint.commit().await?;
                Ok(model)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                savepoint.rollback().await?;
                debug!(owner, name, "Tag created concurrently, looking it up again");
                self.find_tag(owner, name).await?.ok_or_else(|| {
                    RecipeError::Conflict(format!("Tag '{name}' was created concurrently"))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Return the ingredient named `name` for `owner`, creating it if needed.
    pub async fn ensure_ingredient(
        &self,
        owner: i32,
        name: &str,
    ) -> Result<ingredient::Model, RecipeError> {
        if let Some(existing) = self.find_ingredient(owner, name).await? {
            return Ok(existing);
        }

        let savepoint = self.conn.begin().await?;
        let inserted = ingredient::ActiveModel {
            name: Set(name.to_string()),
            user_id: Set(owner),
            ..Default::default()
        }
        .insert(&savepoint)
        .await;

        match inserted {
            Ok(model) => {
                savepoint.commit().await?;
                Ok(model)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                savepoint.rollback().await?;
                debug!(owner, name, "Ingredient created concurrently, looking it up again");
                self.find_ingredient(owner, name).await?.ok_or_else(|| {
                    RecipeError::Conflict(format!("Ingredient '{name}' was created concurrently"))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_tag(&self, owner: i32, name: &str) -> Result<Option<tag::Model>, DbErr> {
        tag::Entity::find()
            .filter(tag::Column::UserId.eq(owner))
            .filter(tag::Column::Name.eq(name))
            .one(self.conn)
            .await
    }

    async fn find_ingredient(
        &self,
        owner: i32,
        name: &str,
    ) -> Result<Option<ingredient::Model>, DbErr> {
        ingredient::Entity::find()
            .filter(ingredient::Column::UserId.eq(owner))
            .filter(ingredient::Column::Name.eq(name))
            .one(self.conn)
            .await
    }

    /// Look up a recipe owned by `owner`. Other users' recipes are reported as missing.
    pub async fn find_owned(
        &self,
        owner: i32,
        id: i32,
    ) -> Result<Option<recipe::Model>, DbErr> {
        recipe::Entity::find_by_id(id)
            .filter(recipe::Column::UserId.eq(owner))
            .one(self.conn)
            .await
    }

    /// Same as [`Self::find_owned`], taking a row lock for the rest of the transaction.
    pub async fn find_owned_for_update(
        &self,
        owner: i32,
        id: i32,
    ) -> Result<Option<recipe::Model>, DbErr> {
        recipe::Entity::find_by_id(id)
            .filter(recipe::Column::UserId.eq(owner))
            .lock(LockType::Update)
            .one(self.conn)
            .await
    }

    /// Delete a recipe and its tag/ingredient links. The vocabulary itself is kept.
    pub async fn delete(&self, recipe_id: i32) -> Result<(), DbErr> {
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(self.conn)
            .await?;
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(self.conn)
            .await?;
        recipe::Entity::delete_by_id(recipe_id)
            .exec(self.conn)
            .await?;
        Ok(())
    }

    /// List `owner`'s recipes, newest first.
    pub async fn list(
        &self,
        owner: i32,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeRecord>, DbErr> {
        let mut select = recipe::Entity::find().filter(recipe::Column::UserId.eq(owner));

        if !filter.tag_ids.is_empty() {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_tag::Column::RecipeId)
                        .from(recipe_tag::Entity)
                        .and_where(recipe_tag::Column::TagId.is_in(filter.tag_ids.clone()))
                        .to_owned(),
                ),
            );
        }
        if !filter.ingredient_ids.is_empty() {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_ingredient::Column::RecipeId)
                        .from(recipe_ingredient::Entity)
                        .and_where(
                            recipe_ingredient::Column::IngredientId
                                .is_in(filter.ingredient_ids.clone()),
                        )
                        .to_owned(),
                ),
            );
        }

        let recipes = select
            .order_by_desc(recipe::Column::Id)
            .all(self.conn)
            .await?;

        self.load_records(recipes).await
    }

    /// Attach tags and ingredients to a single recipe.
    pub async fn load_record(&self, recipe: recipe::Model) -> Result<RecipeRecord, DbErr> {
        let mut records = self.load_records(vec![recipe]).await?;
        records
            .pop()
            .ok_or_else(|| DbErr::Custom("recipe record vanished while loading".to_string()))
    }

    /// Attach tags and ingredients to each recipe, preserving input order.
    ///
    /// Uses four queries regardless of how many recipes are passed.
    pub async fn load_records(
        &self,
        recipes: Vec<recipe::Model>,
    ) -> Result<Vec<RecipeRecord>, DbErr> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }
        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

        let tag_links = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
            .all(self.conn)
            .await?;
        let tag_ids: HashSet<i32> = tag_links.iter().map(|l| l.tag_id).collect();
        let tags: HashMap<i32, tag::Model> = if tag_ids.is_empty() {
            HashMap::new()
        } else {
            tag::Entity::find()
                .filter(tag::Column::Id.is_in(tag_ids))
                .all(self.conn)
                .await?
                .into_iter()
                .map(|t| (t.id, t))
                .collect()
        };

        let ingredient_links = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
            .all(self.conn)
            .await?;
        let ingredient_ids: HashSet<i32> =
            ingredient_links.iter().map(|l| l.ingredient_id).collect();
        let ingredients: HashMap<i32, ingredient::Model> = if ingredient_ids.is_empty() {
            HashMap::new()
        } else {
            ingredient::Entity::find()
                .filter(ingredient::Column::Id.is_in(ingredient_ids))
                .all(self.conn)
                .await?
                .into_iter()
                .map(|i| (i.id, i))
                .collect()
        };

        let mut tags_by_recipe: HashMap<i32, Vec<tag::Model>> = HashMap::new();
        for link in tag_links {
            if let Some(tag) = tags.get(&link.tag_id) {
                tags_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(tag.clone());
            }
        }
        let mut ingredients_by_recipe: HashMap<i32, Vec<ingredient::Model>> = HashMap::new();
        for link in ingredient_links {
            if let Some(ingredient) = ingredients.get(&link.ingredient_id) {
                ingredients_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(ingredient.clone());
            }
        }

        Ok(recipes
            .into_iter()
            .map(|recipe| {
                let mut tags = tags_by_recipe.remove(&recipe.id).unwrap_or_default();
                tags.sort_by(|a, b| a.name.cmp(&b.name));
                let mut ingredients = ingredients_by_recipe.remove(&recipe.id).unwrap_or_default();
                ingredients.sort_by(|a, b| a.name.cmp(&b.name));
                RecipeRecord {
                    recipe,
                    tags,
                    ingredients,
                }
            })
            .collect())
    }
}

/// Trimmed names in first-seen order, with repeats dropped.
pub fn distinct_names(specs: &[VocabularyRef]) -> Vec<String> {
    let mut seen = HashSet::new();
    specs
        .iter()
        .map(|spec| spec.name.trim().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
