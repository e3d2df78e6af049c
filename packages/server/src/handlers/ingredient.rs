use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::{LockType, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ingredient, recipe_ingredient};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::vocabulary::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Ingredients",
    operation_id = "listIngredients",
    summary = "List the caller's ingredients",
    description = "Returns the caller's ingredients ordered by name, descending. With `assigned_only=1`, only ingredients linked to at least one recipe are returned, each once.",
    params(VocabularyListQuery),
    responses(
        (status = 200, description = "List of ingredients", body = Vec<VocabularyResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_ingredients(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<VocabularyListQuery>,
) -> Result<Json<Vec<VocabularyResponse>>, AppError> {
    let mut select = ingredient::Entity::find().filter(ingredient::Column::UserId.eq(auth_user.user_id));

    if query.assigned_only() {
        select = select.filter(
            ingredient::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_ingredient::Column::IngredientId)
                    .from(recipe_ingredient::Entity)
                    .to_owned(),
            ),
        );
    }

    let ingredients = select
        .order_by_desc(ingredient::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Ingredients",
    operation_id = "updateIngredient",
    summary = "Rename an ingredient",
    params(("id" = i32, Path, description = "Ingredient ID")),
    request_body = UpdateVocabularyRequest,
    responses(
        (status = 200, description = "Ingredient renamed", body = VocabularyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used by another ingredient (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateVocabularyRequest>,
) -> Result<Json<VocabularyResponse>, AppError> {
    rename_ingredient(&state, &auth_user, id, payload).await
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Ingredients",
    operation_id = "replaceIngredient",
    summary = "Replace an ingredient",
    params(("id" = i32, Path, description = "Ingredient ID")),
    request_body = UpdateVocabularyRequest,
    responses(
        (status = 200, description = "Ingredient replaced", body = VocabularyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used by another ingredient (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn replace_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateVocabularyRequest>,
) -> Result<Json<VocabularyResponse>, AppError> {
    rename_ingredient(&state, &auth_user, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Ingredients",
    operation_id = "deleteIngredient",
    summary = "Delete an ingredient",
    description = "Deletes the ingredient and detaches it from every recipe.",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_owned_ingredient_for_update(&txn, auth_user.user_id, id).await?;

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::IngredientId.eq(id))
        .exec(&txn)
        .await?;
    ingredient::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rename_ingredient(
    state: &AppState,
    auth_user: &AuthUser,
    id: i32,
    payload: UpdateVocabularyRequest,
) -> Result<Json<VocabularyResponse>, AppError> {
    validate_update_vocabulary(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_owned_ingredient_for_update(&txn, auth_user.user_id, id).await?;
    let mut active: ingredient::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());

    let model = active.update(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("You already have an ingredient with this name".into())
        }
        _ => AppError::from(e),
    })?;

    txn.commit().await?;
    Ok(Json(model.into()))
}

/// Other users' ingredients are reported as missing.
async fn find_owned_ingredient_for_update(
    txn: &DatabaseTransaction,
    owner: i32,
    id: i32,
) -> Result<ingredient::Model, AppError> {
    ingredient::Entity::find_by_id(id)
        .filter(ingredient::Column::UserId.eq(owner))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))
}
