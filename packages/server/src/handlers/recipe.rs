use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::TransactionTrait;
use tracing::instrument;

use crate::entity::recipe;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::recipe::*;
use crate::models::shared::parse_id_list;
use crate::services::recipe::{RecipeFilter, RecipeService};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List the caller's recipes",
    description = "Returns the caller's recipes, newest first. `tags` and `ingredients` take comma-separated ids and keep recipes linked to any of them. Descriptions are omitted from list results.",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "List of recipes", body = Vec<RecipeSummary>),
        (status = 400, description = "Malformed id list (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_recipes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeSummary>>, AppError> {
    let filter = RecipeFilter {
        tag_ids: match query.tags {
            Some(ref raw) => parse_id_list("tags", raw)?,
            None => Vec::new(),
        },
        ingredient_ids: match query.ingredients {
            Some(ref raw) => parse_id_list("ingredients", raw)?,
            None => Vec::new(),
        },
    };

    let records = RecipeService::new(&state.db)
        .list(auth_user.user_id, &filter)
        .await?;

    Ok(Json(records.into_iter().map(RecipeRecord::summary).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates a recipe owned by the caller. Tags and ingredients are referenced by name and created on the fly if the caller has none with that name yet.",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeDetail),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Concurrent vocabulary creation (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let service = RecipeService::new(&txn);

    let model = service.create_recipe(auth_user.user_id, payload).await?;
    let record = service.load_record(model).await?;

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(record.detail())))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "getRecipe",
    summary = "Get a recipe by ID",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetail),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeDetail>, AppError> {
    let service = RecipeService::new(&state.db);
    let model = service
        .find_owned(auth_user.user_id, id)
        .await?
        .ok_or_else(recipe_not_found)?;

    Ok(Json(service.load_record(model).await?.detail()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Partially update a recipe",
    description = "Only provided fields are modified. A `tags` or `ingredients` list replaces the current associations (an empty list removes them all); omitting it leaves them untouched. Owner fields in the body are ignored.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeDetail),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Concurrent vocabulary creation (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    apply_update(&state, &auth_user, id, payload).await
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "replaceRecipe",
    summary = "Fully update a recipe",
    description = "Like PATCH, but `title`, `time_minutes` and `price` are required.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = ReplaceRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeDetail),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Concurrent vocabulary creation (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn replace_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReplaceRecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    apply_update(&state, &auth_user, id, payload.into()).await
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Deletes the recipe and its tag/ingredient links; the tags and ingredients themselves are kept.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let service = RecipeService::new(&txn);

    service
        .find_owned_for_update(auth_user.user_id, id)
        .await?
        .ok_or_else(recipe_not_found)?;
    service.delete(id).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(
    state: &AppState,
    auth_user: &AuthUser,
    id: i32,
    payload: UpdateRecipeRequest,
) -> Result<Json<RecipeDetail>, AppError> {
    if payload == UpdateRecipeRequest::default() {
        let service = RecipeService::new(&state.db);
        let existing = service
            .find_owned(auth_user.user_id, id)
            .await?
            .ok_or_else(recipe_not_found)?;
        return Ok(Json(service.load_record(existing).await?.detail()));
    }

    let txn = state.db.begin().await?;
    let service = RecipeService::new(&txn);

    let existing: recipe::Model = service
        .find_owned_for_update(auth_user.user_id, id)
        .await?
        .ok_or_else(recipe_not_found)?;
    let model = service
        .update_recipe(auth_user.user_id, existing, payload)
        .await?;
    let record = service.load_record(model).await?;

    txn.commit().await?;
    Ok(Json(record.detail()))
}

fn recipe_not_found() -> AppError {
    AppError::NotFound("Recipe not found".into())
}
