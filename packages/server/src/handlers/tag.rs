use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::{LockType, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{recipe_tag, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::vocabulary::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List the caller's tags",
    description = "Returns the caller's tags ordered by name, descending. With `assigned_only=1`, only tags linked to at least one recipe are returned, each once.",
    params(VocabularyListQuery),
    responses(
        (status = 200, description = "List of tags", body = Vec<VocabularyResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_tags(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<VocabularyListQuery>,
) -> Result<Json<Vec<VocabularyResponse>>, AppError> {
    let mut select = tag::Entity::find().filter(tag::Column::UserId.eq(auth_user.user_id));

    if query.assigned_only() {
        select = select.filter(
            tag::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_tag::Column::TagId)
                    .from(recipe_tag::Entity)
                    .to_owned(),
            ),
        );
    }

    let tags = select
        .order_by_desc(tag::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Rename a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = UpdateVocabularyRequest,
    responses(
        (status = 200, description = "Tag renamed", body = VocabularyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used by another tag (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateVocabularyRequest>,
) -> Result<Json<VocabularyResponse>, AppError> {
    rename_tag(&state, &auth_user, id, payload).await
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Tags",
    operation_id = "replaceTag",
    summary = "Replace a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = UpdateVocabularyRequest,
    responses(
        (status = 200, description = "Tag replaced", body = VocabularyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used by another tag (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn replace_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateVocabularyRequest>,
) -> Result<Json<VocabularyResponse>, AppError> {
    rename_tag(&state, &auth_user, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Deletes the tag and detaches it from every recipe.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_owned_tag_for_update(&txn, auth_user.user_id, id).await?;

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rename_tag(
    state: &AppState,
    auth_user: &AuthUser,
    id: i32,
    payload: UpdateVocabularyRequest,
) -> Result<Json<VocabularyResponse>, AppError> {
    validate_update_vocabulary(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_owned_tag_for_update(&txn, auth_user.user_id, id).await?;
    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());

    let model = active.update(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("You already have a tag with this name".into())
        }
        _ => AppError::from(e),
    })?;

    txn.commit().await?;
    Ok(Json(model.into()))
}

/// Other users' tags are reported as missing.
async fn find_owned_tag_for_update(
    txn: &DatabaseTransaction,
    owner: i32,
    id: i32,
) -> Result<tag::Model, AppError> {
    tag::Entity::find_by_id(id)
        .filter(tag::Column::UserId.eq(owner))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))
}
