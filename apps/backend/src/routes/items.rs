//! Vocabulary item endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

pub(crate) fn validate_item(item: &ItemRequest) -> Result<()> {
    if item.english.trim().is_empty() || item.japanese.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "english and japanese must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Items may be changed by their creator or a superuser.
fn ensure_can_modify(auth: &AuthenticatedUser, item: &DbItem) -> Result<()> {
    if auth.is_superuser || item.user_id == Some(auth.user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Item {} belongs to another user",
            item.id
        )))
    }
}

async fn get_existing(state: &AppState, item_id: i64) -> Result<DbItem> {
    state
        .db
        .get_item(item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {}", item_id)))
}

/// GET /api/items?grade=&q=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<ItemListResponse>> {
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let items = state.db.search_items(query.grade, search).await?;
    Ok(Json(ItemListResponse { items }))
}

/// POST /api/items
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<ItemRequest>,
) -> Result<Json<DbItem>> {
    validate_item(&payload)?;
    let item = state.db.create_item(Some(auth.user_id), &payload).await?;
    Ok(Json(item))
}

/// GET /api/items/{item_id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Json<DbItem>> {
    Ok(Json(get_existing(&state, item_id).await?))
}

/// PUT /api/items/{item_id}
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(item_id): Path<i64>,
    Json(payload): Json<ItemRequest>,
) -> Result<Json<DbItem>> {
    validate_item(&payload)?;
    ensure_can_modify(&auth, &get_existing(&state, item_id).await?)?;

    let item = state
        .db
        .update_item(item_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {}", item_id)))?;
    Ok(Json(item))
}

/// DELETE /api/items/{item_id}
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(item_id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    ensure_can_modify(&auth, &get_existing(&state, item_id).await?)?;
    state.db.delete_item(item_id).await?;

    Ok(Json(MessageResponse {
        message: "Item deleted successfully".to_string(),
    }))
}

/// POST /api/items/import
/// Bulk import from `EN:`/`JA:`/`GRADE:` blocks; all or nothing
pub async fn import(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>> {
    let raw_items = quiz_core::parse(&payload.content, payload.default_grade)?;
    if raw_items.is_empty() {
        return Err(ApiError::BadRequest("No items found in import".to_string()));
    }

    let requests: Vec<ItemRequest> = raw_items
        .into_iter()
        .map(|raw| ItemRequest {
            english: raw.prompt_text,
            japanese: raw.answer_text,
            grade: raw.difficulty,
        })
        .collect();

    let items = state.db.create_items(auth.user_id, &requests).await?;
    tracing::info!("User {} imported {} items", auth.user_name, items.len());

    Ok(Json(ImportResponse {
        imported_count: items.len(),
        items,
    }))
}
