//! Deck endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::routes::items::validate_item;
use crate::AppState;

fn validate_deck_name(payload: &DeckRequest) -> Result<&str> {
    let name = payload.deck_name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("deck_name must not be empty".to_string()));
    }
    Ok(name)
}

async fn get_owned_deck(state: &AppState, user_id: i64, deck_id: i64) -> Result<DbDeck> {
    state
        .db
        .get_deck(user_id, deck_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deck {}", deck_id)))
}

/// GET /api/decks
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<DeckListResponse>> {
    let decks = state.db.list_decks(auth.user_id).await?;
    Ok(Json(DeckListResponse { decks }))
}

/// POST /api/decks
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<DeckRequest>,
) -> Result<Json<DbDeck>> {
    let name = validate_deck_name(&payload)?;
    let deck = state.db.create_deck(auth.user_id, name).await?;
    Ok(Json(deck))
}

/// PUT /api/decks/{deck_id}
pub async fn rename(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(deck_id): Path<i64>,
    Json(payload): Json<DeckRequest>,
) -> Result<Json<DbDeck>> {
    let name = validate_deck_name(&payload)?;
    let deck = state
        .db
        .rename_deck(auth.user_id, deck_id, name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deck {}", deck_id)))?;
    Ok(Json(deck))
}

/// DELETE /api/decks/{deck_id}
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(deck_id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    if !state.db.delete_deck(auth.user_id, deck_id).await? {
        return Err(ApiError::NotFound(format!("Deck {}", deck_id)));
    }

    Ok(Json(MessageResponse {
        message: "Deck deleted successfully".to_string(),
    }))
}

/// GET /api/decks/{deck_id}/items
pub async fn items(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(deck_id): Path<i64>,
) -> Result<Json<ItemListResponse>> {
    get_owned_deck(&state, auth.user_id, deck_id).await?;
    let items = state.db.get_deck_items(deck_id).await?;
    Ok(Json(ItemListResponse { items }))
}

/// POST /api/decks/{deck_id}/items
/// Creates a new item and attaches it to the deck
pub async fn create_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(deck_id): Path<i64>,
    Json(payload): Json<ItemRequest>,
) -> Result<Json<DbItem>> {
    validate_item(&payload)?;
    get_owned_deck(&state, auth.user_id, deck_id).await?;

    let item = state
        .db
        .create_deck_item(auth.user_id, deck_id, &payload)
        .await?;
    Ok(Json(item))
}

/// PUT /api/decks/{deck_id}/items/{item_id}
/// Attaches an existing item to the deck
pub async fn attach_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((deck_id, item_id)): Path<(i64, i64)>,
) -> Result<Json<DbItem>> {
    get_owned_deck(&state, auth.user_id, deck_id).await?;
    let item = state
        .db
        .get_item(item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {}", item_id)))?;

    state.db.add_deck_item(deck_id, item_id).await?;
    Ok(Json(item))
}

/// DELETE /api/decks/{deck_id}/items/{item_id}
pub async fn detach_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((deck_id, item_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>> {
    get_owned_deck(&state, auth.user_id, deck_id).await?;
    if !state.db.remove_deck_item(deck_id, item_id).await? {
        return Err(ApiError::NotFound(format!(
            "Item {} is not in deck {}",
            item_id, deck_id
        )));
    }

    Ok(Json(MessageResponse {
        message: "Item removed from deck".to_string(),
    }))
}
