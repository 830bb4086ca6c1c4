use axum::{
    extract::{Path, State},
    Json,
};
use domain::UserStanding;
use serde::{Deserialize, Serialize};

use crate::{auth::AdminGuard, error::ApiError, state::AppState};

#[derive(Serialize)]
pub struct HideResponse {
    pub already_hidden: bool,
}

#[derive(Deserialize)]
pub struct WordRequest {
    pub word: String,
}

#[derive(Serialize)]
pub struct WordChange {
    pub changed: bool,
    pub words: Vec<String>,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn hide_comment(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> Result<Json<HideResponse>, ApiError> {
    let already_hidden = state.moderation.hide_comment(&comment_id).await?;
    Ok(Json(HideResponse { already_hidden }))
}

pub async fn list_slang(
    _admin: AdminGuard,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.moderation.slang_words()?))
}

pub async fn add_slang(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Json(payload): Json<WordRequest>,
) -> Result<Json<WordChange>, ApiError> {
    let changed = state.moderation.add_slang_word(&payload.word).await?;
    let words = state.moderation.slang_words()?;
    Ok(Json(WordChange { changed, words }))
}

pub async fn remove_slang(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<Json<WordChange>, ApiError> {
    let changed = state.moderation.remove_slang_word(&word).await?;
    let words = state.moderation.slang_words()?;
    Ok(Json(WordChange { changed, words }))
}

pub async fn user_standing(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStanding>, ApiError> {
    Ok(Json(state.moderation.user_standing(&user_id).await?))
}

pub async fn deactivate_user(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStanding>, ApiError> {
    state.moderation.set_user_active(&user_id, false).await?;
    Ok(Json(state.moderation.user_standing(&user_id).await?))
}

pub async fn reactivate_user(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStanding>, ApiError> {
    state.moderation.set_user_active(&user_id, true).await?;
    Ok(Json(state.moderation.user_standing(&user_id).await?))
}

/// Mints a caller token; stands in for the external session service.
pub async fn issue_token(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("User ID cannot be empty".to_string()));
    }
    state.db.ensure_user(&user_id).await.map_err(domain::CoreError::Store)?;
    Ok(Json(TokenResponse {
        token: state.signer.issue(&user_id),
    }))
}
