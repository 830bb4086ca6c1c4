use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::{HistoryPage, Message};
use serde::Deserialize;

use crate::{auth::CallerId, error::ApiError, state::AppState};

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub before: Option<i64>,
}

pub async fn send_message(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(room_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    crate::services::ensure_active(&state.db, &user_id).await?;
    state.rooms.ensure_member(&room_id, &user_id).await?;
    let message = state.relay.send_message(&room_id, &user_id, &payload.text).await?;
    Ok(Json(message))
}

pub async fn history(
    State(state): State<AppState>,
    _caller: CallerId,
    Path(room_id): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>, ApiError> {
    let page = state
        .relay
        .history(&room_id, q.before, q.limit.unwrap_or(state.history_page_size))
        .await?;
    Ok(Json(page))
}
