use axum::{
    extract::{Path, State},
    Json,
};
use domain::Room;
use serde::{Deserialize, Serialize};

use crate::{auth::CallerId, error::ApiError, state::AppState};

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
pub struct LeaveResponse {
    pub room_deleted: bool,
    pub room: Option<Room>,
}

pub async fn list_rooms(
    State(state): State<AppState>,
    _caller: CallerId,
) -> Result<Json<Vec<Room>>, ApiError> {
    Ok(Json(state.rooms.list_rooms().await?))
}

pub async fn my_rooms(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<Json<Vec<Room>>, ApiError> {
    Ok(Json(state.rooms.list_rooms_for_user(&user_id).await?))
}

pub async fn get_room(
    State(state): State<AppState>,
    _caller: CallerId,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(state.rooms.get_room(&room_id).await?))
}

pub async fn create_room(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<Room>, ApiError> {
    let room = state
        .rooms
        .create_room(&payload.name, &payload.description, &user_id)
        .await?;
    Ok(Json(room))
}

pub async fn join_room(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(state.rooms.join_room(&room_id, &user_id).await?))
}

pub async fn leave_room(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(room_id): Path<String>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let room = state.rooms.leave_room(&room_id, &user_id).await?;
    Ok(Json(LeaveResponse {
        room_deleted: room.is_none(),
        room,
    }))
}
