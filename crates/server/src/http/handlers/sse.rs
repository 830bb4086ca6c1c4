use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use domain::LiveEvent;
use futures::stream::{Stream, StreamExt};

use crate::{auth::CallerId, error::ApiError, state::AppState};

pub async fn room_live(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(room_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let subscription = state.relay.subscribe(&room_id, &user_id).await?;
    tracing::info!(
        "Live stream connected: room={} user={}",
        subscription.room_id(),
        user_id
    );

    let stream = subscription.map(|event| {
        let name = match &event {
            LiveEvent::MessagePosted { .. } => "message",
            LiveEvent::RoomClosed { .. } => "room_closed",
        };
        Event::default().event(name).json_data(&event).map_err(|e| {
            tracing::error!("SSE serialization error: {}", e);
            e
        })
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15))))
}
