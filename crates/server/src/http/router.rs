use super::handlers::{admin, comments, messages, rooms, sse};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const METHODS: [Method; 3] = [Method::GET, Method::POST, Method::DELETE];

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let cors = if allowed_origins == "*" {
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
            CorsLayer::new()
                .allow_methods(METHODS)
                .allow_origin(Any)
                .allow_headers(Any)
        } else {
            tracing::info!("CORS enabled for origins: {:?}", origins);
            CorsLayer::new()
                .allow_methods(METHODS)
                .allow_origin(origins)
                .allow_headers(Any)
        }
    };

    let admin_routes = Router::new()
        .route("/comments/:comment_id/hide", post(admin::hide_comment))
        .route("/slang", get(admin::list_slang).post(admin::add_slang))
        .route("/slang/:word", delete(admin::remove_slang))
        .route("/users/:user_id", get(admin::user_standing))
        .route("/users/:user_id/deactivate", post(admin::deactivate_user))
        .route("/users/:user_id/reactivate", post(admin::reactivate_user))
        .route("/tokens/:user_id", post(admin::issue_token));

    Router::new()
        .route(
            "/api/blogs/:blog_id/comments",
            get(comments::list_comments).post(comments::post_comment),
        )
        .route("/api/comments/:comment_id/flag", post(comments::flag_comment))
        .route("/api/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/api/rooms/mine", get(rooms::my_rooms))
        .route("/api/rooms/:room_id", get(rooms::get_room))
        .route("/api/rooms/:room_id/join", post(rooms::join_room))
        .route("/api/rooms/:room_id/leave", post(rooms::leave_room))
        .route(
            "/api/rooms/:room_id/messages",
            get(messages::history).post(messages::send_message),
        )
        .route("/api/rooms/:room_id/live", get(sse::room_live))
        .nest("/api/admin", admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenSigner;
    use crate::live::RoomHub;
    use crate::services::{Moderation, Relay, Rooms};
    use adapter::NotificationQueue;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use domain::{MaskCase, SlangFilter};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use storage::Db;
    use tower::ServiceExt;

    const ADMIN: &str = "test-admin";

    struct Harness {
        app: Router,
        signer: TokenSigner,
        // keeps the notification queue open
        _notices: tokio::sync::mpsc::Receiver<domain::NotifyCommand>,
    }

    async fn harness() -> Harness {
        let db = Db::connect_in_memory().await.unwrap();
        let filter = Arc::new(SlangFilter::with_words(["darn"], MaskCase::Lower));
        let (queue, rx) = NotificationQueue::new(16);
        let hub = RoomHub::new(16);
        let signer = TokenSigner::new("router-secret");
        let state = AppState {
            db: db.clone(),
            moderation: Moderation::new(db.clone(), filter, queue, 3),
            rooms: Rooms::new(db.clone(), hub.clone()),
            relay: Relay::new(db.clone(), hub),
            signer: signer.clone(),
            admin_token: Arc::from(ADMIN),
            history_page_size: 50,
        };
        Harness {
            app: build_router(state, "*"),
            signer,
            _notices: rx,
        }
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_comment_flow_over_http() {
        let h = harness().await;
        let alice = h.signer.issue("alice");

        let (status, body) = call(
            &h.app,
            "POST",
            "/api/blogs/post-1/comments",
            Some(&alice),
            Some(json!({ "content": "well darn it" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "well d**n it");
        assert_eq!(body["is_blurred"], true);
        let comment_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = call(&h.app, "GET", "/api/blogs/post-1/comments", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);

        let bob = h.signer.issue("bob");
        let uri = format!("/api/comments/{}/flag", comment_id);
        let (status, body) = call(&h.app, "POST", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["flag_count"], 1);

        let (status, _) = call(&h.app, "POST", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_auth_rejections() {
        let h = harness().await;
        let room = Some(json!({ "name": "x" }));

        let (status, _) = call(&h.app, "POST", "/api/rooms", None, room.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&h.app, "POST", "/api/rooms", Some("alice.00ff"), room).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let alice = h.signer.issue("alice");
        let (status, _) = call(&h.app, "GET", "/api/admin/slang", Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&h.app, "GET", "/api/admin/slang", Some("test-admix"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&h.app, "GET", "/api/admin/slang", Some(ADMIN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["darn"]));
    }

    #[tokio::test]
    async fn test_room_messages_require_membership() {
        let h = harness().await;
        let alice = h.signer.issue("alice");
        let bob = h.signer.issue("bob");
        let hi = Some(json!({ "text": "hi" }));

        let general = Some(json!({ "name": "general" }));
        let (status, room) = call(&h.app, "POST", "/api/rooms", Some(&alice), general).await;
        assert_eq!(status, StatusCode::OK);
        let room_id = room["id"].as_str().unwrap();
        let messages = format!("/api/rooms/{}/messages", room_id);
        let live = format!("/api/rooms/{}/live", room_id);

        let (status, _) = call(&h.app, "POST", &messages, Some(&bob), hi.clone()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&h.app, "GET", &live, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, msg) = call(&h.app, "POST", &messages, Some(&alice), hi).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(msg["author_id"], "alice");

        let (status, page) = call(&h.app, "GET", &messages, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_comment() {
        let h = harness().await;
        let (status, body) =
            call(&h.app, "POST", "/api/admin/tokens/carol", Some(ADMIN), None).await;
        assert_eq!(status, StatusCode::OK);
        let carol = body["token"].as_str().unwrap().to_string();

        let deactivate = "/api/admin/users/carol/deactivate";
        let (status, standing) = call(&h.app, "POST", deactivate, Some(ADMIN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(standing["is_active"], false);

        let (status, _) = call(
            &h.app,
            "POST",
            "/api/blogs/post-1/comments",
            Some(&carol),
            Some(json!({ "content": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
