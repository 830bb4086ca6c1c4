use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::{BlogId, Comment};
use serde::{Deserialize, Serialize};

use crate::{auth::CallerId, error::ApiError, state::AppState};

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct CreateCommentResponse {
    pub id: String,
    pub content: String,
    pub is_blurred: bool,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
    pub total: i64,
}

#[derive(Serialize)]
pub struct FlagResponse {
    pub flag_count: i64,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(blog_id_str): Path<String>,
    Query(q): Query<ListQuery>,
) -> Result<Json<CommentList>, ApiError> {
    let blog_id = BlogId::new(blog_id_str).map_err(ApiError::BadRequest)?;
    let (comments, total) = state
        .moderation
        .list_comments(&blog_id, q.limit.unwrap_or(50), q.offset.unwrap_or(0))
        .await?;
    Ok(Json(CommentList { comments, total }))
}

pub async fn post_comment(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(blog_id_str): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<CreateCommentResponse>, ApiError> {
    let blog_id = BlogId::new(blog_id_str).map_err(ApiError::BadRequest)?;

    let comment = state
        .moderation
        .submit_comment(&user_id, blog_id, &payload.content)
        .await?;

    Ok(Json(CreateCommentResponse {
        id: comment.id,
        content: comment.content,
        is_blurred: comment.flags.is_blurred,
    }))
}

pub async fn flag_comment(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(comment_id): Path<String>,
) -> Result<Json<FlagResponse>, ApiError> {
    let flag_count = state.moderation.flag_comment(&user_id, &comment_id).await?;
    Ok(Json(FlagResponse { flag_count }))
}
