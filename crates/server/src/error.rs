use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e {
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::DuplicateFlag | CoreError::AlreadyMember => StatusCode::CONFLICT,
                CoreError::NotMember | CoreError::AccountDeactivated => StatusCode::FORBIDDEN,
                CoreError::InvalidMessage(_) | CoreError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Short text for clients. Store faults never leak their details.
    fn public_message(&self) -> String {
        match self {
            ApiError::Core(CoreError::NotFound { kind, .. }) => format!("{} not found", kind),
            ApiError::Core(CoreError::Store(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Core(CoreError::Store(e)) = &self {
            tracing::error!("Store failure: {:?}", e);
        }
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}
