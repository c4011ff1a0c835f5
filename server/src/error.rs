use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hub_api::client::ApiError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("admin role required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for ServerError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(what) => ServerError::NotFound(what),
            ApiError::Other(msg) => ServerError::BadRequest(msg),
            other => ServerError::Backend(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::debug!(%status, "{self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_statuses() {
        let cases = [
            (ApiError::NotFound("teams/t1".into()), StatusCode::NOT_FOUND),
            (ApiError::Other("match update has no fields".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("denied".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Api(StatusCode::BAD_GATEWAY, "down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status(), status);
        }
    }
}
