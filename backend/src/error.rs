use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shared::RequestError;

use crate::messages::request_error_message;

#[derive(Debug)]
pub enum ApiError {
    SessionNotFound,
    Request(RequestError),
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::Request(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::SessionNotFound => (StatusCode::NOT_FOUND, "session_not_found", "Session not found"),
            ApiError::Request(err) => {
                let status = match err {
                    RequestError::SpinInProgress => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.kind(), request_error_message(err))
            }
        };

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
