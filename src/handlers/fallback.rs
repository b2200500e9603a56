use crate::core::error::ApiError;
use axum::{
    http::{Method, Uri},
    response::{IntoResponse, Response},
};
use tracing::debug;

pub async fn fallback_handler(uri: Uri) -> Response {
    debug!(path = %uri.path(), "No route matched");

    ApiError::NotFound(format!(
        "No route for {}. Valid endpoints: /, /health, /update, /users, /select, /user, \
        /update-paid-status, /update-amount, /update-pass, /u1, /u1/{{phone}}",
        uri.path()
    ))
    .into_response()
}

/// Known path, unsupported method
pub async fn method_not_allowed_handler(method: Method, uri: Uri) -> Response {
    debug!(method = %method, path = %uri.path(), "Method not allowed");

    ApiError::MethodNotAllowed(format!("{} not allowed on {}", method, uri.path())).into_response()
}
