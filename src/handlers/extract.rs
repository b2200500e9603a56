use crate::core::error::ApiError;
use crate::stores::table_store::Row;
use crate::validation::requests::Schema;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde_json::Value;
use tracing::warn;

/// JSON request body whose rejections render as [`ApiError`]
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await.map_err(|e| {
            warn!(error = %e.body_text(), "Rejected request body");
            ApiError::from(e)
        })?;
        Ok(Self(value))
    }
}

/// Single path segment whose rejections render as [`ApiError`]
pub struct PathParam(pub String);

impl<S> FromRequestParts<S> for PathParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                warn!(error = %e.body_text(), "Rejected path parameter");
                ApiError::from(e)
            })?;
        Ok(Self(value))
    }
}

impl JsonBody {
    /// Run the route's schema over the body
    pub fn parse<T: Schema>(&self, route: &str) -> Result<T, ApiError> {
        T::parse(&self.0).map_err(|errors| {
            warn!(route, errors = ?errors, "Validation failed");
            ApiError::Validation(errors)
        })
    }
}

/// Serialize a typed payload into a store row
pub fn to_row<T: serde::Serialize>(value: &T) -> Result<Row, ApiError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(ApiError::Internal(format!(
            "payload serialized to non-object: {}",
            other
        ))),
    }
}

/// First affected row, or a 404 with `message`
pub fn first_row(rows: Vec<Row>, message: &str) -> Result<Row, ApiError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound(message.to_string()))
}

/// First row written by an insert or upsert
pub fn written_row(rows: Vec<Row>) -> Result<Row, ApiError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("table store returned no rows for a write".to_string()))
}
