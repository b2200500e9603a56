use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::handlers::extract::{first_row, to_row, written_row, JsonBody};
use crate::models::user::{SetAmount, SetPaid, SetPass, UserRecord, USERS_TABLE, USER_KEY};
use crate::stores::table_store::{Filter, Row};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

const USER_NOT_FOUND: &str = "User not found";

/// Create a user, or replace the one with the same phone number
///
/// POST /update
pub async fn upsert_user_handler(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> Result<Response, ApiError> {
    let user: UserRecord = body.parse("/update")?;

    let rows = state
        .store
        .upsert(USERS_TABLE, to_row(&user)?, USER_KEY)
        .await?;
    let record = written_row(rows)?;

    info!(phone_no = %user.phone_no, "User upserted");

    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// Insert a new user without conflict resolution
///
/// POST /users
pub async fn insert_user_handler(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> Result<Response, ApiError> {
    let user: UserRecord = body.parse("/users")?;

    let rows = state.store.insert(USERS_TABLE, to_row(&user)?).await?;
    let record = written_row(rows)?;

    info!(phone_no = %user.phone_no, "User inserted");

    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// List every user
///
/// GET /select
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let rows = state.store.select(USERS_TABLE, None).await?;
    Ok(Json(rows))
}

/// PUT /update-paid-status
pub async fn set_paid_handler(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Row>, ApiError> {
    let update: SetPaid = body.parse("/update-paid-status")?;
    update_user_field(&state, &update.phone_no, &update).await
}

/// PUT /update-amount
pub async fn set_amount_handler(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Row>, ApiError> {
    let update: SetAmount = body.parse("/update-amount")?;
    update_user_field(&state, &update.phone_no, &update).await
}

/// PUT /update-pass
pub async fn set_pass_handler(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> Result<Json<Row>, ApiError> {
    let update: SetPass = body.parse("/update-pass")?;
    update_user_field(&state, &update.phone_no, &update).await
}

async fn update_user_field<T: Serialize>(
    state: &AppState,
    phone_no: &str,
    fields: &T,
) -> Result<Json<Row>, ApiError> {
    let fields = to_row(fields)?;
    let columns: Vec<String> = fields.keys().cloned().collect();

    let rows = state
        .store
        .update_fields(USERS_TABLE, &Filter::eq(USER_KEY, phone_no), fields)
        .await?;
    let record = first_row(rows, USER_NOT_FOUND)?;

    info!(phone_no, columns = ?columns, "User updated");

    Ok(Json(record))
}
