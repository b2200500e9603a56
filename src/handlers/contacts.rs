use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::handlers::extract::{first_row, to_row, written_row, JsonBody, PathParam};
use crate::models::contact::{ContactPatch, NewContact, CONTACTS_TABLE, CONTACT_KEY};
use crate::stores::table_store::{Filter, Row};
use crate::validation::fields::validate_phone;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

const CONTACT_NOT_FOUND: &str = "Contact not found";

fn phone_filter(phone: &str) -> Result<Filter, ApiError> {
    validate_phone(CONTACT_KEY, phone).map_err(|errors| {
        warn!(phone, "Invalid phone in path");
        ApiError::Validation(errors)
    })?;
    Ok(Filter::eq(CONTACT_KEY, phone))
}

/// POST /u1
pub async fn create_contact_handler(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> Result<Response, ApiError> {
    let contact: NewContact = body.parse("/u1")?;

    let rows = state.store.insert(CONTACTS_TABLE, to_row(&contact)?).await?;
    let record = written_row(rows)?;

    info!(phone = %contact.phone, "Contact created");

    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// GET /u1
pub async fn list_contacts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let rows = state.store.select(CONTACTS_TABLE, None).await?;
    Ok(Json(rows))
}

/// GET /u1/{phone}
pub async fn get_contact_handler(
    State(state): State<Arc<AppState>>,
    PathParam(phone): PathParam,
) -> Result<Json<Row>, ApiError> {
    let filter = phone_filter(&phone)?;

    let rows = state.store.select(CONTACTS_TABLE, Some(&filter)).await?;
    Ok(Json(first_row(rows, CONTACT_NOT_FOUND)?))
}

/// Update only the supplied fields of a contact
///
/// PUT /u1/{phone}
pub async fn update_contact_handler(
    State(state): State<Arc<AppState>>,
    PathParam(phone): PathParam,
    body: JsonBody,
) -> Result<Json<Row>, ApiError> {
    let filter = phone_filter(&phone)?;
    let patch: ContactPatch = body.parse("/u1/{phone}")?;

    if patch.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide at least one of username, email, college".to_string(),
        ));
    }

    let fields = to_row(&patch)?;
    let columns: Vec<String> = fields.keys().cloned().collect();

    let rows = state
        .store
        .update_fields(CONTACTS_TABLE, &filter, fields)
        .await?;
    let record = first_row(rows, CONTACT_NOT_FOUND)?;

    info!(phone = %phone, columns = ?columns, "Contact updated");

    Ok(Json(record))
}

/// DELETE /u1/{phone}
pub async fn delete_contact_handler(
    State(state): State<Arc<AppState>>,
    PathParam(phone): PathParam,
) -> Result<Json<Row>, ApiError> {
    let filter = phone_filter(&phone)?;

    let rows = state.store.delete(CONTACTS_TABLE, &filter).await?;
    let record = first_row(rows, CONTACT_NOT_FOUND)?;

    info!(phone = %phone, "Contact deleted");

    Ok(Json(record))
}
