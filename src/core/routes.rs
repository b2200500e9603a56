// HTTP routes configuration

use crate::core::error::{ApiError, SERVER_ERROR};
use crate::core::state::AppState;
use crate::handlers::{contacts, fallback, health, root, users};
use axum::{
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root::root_handler))
        .route("/health", get(health::health_handler))

        // Users
        .route("/update", post(users::upsert_user_handler))
        .route("/users", post(users::insert_user_handler))
        .route("/select", get(users::list_users_handler))
        .route("/user", get(users::list_users_handler))
        .route("/update-paid-status", put(users::set_paid_handler))
        .route("/update-amount", put(users::set_amount_handler))
        .route("/update-pass", put(users::set_pass_handler))

        // Contacts
        .route(
            "/u1",
            post(contacts::create_contact_handler).get(contacts::list_contacts_handler),
        )
        .route(
            "/u1/{phone}",
            get(contacts::get_contact_handler)
                .put(contacts::update_contact_handler)
                .delete(contacts::delete_contact_handler),
        )

        // JSON bodies for unmatched paths and unsupported methods
        .fallback(fallback::fallback_handler)
        .method_not_allowed_fallback(fallback::method_not_allowed_handler)

        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Handler panicked");

    ApiError::Internal(SERVER_ERROR.to_string()).into_response()
}
