use axum::response::IntoResponse;

pub const GREETING: &str = "Vanakam da mappla";

/// GET /
pub async fn root_handler() -> impl IntoResponse {
    GREETING
}
