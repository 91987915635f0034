//! JSON API handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::services::session::SessionAccessor;
use crate::state::AppState;

/// Current session.
///
/// `{"session": {...}}` when signed in, `{"session": null}` otherwise, and
/// `{"error": "..."}` with 500 when the session cannot be checked. Tokens are
/// never included.
pub async fn session(State(state): State<AppState>, session: Session) -> Response {
    match SessionAccessor::new(state.gateway(), &session)
        .get_session()
        .await
    {
        Ok(info) => Json(json!({ "session": info })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Unable to read session" })),
            )
                .into_response()
        }
    }
}
