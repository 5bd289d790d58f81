use axum::extract::State;
use axum::http::StatusCode;

use hackers_core::health::readiness;

use crate::domain::repository::Persistence;
use crate::state::AppState;

/// `GET /readyz`: 503 until the backing store answers.
pub async fn readyz<P: Persistence>(State(state): State<AppState<P>>) -> StatusCode {
    readiness(state.persistence.ping().await)
}
