use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::error::AppError;
use crate::models::connectivity::ConnectivityEvent;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/connectivity", post(report_connectivity).get(get_connectivity))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityResponse {
    pub is_offline: bool,
}

/// Entry point for the platform network monitor. Events are applied asynchronously.
async fn report_connectivity(
    State(state): State<Arc<AppState>>,
    Json(event): Json<ConnectivityEvent>,
) -> Result<StatusCode, AppError> {
    state
        .connectivity_tx
        .send(event)
        .await
        .map_err(|err| AppError::Internal(format!("connectivity channel closed: {err}")))?;

    Ok(StatusCode::ACCEPTED)
}

async fn get_connectivity(State(state): State<Arc<AppState>>) -> Json<ConnectivityResponse> {
    Json(ConnectivityResponse {
        is_offline: state.connectivity.is_offline(),
    })
}
