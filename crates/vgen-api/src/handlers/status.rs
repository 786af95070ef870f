//! Root ping and client status check handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vgen_models::StatusCheck;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Upper bound on returned status checks.
const STATUS_CHECK_LIST_LIMIT: u32 = 1000;

/// Root ping response.
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
}

/// Root API ping.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AI Video Generator API".to_string(),
    })
}

/// Status check creation body.
#[derive(Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

/// Record a client status check ping.
pub async fn create_status_check(
    State(state): State<AppState>,
    Json(input): Json<StatusCheckCreate>,
) -> ApiResult<Json<StatusCheck>> {
    if input.client_name.trim().is_empty() {
        return Err(ApiError::validation("client_name must not be empty"));
    }

    let check = StatusCheck::new(input.client_name);
    state.status_checks.create_status_check(&check).await?;
    Ok(Json(check))
}

/// List recorded status checks.
pub async fn get_status_checks(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StatusCheck>>> {
    let checks = state
        .status_checks
        .list_status_checks(STATUS_CHECK_LIST_LIMIT)
        .await?;
    Ok(Json(checks))
}
