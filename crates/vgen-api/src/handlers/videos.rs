//! Video generation handlers.
//!
//! Contains:
//! - Generation submit endpoint (synchronous: the response carries the
//!   terminal job state)
//! - Single-job polling endpoint
//! - Recent jobs list

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use vgen_models::{Job, JobId};

use crate::error::{ApiError, ApiResult};
use crate::services::generation::DEFAULT_LIST_LIMIT;
use crate::state::AppState;

// ============================================================================
// Types
// ============================================================================

/// Generation request body.
#[derive(Debug, Deserialize)]
pub struct GenerateVideoRequest {
    pub prompt: String,
    pub duration: Option<u32>,
}

/// Job representation returned to clients.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub prompt: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id.to_string(),
            prompt: job.prompt,
            status: job.status.as_str().to_string(),
            video_url: job.video_url,
            error_message: job.error_message,
            created_at: job.created_at,
        }
    }
}

/// List query params.
#[derive(Debug, Deserialize)]
pub struct ListVideosQuery {
    pub limit: Option<u32>,
}

// ============================================================================
// Constants
// ============================================================================

const MAX_LIST_LIMIT: u32 = 100;

// ============================================================================
// Handlers
// ============================================================================

/// Submit a prompt for video generation.
///
/// The response is held until the job reaches a terminal status, so the
/// returned record already carries the outcome; polling is also supported.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(request): Json<GenerateVideoRequest>,
) -> ApiResult<Json<JobResponse>> {
    info!(
        prompt_len = request.prompt.len(),
        duration = ?request.duration,
        "generate_video request"
    );

    let job = state
        .generator
        .create_and_generate(&request.prompt, request.duration)
        .await?;

    Ok(Json(job.into()))
}

/// Poll a single generation job.
pub async fn get_video_status(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    if !is_valid_job_id(&video_id) {
        return Err(ApiError::bad_request("Invalid video ID format"));
    }

    let job = state.generator.get_by_id(&JobId::from_string(video_id)).await?;
    Ok(Json(job.into()))
}

/// List recent generation jobs, newest first.
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListVideosQuery>,
) -> ApiResult<Json<Vec<JobResponse>>> {
    let limit = normalize_limit(query.limit);

    let jobs = state.generator.list_recent(Some(limit)).await?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

// ============================================================================
// Helpers
// ============================================================================

fn normalize_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => DEFAULT_LIST_LIMIT,
        Some(l) if l > MAX_LIST_LIMIT => MAX_LIST_LIMIT,
        Some(l) => l,
    }
}

/// Validate job ID format to prevent injection into store lookups.
///
/// Valid format: alphanumeric characters and hyphens only, 8-64 chars.
pub fn is_valid_job_id(id: &str) -> bool {
    if id.len() > 64 || id.len() < 8 {
        return false;
    }
    id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_limit() {
        assert_eq!(normalize_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(normalize_limit(Some(0)), DEFAULT_LIST_LIMIT);
        assert_eq!(normalize_limit(Some(5)), 5);
        assert_eq!(normalize_limit(Some(1000)), MAX_LIST_LIMIT);
    }

    #[test]
    fn test_is_valid_job_id() {
        assert!(is_valid_job_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_valid_job_id("short"));
        assert!(!is_valid_job_id("../../../etc/passwd"));
        assert!(!is_valid_job_id(""));
    }
}
