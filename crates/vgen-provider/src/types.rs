//! fal.ai queue API request/response types.

use serde::{Deserialize, Serialize};

/// A successfully generated video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    /// URL of the rendered clip
    pub video_url: String,
}

/// Queue submission payload.
#[derive(Debug, Serialize)]
pub struct SubmitRequest {
    pub prompt: String,
    pub duration: u32,
}

/// Queue submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub request_id: String,
    pub status_url: String,
    pub response_url: String,
}

/// Queue status response.
#[derive(Debug, Deserialize)]
pub struct QueueStatus {
    pub status: String,
}

impl QueueStatus {
    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.status.as_str(), "IN_QUEUE" | "IN_PROGRESS")
    }
}

/// Final generation result.
#[derive(Debug, Deserialize)]
pub struct GenerationResult {
    pub video: Option<VideoPayload>,
}

#[derive(Debug, Deserialize)]
pub struct VideoPayload {
    pub url: Option<String>,
}

impl GenerationResult {
    /// Extract the video URL, if the provider returned a usable one.
    pub fn video_url(self) -> Option<String> {
        self.video.and_then(|v| v.url).filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_status_classification() {
        let s: QueueStatus = serde_json::from_str(r#"{"status":"IN_QUEUE"}"#).unwrap();
        assert!(s.is_in_flight());
        assert!(!s.is_completed());

        let s: QueueStatus = serde_json::from_str(r#"{"status":"COMPLETED"}"#).unwrap();
        assert!(s.is_completed());
    }

    #[test]
    fn test_result_url_extraction() {
        let r: GenerationResult =
            serde_json::from_str(r#"{"video":{"url":"https://fal.media/x.mp4"}}"#).unwrap();
        assert_eq!(r.video_url().as_deref(), Some("https://fal.media/x.mp4"));

        let r: GenerationResult = serde_json::from_str(r#"{"video":null}"#).unwrap();
        assert!(r.video_url().is_none());

        let r: GenerationResult = serde_json::from_str(r#"{"video":{"url":""}}"#).unwrap();
        assert!(r.video_url().is_none());
    }
}
