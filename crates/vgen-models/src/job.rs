//! Video generation job models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default clip duration in seconds when the caller does not specify one.
pub const DEFAULT_DURATION_SECS: u32 = 5;

/// Unique identifier for a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Generation job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Generation is in flight
    #[default]
    Processing,
    /// Generation finished and a video URL is available
    Completed,
    /// Generation failed with a server-side error
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Parse from the stored string form.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A text-to-video generation job.
///
/// Created once with status `processing`; mutated at most once more by the
/// terminal update that moves it to `completed` or `failed`. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Prompt text supplied by the caller
    pub prompt: String,

    /// Requested clip duration in seconds
    #[serde(default = "default_duration")]
    pub duration: u32,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Generated video URL (present once completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Diagnostic text. Set on failure, and also on completed jobs that
    /// took the fallback path (informational, not an error signal).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Timestamp of the terminal transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

impl Job {
    /// Create a new job in `processing` state.
    pub fn new(prompt: impl Into<String>, duration: u32) -> Self {
        Self {
            id: JobId::new(),
            prompt: prompt.into(),
            duration,
            status: JobStatus::Processing,
            video_url: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the job completed with a generated video URL.
    pub fn complete(mut self, video_url: impl Into<String>) -> Self {
        self.status = JobStatus::Completed;
        self.video_url = Some(video_url.into());
        self.completed_at = Some(Utc::now());
        self
    }

    /// Mark the job completed with a video URL and a diagnostic note.
    ///
    /// Used by the fallback path: the job still reads as completed, the note
    /// records why the demo clip was substituted.
    pub fn complete_with_note(
        mut self,
        video_url: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        self.status = JobStatus::Completed;
        self.video_url = Some(video_url.into());
        self.error_message = Some(note.into());
        self.completed_at = Some(Utc::now());
        self
    }

    /// Mark the job failed.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.into());
        self.completed_at = Some(Utc::now());
        self
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The terminal update corresponding to this job's current state.
    pub fn terminal_update(&self) -> TerminalUpdate {
        TerminalUpdate {
            status: self.status,
            video_url: self.video_url.clone(),
            error_message: self.error_message.clone(),
            completed_at: self.completed_at.unwrap_or_else(Utc::now),
        }
    }
}

/// The single terminal write applied to a job record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TerminalUpdate {
    /// Terminal status (`completed` or `failed`)
    pub status: JobStatus,
    /// Video URL, when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Diagnostic text, when failed or when the fallback path was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the terminal transition happened
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_generation() {
        let id1 = JobId::new();
        let id2 = JobId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_job_creation() {
        let job = Job::new("A beautiful sunset over the ocean", 5);
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.video_url.is_none());
        assert!(job.completed_at.is_none());
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_job_complete() {
        let job = Job::new("test", 5).complete("https://example.com/video.mp4");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.video_url.as_deref(), Some("https://example.com/video.mp4"));
        assert!(job.completed_at.is_some());
        assert!(job.error_message.is_none());
        assert!(job.is_terminal());
    }

    #[test]
    fn test_job_complete_with_note() {
        let job = Job::new("test", 5)
            .complete_with_note("https://example.com/demo.mp4", "Demo mode");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.error_message.as_deref(), Some("Demo mode"));
        assert!(job.is_terminal());
    }

    #[test]
    fn test_job_fail() {
        let job = Job::new("test", 5).fail("store unreachable");
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.video_url.is_none());
        assert_eq!(job.error_message.as_deref(), Some("store unreachable"));
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_status_serde_form() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert_eq!(JobStatus::from_str_opt("completed"), Some(JobStatus::Completed));
        assert_eq!(JobStatus::from_str_opt("bogus"), None);
    }

    #[test]
    fn test_terminal_update_mirrors_job() {
        let job = Job::new("test", 5).complete("https://example.com/v.mp4");
        let update = job.terminal_update();
        assert_eq!(update.status, JobStatus::Completed);
        assert_eq!(update.video_url, job.video_url);
        assert_eq!(update.completed_at, job.completed_at.unwrap());
    }
}
