//! Job lifecycle management for video generation.
//!
//! Owns the full life of a generation job: create the record, obtain a video
//! URL (external provider or demo fallback), apply the single terminal
//! update, and serve reads. Provider failures are absorbed into a successful
//! demo completion on purpose: availability over strict correctness.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use vgen_models::{Job, JobId, JobStatus};
use vgen_provider::VideoProvider;
use vgen_store::JobStore;

use crate::config::FallbackPolicy;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Default number of jobs returned by [`JobLifecycleManager::list_recent`].
pub const DEFAULT_LIST_LIMIT: u32 = 10;

/// How a completed job obtained its video URL, for metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionOutcome {
    /// The external provider rendered the clip
    Provider,
    /// No credential configured, demo clip substituted
    Demo,
    /// Provider failed or timed out, demo clip substituted
    Fallback,
}

impl CompletionOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            CompletionOutcome::Provider => "provider",
            CompletionOutcome::Demo => "demo",
            CompletionOutcome::Fallback => "fallback",
        }
    }
}

/// Manages the create → generate → terminal-update lifecycle of jobs.
///
/// All collaborators are passed in at construction; the manager holds no
/// ambient state. Concurrent calls are independent: each owns its own job
/// record exclusively.
pub struct JobLifecycleManager {
    store: Arc<dyn JobStore>,
    provider: Option<Arc<dyn VideoProvider>>,
    policy: FallbackPolicy,
}

impl JobLifecycleManager {
    /// Create a new manager.
    ///
    /// `provider: None` means no credential is configured and every job
    /// takes the demo path.
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Option<Arc<dyn VideoProvider>>,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            store,
            provider,
            policy,
        }
    }

    /// Create a job and drive it to a terminal status.
    ///
    /// Returns the job in its final state; callers never observe
    /// `processing` on the returned value. Exactly one creation write and at
    /// most one terminal-update write reach the store.
    pub async fn create_and_generate(
        &self,
        prompt: &str,
        duration: Option<u32>,
    ) -> ApiResult<Job> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ApiError::validation("prompt must not be empty"));
        }
        let duration = duration.unwrap_or(vgen_models::job::DEFAULT_DURATION_SECS);
        if duration == 0 {
            return Err(ApiError::validation(
                "duration must be a positive number of seconds",
            ));
        }

        let job = Job::new(prompt, duration);
        self.store.create(&job).await?;
        metrics::record_job_created();
        info!(job_id = %job.id, duration, "Created video generation job");

        let (terminal, outcome) = match &self.provider {
            None => {
                // Demo mode: simulate processing, then substitute the demo clip.
                tokio::time::sleep(self.policy.demo_delay).await;
                let note = "Demo mode - using sample video (FAL_KEY not provided)";
                (
                    job.complete_with_note(&self.policy.demo_video_url, note),
                    CompletionOutcome::Demo,
                )
            }
            Some(provider) => {
                self.generate_with_provider(provider.as_ref(), job, duration)
                    .await
            }
        };

        let update = terminal.terminal_update();
        let update_result = self.store.update_terminal(&terminal.id, &update).await;

        match update_result {
            Ok(()) => {
                metrics::record_job_completed(outcome.as_str());
                info!(
                    job_id = %terminal.id,
                    outcome = outcome.as_str(),
                    "Video generation job completed"
                );
                Ok(terminal)
            }
            Err(e) => {
                error!(job_id = %terminal.id, "Failed to persist terminal update: {}", e);
                // Best effort: the same store may be unreachable.
                let failed = Job {
                    status: JobStatus::Failed,
                    video_url: None,
                    error_message: Some(e.to_string()),
                    completed_at: Some(Utc::now()),
                    ..terminal
                };
                let _ = self
                    .store
                    .update_terminal(&failed.id, &failed.terminal_update())
                    .await;
                metrics::record_job_failed();
                Err(e.into())
            }
        }
    }

    /// Run the provider call under the configured timeout.
    ///
    /// Any provider-level failure (error, missing URL, timeout) is absorbed:
    /// the job still completes, with the demo clip and a diagnostic note.
    async fn generate_with_provider(
        &self,
        provider: &dyn VideoProvider,
        job: Job,
        duration: u32,
    ) -> (Job, CompletionOutcome) {
        let timeout = self.policy.provider_timeout;
        let result = tokio::time::timeout(timeout, provider.generate(&job.prompt, duration)).await;
        match result {
            Ok(Ok(video)) => (job.complete(video.video_url), CompletionOutcome::Provider),
            Ok(Err(e)) => {
                warn!(job_id = %job.id, "Provider error, using demo clip: {}", e);
                let note = format!("Provider error, using demo: {}", e);
                (
                    job.complete_with_note(&self.policy.demo_video_url, note),
                    CompletionOutcome::Fallback,
                )
            }
            Err(_) => {
                warn!(
                    job_id = %job.id,
                    timeout_secs = timeout.as_secs(),
                    "Provider call timed out, using demo clip"
                );
                let note = format!(
                    "Provider timed out after {}s, using demo",
                    timeout.as_secs()
                );
                (
                    job.complete_with_note(&self.policy.demo_video_url, note),
                    CompletionOutcome::Fallback,
                )
            }
        }
    }

    /// Look up a job by id.
    pub async fn get_by_id(&self, id: &JobId) -> ApiResult<Job> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Video generation job {} not found", id)))
    }

    /// List jobs newest-first. `limit` defaults to [`DEFAULT_LIST_LIMIT`].
    pub async fn list_recent(&self, limit: Option<u32>) -> ApiResult<Vec<Job>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        Ok(self.store.list_recent(limit).await?)
    }

    /// Provider timeout currently in effect (test and diagnostics helper).
    pub fn provider_timeout(&self) -> Duration {
        self.policy.provider_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use vgen_provider::{GeneratedVideo, ProviderError, ProviderResult};
    use vgen_store::{MemoryStore, StoreError, StoreResult};
    use vgen_models::{StatusCheck, TerminalUpdate};

    const TEST_DEMO_URL: &str =
        "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

    fn fast_policy() -> FallbackPolicy {
        FallbackPolicy {
            demo_video_url: TEST_DEMO_URL.to_string(),
            demo_delay: Duration::from_millis(1),
            provider_timeout: Duration::from_millis(100),
        }
    }

    fn demo_manager(store: Arc<MemoryStore>) -> JobLifecycleManager {
        JobLifecycleManager::new(store, None, fast_policy())
    }

    struct StaticProvider {
        url: &'static str,
    }

    #[async_trait]
    impl VideoProvider for StaticProvider {
        async fn generate(&self, _prompt: &str, _duration: u32) -> ProviderResult<GeneratedVideo> {
            Ok(GeneratedVideo {
                video_url: self.url.to_string(),
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl VideoProvider for FailingProvider {
        async fn generate(&self, _prompt: &str, _duration: u32) -> ProviderResult<GeneratedVideo> {
            Err(ProviderError::RequestFailed(
                "queue submit returned 500".to_string(),
            ))
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl VideoProvider for HangingProvider {
        async fn generate(&self, _prompt: &str, _duration: u32) -> ProviderResult<GeneratedVideo> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(ProviderError::Unavailable("unreachable".to_string()))
        }
    }

    /// Store whose terminal updates always fail; creates succeed.
    struct BrokenTerminalStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl JobStore for BrokenTerminalStore {
        async fn create(&self, job: &Job) -> StoreResult<()> {
            self.inner.create(job).await
        }

        async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<Job>> {
            self.inner.find_by_id(id).await
        }

        async fn update_terminal(&self, _id: &JobId, _update: &TerminalUpdate) -> StoreResult<()> {
            Err(StoreError::request_failed("store unreachable"))
        }

        async fn list_recent(&self, limit: u32) -> StoreResult<Vec<Job>> {
            self.inner.list_recent(limit).await
        }

        async fn check_connectivity(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_demo_mode_completes_with_demo_url() {
        let store = Arc::new(MemoryStore::new());
        let manager = demo_manager(Arc::clone(&store));

        let job = manager
            .create_and_generate("A beautiful sunset over the ocean", None)
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.video_url.as_deref(), Some(TEST_DEMO_URL));
        assert!(job.error_message.as_deref().unwrap().contains("Demo mode"));
        assert_eq!(job.duration, 5);

        // The stored record matches the returned one
        let stored = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.video_url, job.video_url);
    }

    #[tokio::test]
    async fn test_returned_job_is_never_processing() {
        let store = Arc::new(MemoryStore::new());
        let manager = demo_manager(Arc::clone(&store));

        for prompt in ["one", "two", "three"] {
            let job = manager.create_and_generate(prompt, Some(8)).await.unwrap();
            assert!(job.is_terminal());
        }
    }

    #[tokio::test]
    async fn test_provider_url_used_on_success() {
        let store = Arc::new(MemoryStore::new());
        let manager = JobLifecycleManager::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            Some(Arc::new(StaticProvider {
                url: "https://fal.media/generated.mp4",
            })),
            fast_policy(),
        );

        let job = manager.create_and_generate("a city at night", Some(10)).await.unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.video_url.as_deref(), Some("https://fal.media/generated.mp4"));
        assert!(job.error_message.is_none());
    }

    #[tokio::test]
    async fn test_provider_error_absorbed_into_fallback() {
        let store = Arc::new(MemoryStore::new());
        let manager = JobLifecycleManager::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            Some(Arc::new(FailingProvider)),
            fast_policy(),
        );

        let job = manager.create_and_generate("a city at night", None).await.unwrap();

        // Provider failure never becomes a failed job
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.video_url.as_deref(), Some(TEST_DEMO_URL));
        assert!(job
            .error_message
            .as_deref()
            .unwrap()
            .contains("queue submit returned 500"));
    }

    #[tokio::test]
    async fn test_provider_timeout_absorbed_into_fallback() {
        let store = Arc::new(MemoryStore::new());
        let manager = JobLifecycleManager::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            Some(Arc::new(HangingProvider)),
            fast_policy(),
        );

        let job = manager.create_and_generate("slow prompt", None).await.unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.video_url.as_deref(), Some(TEST_DEMO_URL));
        assert!(job.error_message.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_persisting() {
        let store = Arc::new(MemoryStore::new());
        let manager = demo_manager(Arc::clone(&store));

        let err = manager.create_and_generate("   ", None).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert_eq!(store.job_count().await, 0);
        assert!(manager.list_recent(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_duration_rejected() {
        let store = Arc::new(MemoryStore::new());
        let manager = demo_manager(Arc::clone(&store));

        let err = manager.create_and_generate("sunset", Some(0)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(store.job_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_by_id_unknown_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let manager = demo_manager(store);

        let err = manager.get_by_id(&JobId::from("never-issued")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_by_id_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let manager = demo_manager(store);

        let job = manager.create_and_generate("sunset", None).await.unwrap();
        let first = manager.get_by_id(&job.id).await.unwrap();
        let second = manager.get_by_id(&job.id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, second.status);
        assert_eq!(first.video_url, second.video_url);
        assert_eq!(first.completed_at, second.completed_at);
    }

    #[tokio::test]
    async fn test_list_recent_orders_and_limits() {
        let store = Arc::new(MemoryStore::new());
        let manager = demo_manager(store);

        for i in 0..4 {
            manager
                .create_and_generate(&format!("prompt {}", i), None)
                .await
                .unwrap();
        }

        let listed = manager.list_recent(Some(3)).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].prompt, "prompt 3");
        for pair in listed.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }

        // Default limit is applied when unspecified
        let all = manager.list_recent(None).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_persistence_failure_surfaces_and_marks_failed() {
        let store = Arc::new(BrokenTerminalStore {
            inner: MemoryStore::new(),
        });
        let manager = JobLifecycleManager::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            None,
            fast_policy(),
        );

        let err = manager.create_and_generate("sunset", None).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));

        // The record was created before the terminal update failed
        let listed = store.list_recent(10).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    // StatusCheck lives in the same store; exercise it through the port to
    // keep the trait object wiring honest.
    #[tokio::test]
    async fn test_status_check_store_port() {
        use vgen_store::StatusCheckStore;

        let store = Arc::new(MemoryStore::new());
        let checks: Arc<dyn StatusCheckStore> = store;
        checks
            .create_status_check(&StatusCheck::new("integration-probe"))
            .await
            .unwrap();
        assert_eq!(checks.list_status_checks(10).await.unwrap().len(), 1);
    }
}
