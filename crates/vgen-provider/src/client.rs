//! fal.ai queue API client.
//!
//! Text-to-video generation goes through the fal.ai queue: submit the
//! prompt, poll the status URL until the render completes, then fetch the
//! result payload.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::types::{GeneratedVideo, GenerationResult, QueueStatus, SubmitRequest, SubmitResponse};
use crate::VideoProvider;

/// Configuration for the fal.ai client.
#[derive(Debug, Clone)]
pub struct FalConfig {
    /// API key (the `FAL_KEY` credential)
    pub api_key: String,
    /// Model path, e.g. "fal-ai/hunyuan-video"
    pub model: String,
    /// Queue API base URL
    pub queue_base_url: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Overall deadline for a single generation
    pub generation_deadline: Duration,
}

impl FalConfig {
    /// Create config from environment variables.
    ///
    /// Returns `None` when `FAL_KEY` is unset: the caller treats the absent
    /// credential as an explicit no-provider configuration and takes the
    /// demo fallback path.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("FAL_KEY").ok().filter(|k| !k.is_empty())?;

        Some(Self {
            api_key,
            model: std::env::var("FAL_MODEL")
                .unwrap_or_else(|_| "fal-ai/hunyuan-video".to_string()),
            queue_base_url: std::env::var("FAL_QUEUE_URL")
                .unwrap_or_else(|_| "https://queue.fal.run".to_string()),
            request_timeout: Duration::from_secs(
                std::env::var("FAL_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            poll_interval: Duration::from_secs(
                std::env::var("FAL_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            generation_deadline: Duration::from_secs(
                std::env::var("FAL_GENERATION_DEADLINE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        })
    }
}

/// Client for the fal.ai queue API.
pub struct FalClient {
    http: Client,
    config: FalConfig,
}

impl FalClient {
    /// Create a new fal.ai client.
    pub fn new(config: FalConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("vgen-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    fn submit_url(&self) -> String {
        format!("{}/{}", self.config.queue_base_url, self.config.model)
    }

    /// POST the prompt into the generation queue.
    async fn submit(&self, prompt: &str, duration: u32) -> ProviderResult<SubmitResponse> {
        let url = self.submit_url();
        debug!("Submitting generation request to {}", url);

        let request = SubmitRequest {
            prompt: prompt.to_string(),
            duration,
        };

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Key {}", self.config.api_key))
            .json(&request)
            .send()
            .await?;

        Self::parse_response(response, "queue submit").await
    }

    /// Poll the queue until the request completes or the deadline passes.
    async fn await_completion(&self, status_url: &str) -> ProviderResult<()> {
        let deadline = Instant::now() + self.config.generation_deadline;

        loop {
            let response = self
                .http
                .get(status_url)
                .header("Authorization", format!("Key {}", self.config.api_key))
                .send()
                .await?;

            let status: QueueStatus = Self::parse_response(response, "queue status").await?;

            if status.is_completed() {
                return Ok(());
            }
            if !status.is_in_flight() {
                return Err(ProviderError::RequestFailed(format!(
                    "Generation ended in unexpected queue status {}",
                    status.status
                )));
            }
            if Instant::now() >= deadline {
                return Err(ProviderError::Timeout(
                    self.config.generation_deadline.as_secs(),
                ));
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Fetch the finished generation result.
    async fn fetch_result(&self, response_url: &str) -> ProviderResult<GenerationResult> {
        let response = self
            .http
            .get(response_url)
            .header("Authorization", format!("Key {}", self.config.api_key))
            .send()
            .await?;

        Self::parse_response(response, "queue result").await
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> ProviderResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "{} returned {}: {}",
                context, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", context, e)))
    }
}

#[async_trait]
impl VideoProvider for FalClient {
    async fn generate(&self, prompt: &str, duration: u32) -> ProviderResult<GeneratedVideo> {
        let submitted = self.submit(prompt, duration).await?;
        info!(
            request_id = %submitted.request_id,
            model = %self.config.model,
            "Generation request queued"
        );

        self.await_completion(&submitted.status_url).await?;

        let result = self.fetch_result(&submitted.response_url).await?;
        let video_url = result.video_url().ok_or(ProviderError::MissingVideoUrl)?;

        info!(request_id = %submitted.request_id, "Generation completed");
        Ok(GeneratedVideo { video_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> FalConfig {
        FalConfig {
            api_key: "test-key".to_string(),
            model: "fal-ai/hunyuan-video".to_string(),
            queue_base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            generation_deadline: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_submit_url_includes_model() {
        let client = FalClient::new(test_config("https://queue.fal.run")).unwrap();
        assert_eq!(
            client.submit_url(),
            "https://queue.fal.run/fal-ai/hunyuan-video"
        );
    }

    mod queue_flow {
        use super::*;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        async fn mock_queue(server: &MockServer, status_sequence: serde_json::Value) {
            let base = server.uri();
            Mock::given(method("POST"))
                .and(path("/fal-ai/hunyuan-video"))
                .and(header("Authorization", "Key test-key"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "request_id": "req-1",
                    "status_url": format!("{}/requests/req-1/status", base),
                    "response_url": format!("{}/requests/req-1", base),
                })))
                .mount(server)
                .await;

            Mock::given(method("GET"))
                .and(path("/requests/req-1/status"))
                .respond_with(ResponseTemplate::new(200).set_body_json(status_sequence))
                .mount(server)
                .await;
        }

        #[tokio::test]
        async fn test_generate_returns_video_url() {
            let server = MockServer::start().await;
            mock_queue(&server, serde_json::json!({"status": "COMPLETED"})).await;

            Mock::given(method("GET"))
                .and(path("/requests/req-1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "video": {"url": "https://fal.media/out.mp4"}
                })))
                .mount(&server)
                .await;

            let client = FalClient::new(test_config(&server.uri())).unwrap();
            let video = client.generate("a sunset", 5).await.unwrap();
            assert_eq!(video.video_url, "https://fal.media/out.mp4");
        }

        #[tokio::test]
        async fn test_generate_without_url_is_missing_video_url() {
            let server = MockServer::start().await;
            mock_queue(&server, serde_json::json!({"status": "COMPLETED"})).await;

            Mock::given(method("GET"))
                .and(path("/requests/req-1"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"video": null})),
                )
                .mount(&server)
                .await;

            let client = FalClient::new(test_config(&server.uri())).unwrap();
            let err = client.generate("a sunset", 5).await.unwrap_err();
            assert!(matches!(err, ProviderError::MissingVideoUrl));
        }

        #[tokio::test]
        async fn test_submit_failure_is_request_failed() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/fal-ai/hunyuan-video"))
                .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
                .mount(&server)
                .await;

            let client = FalClient::new(test_config(&server.uri())).unwrap();
            let err = client.generate("a sunset", 5).await.unwrap_err();
            assert!(matches!(err, ProviderError::RequestFailed(_)));
        }

        #[tokio::test]
        async fn test_unexpected_queue_status_is_request_failed() {
            let server = MockServer::start().await;
            mock_queue(&server, serde_json::json!({"status": "FAILED"})).await;

            let client = FalClient::new(test_config(&server.uri())).unwrap();
            let err = client.generate("a sunset", 5).await.unwrap_err();
            assert!(matches!(err, ProviderError::RequestFailed(_)));
        }
    }
}
