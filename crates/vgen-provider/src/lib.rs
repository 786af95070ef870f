//! External text-to-video provider client.
//!
//! This crate provides:
//! - The `VideoProvider` port consumed by the job lifecycle manager
//! - `FalClient`, a fal.ai queue API implementation (submit, poll, fetch)

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::{FalClient, FalConfig};
pub use error::{ProviderError, ProviderResult};
pub use types::GeneratedVideo;

/// Port for the third-party text-to-video generation service.
///
/// A single attempt per call: recovery from provider failures is the
/// caller's fallback policy, not a retry here.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Generate a video for the prompt, returning its URL.
    async fn generate(&self, prompt: &str, duration: u32) -> ProviderResult<GeneratedVideo>;
}
