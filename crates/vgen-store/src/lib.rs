//! Job persistence for the VGen backend.
//!
//! This crate provides:
//! - The `JobStore` and `StatusCheckStore` ports consumed by the API layer
//! - An in-memory backend for tests and credential-less demo deployments
//! - A Firestore REST backend with service account authentication,
//!   token caching and retry logic

pub mod client;
pub mod error;
pub mod jobs;
pub mod memory;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;

use async_trait::async_trait;

use vgen_models::{Job, JobId, StatusCheck, TerminalUpdate};

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{StoreError, StoreResult};
pub use jobs::FirestoreStore;
pub use memory::MemoryStore;
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

/// Persistence port for generation jobs.
///
/// Implementations are injected as `Arc<dyn JobStore>`; operations are
/// atomic at the single-record level and records are never deleted.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a newly created job.
    async fn create(&self, job: &Job) -> StoreResult<()>;

    /// Look up a job by id.
    async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Apply the single terminal update to a job record.
    async fn update_terminal(&self, id: &JobId, update: &TerminalUpdate) -> StoreResult<()>;

    /// List jobs ordered newest-first by creation time, at most `limit`.
    async fn list_recent(&self, limit: u32) -> StoreResult<Vec<Job>>;

    /// Connectivity probe for readiness checks.
    async fn check_connectivity(&self) -> StoreResult<()>;
}

/// Persistence port for client status check pings.
#[async_trait]
pub trait StatusCheckStore: Send + Sync {
    /// Record a status check ping.
    async fn create_status_check(&self, check: &StatusCheck) -> StoreResult<()>;

    /// List recorded pings, at most `limit`.
    async fn list_status_checks(&self, limit: u32) -> StoreResult<Vec<StatusCheck>>;
}
