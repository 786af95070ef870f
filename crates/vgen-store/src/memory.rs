//! In-memory store backend.
//!
//! Used by tests and by deployments that run without Firestore credentials
//! (demo mode). Jobs live in a map keyed by id; insertion order is kept so
//! `list_recent` can break `created_at` ties deterministically.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use vgen_models::{Job, JobId, StatusCheck, TerminalUpdate};

use crate::error::{StoreError, StoreResult};
use crate::{JobStore, StatusCheckStore};

#[derive(Default)]
struct MemoryInner {
    jobs: HashMap<String, Job>,
    insertion_order: Vec<JobId>,
    status_checks: Vec<StatusCheck>,
}

/// In-memory implementation of the store ports.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs (test helper).
    pub async fn job_count(&self) -> usize {
        self.inner.read().await.jobs.len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, job: &Job) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.jobs.contains_key(job.id.as_str()) {
            return Err(StoreError::AlreadyExists(job.id.to_string()));
        }
        inner.insertion_order.push(job.id.clone());
        inner.jobs.insert(job.id.as_str().to_string(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.get(id.as_str()).cloned())
    }

    async fn update_terminal(&self, id: &JobId, update: &TerminalUpdate) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(id.to_string()))?;

        job.status = update.status;
        job.video_url = update.video_url.clone();
        job.error_message = update.error_message.clone();
        job.completed_at = Some(update.completed_at);
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> StoreResult<Vec<Job>> {
        let inner = self.inner.read().await;

        // Walk insertion order newest-first, then stable-sort by created_at
        // so equal timestamps keep newest-inserted-first ordering.
        let mut jobs: Vec<Job> = inner
            .insertion_order
            .iter()
            .rev()
            .filter_map(|id| inner.jobs.get(id.as_str()).cloned())
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit as usize);
        Ok(jobs)
    }

    async fn check_connectivity(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl StatusCheckStore for MemoryStore {
    async fn create_status_check(&self, check: &StatusCheck) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.status_checks.push(check.clone());
        Ok(())
    }

    async fn list_status_checks(&self, limit: u32) -> StoreResult<Vec<StatusCheck>> {
        let inner = self.inner.read().await;
        Ok(inner.status_checks.iter().take(limit as usize).cloned().collect())
    }
}
