//! Firestore-backed job store.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{info, warn};

use vgen_models::{Job, JobId, JobStatus, StatusCheck, TerminalUpdate};

use crate::client::FirestoreClient;
use crate::error::{StoreError, StoreResult};
use crate::retry::with_retry;
use crate::types::{
    CollectionSelector, Document, FieldReference, Order, StructuredQuery, ToFirestoreValue, Value,
};
use crate::{JobStore, StatusCheckStore};

const JOBS_COLLECTION: &str = "video_jobs";
const STATUS_CHECKS_COLLECTION: &str = "status_checks";

/// Firestore implementation of the store ports.
///
/// Jobs live in the `video_jobs` collection, status check pings in
/// `status_checks`, both keyed by their UUID id.
pub struct FirestoreStore {
    client: FirestoreClient,
}

impl FirestoreStore {
    /// Create a new store over an existing client.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create from environment variables.
    pub async fn from_env() -> StoreResult<Self> {
        Ok(Self::new(FirestoreClient::from_env().await?))
    }

    fn newest_first_query(collection: &str, order_field: &str, limit: u32) -> StructuredQuery {
        StructuredQuery {
            from: vec![CollectionSelector {
                collection_id: collection.to_string(),
                all_descendants: None,
            }],
            r#where: None,
            order_by: Some(vec![Order {
                field: FieldReference {
                    field_path: order_field.to_string(),
                },
                direction: "DESCENDING".to_string(),
            }]),
            limit: Some(limit.min(i32::MAX as u32) as i32),
        }
    }
}

#[async_trait]
impl JobStore for FirestoreStore {
    async fn create(&self, job: &Job) -> StoreResult<()> {
        let retry = self.client.retry_config().clone();
        with_retry(&retry, "create_job", || async {
            self.client
                .create_document(JOBS_COLLECTION, job.id.as_str(), job_to_fields(job))
                .await
                .map(|_| ())
        })
        .await?;
        info!("Created job record: {}", job.id);
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let retry = self.client.retry_config().clone();
        let doc = with_retry(&retry, "get_job", || async {
            self.client.get_document(JOBS_COLLECTION, id.as_str()).await
        })
        .await?;

        match doc {
            Some(d) => Ok(Some(document_to_job(&d)?)),
            None => Ok(None),
        }
    }

    async fn update_terminal(&self, id: &JobId, update: &TerminalUpdate) -> StoreResult<()> {
        let mut fields = HashMap::new();
        let mut mask = vec!["status".to_string(), "completed_at".to_string()];

        fields.insert(
            "status".to_string(),
            update.status.as_str().to_firestore_value(),
        );
        fields.insert(
            "completed_at".to_string(),
            update.completed_at.to_firestore_value(),
        );
        if let Some(ref url) = update.video_url {
            fields.insert("video_url".to_string(), url.to_firestore_value());
            mask.push("video_url".to_string());
        }
        if let Some(ref msg) = update.error_message {
            fields.insert("error_message".to_string(), msg.to_firestore_value());
            mask.push("error_message".to_string());
        }

        let retry = self.client.retry_config().clone();
        with_retry(&retry, "update_job_terminal", || async {
            self.client
                .update_document(
                    JOBS_COLLECTION,
                    id.as_str(),
                    fields.clone(),
                    Some(mask.clone()),
                )
                .await
                .map(|_| ())
        })
        .await
    }

    async fn list_recent(&self, limit: u32) -> StoreResult<Vec<Job>> {
        let retry = self.client.retry_config().clone();
        let docs = with_retry(&retry, "list_jobs", || async {
            self.client
                .run_query(Self::newest_first_query(JOBS_COLLECTION, "created_at", limit))
                .await
        })
        .await?;

        let mut jobs = Vec::with_capacity(docs.len());
        for doc in &docs {
            match document_to_job(doc) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    warn!(
                        doc_id = %doc.doc_id().unwrap_or("<unknown>"),
                        error = %e,
                        "Skipping unparseable job document"
                    );
                }
            }
        }
        Ok(jobs)
    }

    async fn check_connectivity(&self) -> StoreResult<()> {
        // NotFound means the database answered, which is all we need to know.
        self.client.get_document("_health", "_check").await.map(|_| ())
    }
}

#[async_trait]
impl StatusCheckStore for FirestoreStore {
    async fn create_status_check(&self, check: &StatusCheck) -> StoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("id".to_string(), check.id.to_firestore_value());
        fields.insert(
            "client_name".to_string(),
            check.client_name.to_firestore_value(),
        );
        fields.insert("timestamp".to_string(), check.timestamp.to_firestore_value());

        let retry = self.client.retry_config().clone();
        with_retry(&retry, "create_status_check", || async {
            self.client
                .create_document(STATUS_CHECKS_COLLECTION, &check.id, fields.clone())
                .await
                .map(|_| ())
        })
        .await
    }

    async fn list_status_checks(&self, limit: u32) -> StoreResult<Vec<StatusCheck>> {
        let retry = self.client.retry_config().clone();
        let docs = with_retry(&retry, "list_status_checks", || async {
            self.client
                .run_query(Self::newest_first_query(
                    STATUS_CHECKS_COLLECTION,
                    "timestamp",
                    limit,
                ))
                .await
        })
        .await?;

        let mut checks = Vec::with_capacity(docs.len());
        for doc in &docs {
            match document_to_status_check(doc) {
                Ok(check) => checks.push(check),
                Err(e) => {
                    warn!(
                        doc_id = %doc.doc_id().unwrap_or("<unknown>"),
                        error = %e,
                        "Skipping unparseable status check document"
                    );
                }
            }
        }
        Ok(checks)
    }
}

// ============================================================================
// Field conversions
// ============================================================================

fn job_to_fields(job: &Job) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), job.id.as_str().to_firestore_value());
    fields.insert("prompt".to_string(), job.prompt.to_firestore_value());
    fields.insert("duration".to_string(), job.duration.to_firestore_value());
    fields.insert(
        "status".to_string(),
        job.status.as_str().to_firestore_value(),
    );
    fields.insert("created_at".to_string(), job.created_at.to_firestore_value());
    if let Some(ref url) = job.video_url {
        fields.insert("video_url".to_string(), url.to_firestore_value());
    }
    if let Some(ref msg) = job.error_message {
        fields.insert("error_message".to_string(), msg.to_firestore_value());
    }
    if let Some(completed_at) = job.completed_at {
        fields.insert(
            "completed_at".to_string(),
            completed_at.to_firestore_value(),
        );
    }
    fields
}

fn document_to_job(doc: &Document) -> StoreResult<Job> {
    let id: String = doc
        .field("id")
        .or_else(|| doc.doc_id().map(|s| s.to_string()))
        .ok_or_else(|| StoreError::invalid_response("job document missing id"))?;

    let status_str: String = doc
        .field("status")
        .ok_or_else(|| StoreError::invalid_response(format!("job {} missing status", id)))?;
    let status = JobStatus::from_str_opt(&status_str).ok_or_else(|| {
        StoreError::invalid_response(format!("job {} has unknown status {}", id, status_str))
    })?;

    Ok(Job {
        id: JobId::from_string(id.clone()),
        prompt: doc
            .field("prompt")
            .ok_or_else(|| StoreError::invalid_response(format!("job {} missing prompt", id)))?,
        duration: doc.field("duration").unwrap_or(vgen_models::job::DEFAULT_DURATION_SECS),
        status,
        video_url: doc.field("video_url"),
        error_message: doc.field("error_message"),
        created_at: doc
            .field("created_at")
            .ok_or_else(|| StoreError::invalid_response(format!("job {} missing created_at", id)))?,
        completed_at: doc.field("completed_at"),
    })
}

fn document_to_status_check(doc: &Document) -> StoreResult<StatusCheck> {
    let id: String = doc
        .field("id")
        .or_else(|| doc.doc_id().map(|s| s.to_string()))
        .ok_or_else(|| StoreError::invalid_response("status check document missing id"))?;

    Ok(StatusCheck {
        id: id.clone(),
        client_name: doc.field("client_name").ok_or_else(|| {
            StoreError::invalid_response(format!("status check {} missing client_name", id))
        })?,
        timestamp: doc.field("timestamp").ok_or_else(|| {
            StoreError::invalid_response(format!("status check {} missing timestamp", id))
        })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_field_round_trip() {
        let job = Job::new("A sunset", 8).complete_with_note(
            "https://example.com/v.mp4",
            "Demo mode",
        );
        let doc = Document::new(job_to_fields(&job));

        let back = document_to_job(&doc).unwrap();
        assert_eq!(back.id, job.id);
        assert_eq!(back.prompt, "A sunset");
        assert_eq!(back.duration, 8);
        assert_eq!(back.status, JobStatus::Completed);
        assert_eq!(back.video_url, job.video_url);
        assert_eq!(back.error_message.as_deref(), Some("Demo mode"));
        assert_eq!(back.completed_at, job.completed_at);
    }

    #[test]
    fn test_processing_job_omits_terminal_fields() {
        let job = Job::new("A sunset", 5);
        let fields = job_to_fields(&job);
        assert!(!fields.contains_key("video_url"));
        assert!(!fields.contains_key("error_message"));
        assert!(!fields.contains_key("completed_at"));
    }

    #[test]
    fn test_document_missing_status_rejected() {
        let mut fields = HashMap::new();
        fields.insert("id".to_string(), "abc".to_firestore_value());
        fields.insert("prompt".to_string(), "x".to_firestore_value());
        let doc = Document::new(fields);
        assert!(matches!(
            document_to_job(&doc),
            Err(StoreError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_newest_first_query_shape() {
        let query = FirestoreStore::newest_first_query(JOBS_COLLECTION, "created_at", 10);
        assert_eq!(query.from[0].collection_id, "video_jobs");
        let order = query.order_by.as_ref().unwrap();
        assert_eq!(order[0].direction, "DESCENDING");
        assert_eq!(query.limit, Some(10));
    }
}
