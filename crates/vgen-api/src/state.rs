//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use vgen_provider::{FalClient, FalConfig, VideoProvider};
use vgen_store::{FirestoreConfig, FirestoreStore, JobStore, MemoryStore, StatusCheckStore};

use crate::config::{ApiConfig, FallbackPolicy};
use crate::services::JobLifecycleManager;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn JobStore>,
    pub status_checks: Arc<dyn StatusCheckStore>,
    pub generator: Arc<JobLifecycleManager>,
}

impl AppState {
    /// Create new application state from the environment.
    ///
    /// Backend selection is resolved once here: Firestore when project
    /// configuration is present, the in-memory store otherwise; likewise the
    /// provider is built only when its credential exists.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let (store, status_checks): (Arc<dyn JobStore>, Arc<dyn StatusCheckStore>) =
            if FirestoreConfig::is_configured() {
                info!("Using Firestore job store");
                let firestore = Arc::new(FirestoreStore::from_env().await?);
                let job: Arc<dyn JobStore> = firestore.clone();
                let checks: Arc<dyn StatusCheckStore> = firestore;
                (job, checks)
            } else {
                warn!("Firestore not configured, using in-memory job store");
                let memory = Arc::new(MemoryStore::new());
                let job: Arc<dyn JobStore> = memory.clone();
                let checks: Arc<dyn StatusCheckStore> = memory;
                (job, checks)
            };

        let provider: Option<Arc<dyn VideoProvider>> = match FalConfig::from_env() {
            Some(fal_config) => {
                info!(model = %fal_config.model, "fal.ai provider configured");
                Some(Arc::new(FalClient::new(fal_config)?))
            }
            None => {
                warn!("FAL_KEY not set, jobs will complete with the demo clip");
                None
            }
        };

        let generator = Arc::new(JobLifecycleManager::new(
            Arc::clone(&store),
            provider,
            FallbackPolicy::from_env(),
        ));

        Ok(Self {
            config,
            store,
            status_checks,
            generator,
        })
    }

    /// Assemble state from explicit components (used by tests).
    pub fn with_components(
        config: ApiConfig,
        store: Arc<dyn JobStore>,
        status_checks: Arc<dyn StatusCheckStore>,
        generator: Arc<JobLifecycleManager>,
    ) -> Self {
        Self {
            config,
            store,
            status_checks,
            generator,
        }
    }
}
