//! Application state.

use std::sync::Arc;

use tracing::info;

use rfp_firestore::{FirestoreClient, FirestoreStore, MemoryStore, Store};

use crate::auth::{JwksCache, TokenVerifier};
use crate::config::{ApiConfig, StoreBackend};
use crate::services::{ProfileService, ResponseService, RfpService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn Store>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub profiles: ProfileService,
    pub rfps: RfpService,
    pub responses: ResponseService,
}

impl AppState {
    /// Build production state: the configured store and Google-backed
    /// token verification.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = match config.store_backend {
            StoreBackend::Firestore => {
                let client = FirestoreClient::from_env().await?;
                info!(project_id = %client.project_id(), emulator = client.is_emulator(), "Using Firestore store");
                Arc::new(FirestoreStore::new(client))
            }
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        let verifier = Arc::new(JwksCache::from_env().await?);

        Ok(Self::with_parts(config, store, verifier))
    }

    /// Assemble state from already constructed parts.
    pub fn with_parts(config: ApiConfig, store: Arc<dyn Store>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            profiles: ProfileService::new(Arc::clone(&store)),
            rfps: RfpService::new(Arc::clone(&store)),
            responses: ResponseService::new(Arc::clone(&store)),
            config,
            store,
            verifier,
        }
    }
}
