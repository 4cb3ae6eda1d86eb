use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AppError, Result};
use crate::models::{Opinion, OpinionType};
use crate::state::{InMemoryStore, OpinionStore, SledStore};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Create an opinion store based on configuration
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn OpinionStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(create_in_memory_store()),

        StoreBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration("Sled backend requires 'path' configuration".to_string())
            })?;

            tracing::info!(path = ?path, "Initializing Sled storage backend");

            let store = SledStore::new(path)?;
            Ok(Arc::new(store))
        }
    }
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<dyn OpinionStore> {
    tracing::info!("Initializing in-memory storage backend");
    Arc::new(InMemoryStore::new())
}

/// One record of an opinion fixture file. Product, version and OS are
/// derived from the user agent on load.
#[derive(Debug, Deserialize)]
pub struct FixtureOpinion {
    pub id: u64,
    #[serde(rename = "type")]
    pub opinion_type: OpinionType,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    pub user_agent: String,
    pub locale: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub device: String,
    pub created: DateTime<Utc>,
}

impl TryFrom<FixtureOpinion> for Opinion {
    type Error = AppError;

    fn try_from(record: FixtureOpinion) -> Result<Self> {
        Ok(Opinion::new(
            record.id,
            record.opinion_type,
            record.description,
            record.user_agent,
            record.locale,
        )?
        .with_url(record.url.unwrap_or_default())
        .with_device(record.manufacturer, record.device)
        .with_created(record.created))
    }
}

/// Load a JSON array of fixture opinions into the store. Returns the number
/// of opinions saved; records with an unsupported user agent are skipped.
pub async fn load_fixtures(store: &dyn OpinionStore, path: &Path) -> Result<usize> {
    let raw = tokio::fs::read_to_string(path).await?;
    let records: Vec<FixtureOpinion> = serde_json::from_str(&raw)?;

    let mut loaded = 0;
    for record in records {
        let id = record.id;
        match Opinion::try_from(record) {
            Ok(opinion) => {
                store.save_opinion(&opinion).await?;
                loaded += 1;
            }
            Err(e) => tracing::warn!(opinion_id = id, error = %e, "Skipping fixture opinion"),
        }
    }

    tracing::info!(path = ?path, loaded, "Loaded opinion fixtures");
    Ok(loaded)
}
