use crate::error::{AppError, Result};
use crate::models::Opinion;
use crate::state::OpinionStore;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent opinion store using the Sled embedded database
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    opinions_tree: sled::Tree,
}

impl SledStore {
    /// Open (or create) a store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())
            .map_err(|e| AppError::Storage(format!("Failed to open Sled database: {}", e)))?;

        let opinions_tree = db
            .open_tree("opinions")
            .map_err(|e| AppError::Storage(format!("Failed to open opinions tree: {}", e)))?;

        tracing::info!(path = ?path.as_ref(), "Initialized Sled store");

        Ok(Self {
            db: Arc::new(db),
            opinions_tree,
        })
    }

    /// Big-endian keys keep the tree ordered by id
    fn opinion_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Opinion> {
        bincode::deserialize(bytes)
            .map_err(|e| AppError::Storage(format!("Failed to deserialize opinion: {}", e)))
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl OpinionStore for SledStore {
    async fn save_opinion(&self, opinion: &Opinion) -> Result<()> {
        let value = bincode::serialize(opinion)
            .map_err(|e| AppError::Storage(format!("Failed to serialize opinion: {}", e)))?;

        self.opinions_tree
            .insert(Self::opinion_key(opinion.id), value)
            .map_err(|e| AppError::Storage(format!("Failed to save opinion: {}", e)))?;

        tracing::debug!(opinion_id = opinion.id, "Opinion saved to Sled");
        Ok(())
    }

    async fn get_opinion(&self, id: u64) -> Result<Option<Opinion>> {
        self.opinions_tree
            .get(Self::opinion_key(id))
            .map_err(|e| AppError::Storage(format!("Failed to read opinion: {}", e)))?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    async fn get_opinions(&self, ids: &[u64]) -> Result<Vec<Opinion>> {
        let mut opinions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(opinion) = self.get_opinion(*id).await? {
                opinions.push(opinion);
            }
        }
        Ok(opinions)
    }

    async fn all_opinions(&self) -> Result<Vec<Opinion>> {
        let mut opinions = self
            .opinions_tree
            .iter()
            .map(|item| {
                let (_, bytes) =
                    item.map_err(|e| AppError::Storage(format!("Failed to iterate opinions: {}", e)))?;
                Self::decode(&bytes)
            })
            .collect::<Result<Vec<_>>>()?;

        opinions.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(opinions)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.opinions_tree.len() as u64)
    }
}
