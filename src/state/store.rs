use crate::error::Result;
use crate::models::Opinion;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Persistence for submitted opinions
#[async_trait]
pub trait OpinionStore: Send + Sync {
    /// Save an opinion, replacing any opinion with the same id
    async fn save_opinion(&self, opinion: &Opinion) -> Result<()>;

    /// Get an opinion by id
    async fn get_opinion(&self, id: u64) -> Result<Option<Opinion>>;

    /// Load opinions for the given ids, preserving their order. Ids with no
    /// stored opinion are left out.
    async fn get_opinions(&self, ids: &[u64]) -> Result<Vec<Opinion>>;

    /// Every stored opinion, oldest first
    async fn all_opinions(&self) -> Result<Vec<Opinion>>;

    async fn count(&self) -> Result<u64>;
}

/// In-memory opinion store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    opinions: Arc<DashMap<u64, Opinion>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpinionStore for InMemoryStore {
    async fn save_opinion(&self, opinion: &Opinion) -> Result<()> {
        self.opinions.insert(opinion.id, opinion.clone());
        tracing::debug!(opinion_id = opinion.id, "Opinion saved");
        Ok(())
    }

    async fn get_opinion(&self, id: u64) -> Result<Option<Opinion>> {
        Ok(self.opinions.get(&id).map(|entry| entry.clone()))
    }

    async fn get_opinions(&self, ids: &[u64]) -> Result<Vec<Opinion>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.opinions.get(id).map(|entry| entry.clone()))
            .collect())
    }

    async fn all_opinions(&self) -> Result<Vec<Opinion>> {
        let mut opinions: Vec<Opinion> = self
            .opinions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        opinions.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(opinions)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.opinions.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OpinionType;
    use chrono::{Duration, Utc};

    const UA: &str = "Mozilla/5.0 (Windows; U; Windows NT 6.1; en-US; rv:1.9.2.3) \
                      Gecko/20100401 Firefox/3.6.3";

    fn opinion(id: u64, age_days: i64) -> Opinion {
        Opinion::new(id, OpinionType::Praise, "Works great", UA, "en-US")
            .unwrap()
            .with_created(Utc::now() - Duration::days(age_days))
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = InMemoryStore::new();
        store.save_opinion(&opinion(7, 0)).await.unwrap();

        let fetched = store.get_opinion(7).await.unwrap().unwrap();
        assert_eq!(fetched.id, 7);
        assert_eq!(fetched.os, "win");
        assert!(store.get_opinion(8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_opinions_preserves_order_and_skips_missing() {
        let store = InMemoryStore::new();
        for id in 1..=3 {
            store.save_opinion(&opinion(id, 0)).await.unwrap();
        }

        let ids: Vec<u64> = store
            .get_opinions(&[3, 99, 1, 2])
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_all_opinions_oldest_first() {
        let store = InMemoryStore::new();
        store.save_opinion(&opinion(1, 0)).await.unwrap();
        store.save_opinion(&opinion(2, 5)).await.unwrap();

        let all = store.all_opinions().await.unwrap();
        assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
