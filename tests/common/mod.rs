//! Shared fixtures for the integration tests
//!
//! The fixture set mirrors a small production sample: 31 Firefox opinions
//! submitted from a Mac between 2010-05-22 and 2010-05-28.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use opinion_search::api::AppState;
use opinion_search::config::SiteConfig;
use opinion_search::models::{Opinion, OpinionType};
use opinion_search::search::{
    BackendFault, BackendHits, BackendQuery, IndexMaintenance, QueryClient, SearchBackend,
    SearchConfig, SearchConfigBuilder, TantivyBackend,
};
use opinion_search::state::{InMemoryStore, OpinionStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

pub const FIXTURE_COUNT: u64 = 31;
pub const BASE_URL: &str = "http://input.example.com";

/// Build fixture opinion `id` (1-based)
pub fn fixture_opinion(id: u64) -> Opinion {
    let i = id - 1;

    let opinion_type = match i {
        0..=16 => OpinionType::Praise,
        17..=27 => OpinionType::Issue,
        _ => OpinionType::Suggestion,
    };
    let version = match i {
        0..=10 => "3.6.3",
        11..=26 => "3.6.4",
        _ => "3.7a5",
    };
    let locale = match i {
        29 => "de",
        30 => "unknown",
        _ => "en-US",
    };
    let description = if i % 2 == 0 {
        format!("Firefox feedback entry {id}")
    } else {
        format!("Tabs and bookmarks entry {id}")
    };
    let user_agent = format!(
        "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10.6; en-US; rv:1.9.2.3) \
         Gecko/20100401 Firefox/{version}"
    );
    let created = Utc.with_ymd_and_hms(2010, 5, 22, 0, 0, 0).unwrap()
        + Duration::days((i / 5) as i64)
        + Duration::hours(((i % 5) * 3) as i64);

    let mut opinion = Opinion::new(id, opinion_type, description, user_agent, locale)
        .unwrap()
        .with_created(created);
    if i % 5 == 0 {
        opinion = opinion.with_url(format!("http://example.com/page/{id}"));
    }
    opinion
}

pub async fn fixture_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    for id in 1..=FIXTURE_COUNT {
        store.save_opinion(&fixture_opinion(id)).await.unwrap();
    }
    store
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn site() -> SiteConfig {
    SiteConfig {
        base_url: BASE_URL.to_string(),
        ..Default::default()
    }
}

/// A running Tantivy backend indexed with the fixture set
pub struct Harness {
    pub dir: TempDir,
    pub config: SearchConfig,
    pub store: Arc<InMemoryStore>,
    pub backend: Arc<TantivyBackend>,
    pub client: QueryClient,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = SearchConfigBuilder::new()
            .index_path(dir.path().to_path_buf())
            .writer_heap_size(15_000_000)
            .build();
        let store = fixture_store().await;
        let backend = Arc::new(TantivyBackend::new(config.clone()));
        backend.reindex(store.as_ref()).await.unwrap();
        backend.start().await.unwrap();

        let client = QueryClient::new(backend.clone(), store.clone(), config.clone());
        Self {
            dir,
            config,
            store,
            backend,
            client,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.client.clone(),
            self.backend.clone(),
            self.store.clone(),
            site(),
        )
    }

    /// App state whose queries go to `backend` instead of the index
    pub fn app_state_with(&self, backend: Arc<dyn SearchBackend>) -> AppState {
        let client = QueryClient::new(backend, self.store.clone(), self.config.clone());
        AppState::new(client, self.backend.clone(), self.store.clone(), site())
    }
}

/// Backend that counts calls, optionally stalls, and optionally fails every
/// one of them
#[derive(Default)]
pub struct CountingBackend {
    pub calls: AtomicUsize,
    pub fault: Option<BackendFault>,
    pub delay: Option<StdDuration>,
}

impl CountingBackend {
    pub fn failing(fault: BackendFault) -> Self {
        Self {
            fault: Some(fault),
            ..Default::default()
        }
    }

    pub fn slow(delay: StdDuration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for CountingBackend {
    async fn execute(&self, _query: &BackendQuery) -> Result<BackendHits, BackendFault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(BackendHits::default()),
        }
    }
}
