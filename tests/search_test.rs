//! Query client and index maintenance against a real Tantivy catalog

mod common;

use common::{date, fixture_opinion, Harness, FIXTURE_COUNT};
use opinion_search::models::{OpinionType, Product};
use opinion_search::search::*;
use opinion_search::state::OpinionStore;

fn firefox() -> QueryFilterSet {
    QueryFilterSet::default().with_product(Product::Firefox)
}

async fn num_results(harness: &Harness, filters: QueryFilterSet) -> u64 {
    harness.client.query(&filters).await.unwrap().total
}

fn ids(results: &SearchResultSet) -> Vec<u64> {
    results.opinions.iter().map(|o| o.id).collect()
}

#[tokio::test]
async fn test_product_filter() {
    let harness = Harness::new().await;
    assert_eq!(num_results(&harness, firefox()).await, FIXTURE_COUNT);
    assert_eq!(
        num_results(&harness, QueryFilterSet::default().with_product(Product::Mobile)).await,
        0
    );
}

#[tokio::test]
async fn test_results_are_newest_first() {
    let harness = Harness::new().await;
    let results = harness.client.query(&firefox()).await.unwrap();

    assert_eq!(results.opinions.len(), 20);
    assert_eq!(ids(&results), (12..=31).rev().collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_term_keeps_chronological_order() {
    let harness = Harness::new().await;
    let results = harness.client.query(&QueryFilterSet::new("Firefox")).await.unwrap();

    assert_eq!(results.total, 16);
    let found = ids(&results);
    assert_eq!(&found[..3], &[31u64, 29, 27]);
    assert!(found.windows(2).all(|w| w[0] > w[1]));
}

#[tokio::test]
async fn test_terms_are_conjunctive() {
    let harness = Harness::new().await;
    assert_eq!(num_results(&harness, QueryFilterSet::new("tabs bookmarks")).await, 15);
    assert_eq!(num_results(&harness, QueryFilterSet::new("tabs firefox")).await, 0);
}

#[tokio::test]
async fn test_term_matches_url() {
    let harness = Harness::new().await;
    assert_eq!(num_results(&harness, QueryFilterSet::new("example")).await, 7);
}

#[tokio::test]
async fn test_url_token_matches_opinions_with_url() {
    let harness = Harness::new().await;
    assert_eq!(num_results(&harness, QueryFilterSet::new("url:*")).await, 7);
    assert_eq!(num_results(&harness, QueryFilterSet::new("url:* tabs")).await, 3);
    assert_eq!(
        num_results(
            &harness,
            QueryFilterSet::new("url:*")
                .with_product(Product::Firefox)
                .with_type(OpinionType::Issue)
        )
        .await,
        2
    );
}

#[tokio::test]
async fn test_version_filter() {
    let harness = Harness::new().await;
    assert_eq!(num_results(&harness, firefox().with_version("3.6.3")).await, 11);
    assert_eq!(num_results(&harness, firefox().with_version("3.6.4")).await, 16);
}

#[tokio::test]
async fn test_type_filter() {
    let harness = Harness::new().await;
    assert_eq!(num_results(&harness, firefox().with_type(OpinionType::Praise)).await, 17);
    assert_eq!(num_results(&harness, firefox().with_type(OpinionType::Issue)).await, 11);
    assert_eq!(num_results(&harness, firefox().with_type(OpinionType::Suggestion)).await, 3);
}

#[tokio::test]
async fn test_os_filter() {
    let harness = Harness::new().await;
    assert_eq!(num_results(&harness, firefox().with_os("mac")).await, 31);
    assert_eq!(num_results(&harness, firefox().with_os("palm")).await, 0);
}

#[tokio::test]
async fn test_locale_filter() {
    let harness = Harness::new().await;
    assert_eq!(num_results(&harness, firefox().with_locale("en-US")).await, 29);
    assert_eq!(num_results(&harness, firefox().with_locale("de")).await, 1);
    assert_eq!(num_results(&harness, firefox().with_locale("unknown")).await, 1);
}

#[tokio::test]
async fn test_date_filter() {
    let harness = Harness::new().await;
    let day = date(2010, 5, 27);
    assert_eq!(
        num_results(&harness, firefox().with_date_range(Some(day), Some(day))).await,
        5
    );
    assert_eq!(
        num_results(&harness, firefox().with_date_range(Some(date(2010, 5, 28)), None)).await,
        1
    );
}

#[tokio::test]
async fn test_flipped_date_range_is_empty() {
    let harness = Harness::new().await;
    let results = harness
        .client
        .query(&firefox().with_date_range(Some(date(2010, 9, 1)), Some(date(2010, 6, 1))))
        .await
        .unwrap();

    assert_eq!(results.total, 0);
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_syntax_characters_do_not_fault() {
    let harness = Harness::new().await;
    for term in ["^", "\"", "url:*", "(firefox", "firefox AND", "-", "~~~"] {
        let result = harness.client.query(&QueryFilterSet::new(term)).await;
        assert!(result.is_ok(), "term {term:?} failed: {:?}", result.err());
    }
    assert_eq!(num_results(&harness, QueryFilterSet::new("^")).await, 0);
    assert_eq!(num_results(&harness, QueryFilterSet::new("(firefox")).await, 16);
}

#[tokio::test]
async fn test_pages_are_disjoint() {
    let harness = Harness::new().await;
    let first = harness.client.query(&firefox()).await.unwrap();
    let second = harness.client.query(&firefox().with_page(2)).await.unwrap();

    assert_eq!(second.opinions.len(), 11);
    assert!(ids(&first).iter().all(|id| !ids(&second).contains(id)));
    assert_eq!(second.pager().num_pages, 2);
    assert!(!second.pager().has_next());
}

#[tokio::test]
async fn test_page_past_window_keeps_total() {
    let harness = Harness::new().await;
    let results = harness.client.query(&firefox().with_page(700)).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(results.total, FIXTURE_COUNT);
    assert_eq!(results.page, 700);
}

#[tokio::test]
async fn test_type_counts_and_sentiment() {
    let harness = Harness::new().await;
    let results = harness.client.query(&firefox()).await.unwrap();

    assert_eq!(results.count_for(OpinionType::Praise), 17);
    assert_eq!(results.count_for(OpinionType::Issue), 11);
    assert_eq!(results.count_for(OpinionType::Suggestion), 3);

    let sentiment = get_sentiment(&results.type_counts);
    assert_eq!(sentiment.sentiment, Mood::Happy);
    assert_eq!(sentiment.total, FIXTURE_COUNT);

    let issues = harness
        .client
        .query(&firefox().with_type(OpinionType::Issue))
        .await
        .unwrap();
    assert_eq!(get_sentiment(&issues.type_counts).sentiment, Mood::Sad);
}

#[tokio::test]
async fn test_stopped_backend_fails_queries() {
    let harness = Harness::new().await;

    harness.backend.stop().await.unwrap();
    harness.backend.stop().await.unwrap();
    let err = harness.client.query(&firefox()).await.unwrap_err();
    assert!(matches!(err, SearchError::Unavailable(_)));

    harness.backend.start().await.unwrap();
    harness.backend.start().await.unwrap();
    assert_eq!(num_results(&harness, firefox()).await, FIXTURE_COUNT);
}

#[tokio::test]
async fn test_reindex_picks_up_new_opinions() {
    let harness = Harness::new().await;

    let mut newcomer = fixture_opinion(1);
    newcomer.id = 32;
    newcomer.description = "Sidebar suggestion".to_string();
    harness.store.save_opinion(&newcomer).await.unwrap();

    assert_eq!(num_results(&harness, QueryFilterSet::new("sidebar")).await, 0);
    assert_eq!(harness.backend.reindex(harness.store.as_ref()).await.unwrap(), 32);
    assert_eq!(num_results(&harness, QueryFilterSet::new("sidebar")).await, 1);

    let stats = harness.backend.stats().await.unwrap();
    assert!(stats.running);
    assert_eq!(stats.total_documents, 32);
    assert!(stats.index_size_bytes > 0);
}

#[tokio::test]
async fn test_concurrent_reindexes_are_serialized() {
    let harness = Harness::new().await;
    let store = harness.store.as_ref();

    let (a, b) = tokio::join!(harness.backend.reindex(store), harness.backend.reindex(store));
    assert_eq!(a.unwrap(), 31);
    assert_eq!(b.unwrap(), 31);
    assert_eq!(num_results(&harness, firefox()).await, FIXTURE_COUNT);
}
