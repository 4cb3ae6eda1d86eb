//! Sentiment rollup over per-type counts, and feed titles

use crate::models::{OpinionType, Product};
use crate::search::results::TypeCount;
use serde::{Deserialize, Serialize};

/// Sentiment bucket an opinion type contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Positive,
    Negative,
    Neutral,
}

/// Fixed mapping from opinion type to sentiment bucket
const BUCKETS: [(OpinionType, Bucket); 3] = [
    (OpinionType::Praise, Bucket::Positive),
    (OpinionType::Issue, Bucket::Negative),
    (OpinionType::Suggestion, Bucket::Neutral),
];

fn bucket_for(opinion_type: OpinionType) -> Bucket {
    BUCKETS
        .iter()
        .find(|(t, _)| *t == opinion_type)
        .map_or(Bucket::Neutral, |(_, b)| *b)
}

/// Dominant mood of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Neutral,
}

impl From<Bucket> for Mood {
    fn from(bucket: Bucket) -> Self {
        match bucket {
            Bucket::Positive => Mood::Happy,
            Bucket::Negative => Mood::Sad,
            Bucket::Neutral => Mood::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
    pub total: u64,
    pub sentiment: Mood,
}

/// Roll per-type counts up into sentiment buckets.
///
/// The dominant mood is the unique largest bucket. Ties, including an
/// all-zero input, are neutral.
pub fn get_sentiment(counts: &[TypeCount]) -> SentimentSummary {
    let (mut positive, mut negative, mut neutral) = (0u64, 0u64, 0u64);

    for count in counts {
        let slot = match bucket_for(count.opinion_type) {
            Bucket::Positive => &mut positive,
            Bucket::Negative => &mut negative,
            Bucket::Neutral => &mut neutral,
        };
        *slot = slot.saturating_add(count.count);
    }

    let buckets = [
        (Bucket::Positive, positive),
        (Bucket::Negative, negative),
        (Bucket::Neutral, neutral),
    ];
    let max = buckets.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let leaders: Vec<Bucket> = buckets
        .iter()
        .filter(|(_, n)| *n == max)
        .map(|(b, _)| *b)
        .collect();

    let sentiment = match leaders.as_slice() {
        [only] if max > 0 => Mood::from(*only),
        _ => Mood::Neutral,
    };

    SentimentSummary {
        positive,
        negative,
        neutral,
        total: positive.saturating_add(negative).saturating_add(neutral),
        sentiment,
    }
}

/// Title for the opinion feed of a product, optionally scoped to a term
pub fn feed_title(product: Product, term: &str) -> String {
    let term = term.trim();
    if term.is_empty() {
        format!("{} Input", product.pretty_name())
    } else {
        format!("{} Input: '{}'", product.pretty_name(), term)
    }
}
