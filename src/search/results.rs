//! Hydrated search results and paging

use crate::models::{Opinion, OpinionType};
use serde::{Deserialize, Serialize};

/// Number of matches of one opinion type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub opinion_type: OpinionType,
    pub count: u64,
}

impl TypeCount {
    pub fn new(opinion_type: OpinionType, count: u64) -> Self {
        Self {
            opinion_type,
            count,
        }
    }
}

/// Result of a query: one page of opinions plus counts over all matches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResultSet {
    /// Opinions on the requested page, newest first
    pub opinions: Vec<Opinion>,

    /// Total matches across all pages
    pub total: u64,

    pub page: usize,
    pub per_page: usize,

    /// Matches per opinion type across all pages
    pub type_counts: Vec<TypeCount>,
}

impl SearchResultSet {
    /// Empty result for a request that never reached the backend
    pub fn empty(page: usize, per_page: usize) -> Self {
        Self {
            opinions: Vec::new(),
            total: 0,
            page: page.max(1),
            per_page,
            type_counts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.opinions.is_empty()
    }

    pub fn pager(&self) -> Pager {
        Pager::new(self.page, self.per_page, self.total)
    }

    /// Count for one opinion type, zero if absent
    pub fn count_for(&self, opinion_type: OpinionType) -> u64 {
        self.type_counts
            .iter()
            .find(|c| c.opinion_type == opinion_type)
            .map_or(0, |c| c.count)
    }
}

/// Page navigation over a result total. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    pub page: usize,
    pub per_page: usize,
    pub total: u64,
    pub num_pages: usize,
}

impl Pager {
    pub fn new(page: usize, per_page: usize, total: u64) -> Self {
        let per_page = per_page.max(1);
        let total_items = usize::try_from(total).unwrap_or(usize::MAX);
        let num_pages = total_items.div_ceil(per_page);

        Self {
            page: page.max(1),
            per_page,
            total,
            num_pages,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn next_page(&self) -> Option<usize> {
        self.has_next().then(|| self.page + 1)
    }

    pub fn previous_page(&self) -> Option<usize> {
        self.has_previous().then(|| self.page - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_first_page() {
        let pager = Pager::new(1, 20, 31);
        assert_eq!(pager.num_pages, 2);
        assert_eq!(pager.offset(), 0);
        assert!(pager.has_next());
        assert!(!pager.has_previous());
        assert_eq!(pager.next_page(), Some(2));
    }

    #[test]
    fn test_pager_last_page() {
        let pager = Pager::new(2, 20, 31);
        assert_eq!(pager.offset(), 20);
        assert!(!pager.has_next());
        assert_eq!(pager.previous_page(), Some(1));
    }

    #[test]
    fn test_pager_out_of_range() {
        let pager = Pager::new(700, 20, 31);
        assert!(!pager.has_next());
        assert!(pager.has_previous());
        assert_eq!(pager.offset(), 13_980);

        let pager = Pager::new(0, 0, 0);
        assert_eq!(pager.page, 1);
        assert_eq!(pager.num_pages, 0);
        assert!(!pager.has_next());
    }

    #[test]
    fn test_pager_does_not_overflow() {
        let pager = Pager::new(usize::MAX, 20, 5);
        assert_eq!(pager.offset(), usize::MAX);
    }

    #[test]
    fn test_count_for() {
        let mut results = SearchResultSet::empty(1, 20);
        results.type_counts = vec![TypeCount::new(OpinionType::Issue, 4)];
        assert_eq!(results.count_for(OpinionType::Issue), 4);
        assert_eq!(results.count_for(OpinionType::Praise), 0);
    }
}
