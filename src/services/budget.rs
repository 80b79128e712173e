// src/services/budget.rs

//! Per-item fetch budget.
//!
//! A detail page costs one extra load per item. Items that already carry
//! enough tag links are worth fully reconciling; the rest get a cheap link to
//! the tag being crawled and catch up on later crawls.

/// Tag links at which an item earns a detail fetch.
pub const FULL_FETCH_THRESHOLD: i64 = 2;

/// What to do with one listing row's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    /// Load the detail page and reconcile the full tag set.
    FullReconcile,
    /// Link only the tag being crawled, by its label.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchBudget {
    threshold: i64,
}

impl Default for FetchBudget {
    fn default() -> Self {
        Self {
            threshold: FULL_FETCH_THRESHOLD,
        }
    }
}

impl FetchBudget {
    pub fn decide(&self, existing_tag_links: i64, force: bool) -> FetchDecision {
        if force || existing_tag_links >= self.threshold {
            FetchDecision::FullReconcile
        } else {
            FetchDecision::Fallback
        }
    }
}
