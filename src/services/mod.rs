//! Service layer for the harvester.
//!
//! This module contains the reconciliation logic for:
//! - Page structure extraction (`PageParser`)
//! - Author parsing and linking (`AuthorLinker`)
//! - Tag reconciliation (`TagReconciler`)
//! - The per-item fetch budget (`FetchBudget`)

pub mod authors;
pub mod budget;
pub mod pages;
pub mod tags;

pub use authors::{AuthorLinkStats, AuthorLinker, AuthorList, parse_authors};
pub use budget::{FULL_FETCH_THRESHOLD, FetchBudget, FetchDecision};
pub use pages::{ListingRows, PageParser};
pub use tags::{LinkOutcome, TagDiff, TagReconciler};
