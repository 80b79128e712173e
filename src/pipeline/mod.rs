//! Pipeline entry points for harvester operations.
//!
//! - `reconcile_by_tag`: Crawl a tag's listing and reconcile every item on it
//! - `reconcile_by_item`: Reconcile one item from its detail page
//! - `remove_tag` / `remove_item`: Delete an entity and, by cascade, its links

pub mod context;
pub mod ops;
pub mod walker;

pub use context::RunContext;
pub use ops::{Operation, reconcile_by_item, reconcile_by_tag, remove_item, remove_tag, run};
pub use walker::{
    CrawlWalker, DetailOutcome, PageOutcome, TitleSource, WalkEnd, WalkReport, WalkState,
};
