//! Durable storage for the item/tag/author graph.
//!
//! ## Tables
//!
//! ```text
//! items ──< item_tags >── tags
//!   └────< item_authors >── authors
//! ```
//!
//! Every write goes through [`upsert`] or its create-only sibling [`ensure`].
//! Callers group the writes of one unit of work in a transaction from
//! [`Store::begin`].

mod records;
pub mod schema;
pub mod store;
pub mod upsert;

pub use store::{Store, StoreCounts};
pub use upsert::{Existing, Record, UpsertOutcome, ensure, upsert};
