// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod entity;
mod page;

// Re-export all public types
pub use config::{Config, CrawlerConfig, DatabaseConfig, SelectorConfig};
pub use entity::{Author, Item, ItemAuthorLink, ItemTagLink, Tag};
pub use page::{DetailPage, ItemSummary, ObservedTag};
