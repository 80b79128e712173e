// src/lib.rs

//! Harvester Library
//!
//! Crawls a tag-indexed resource catalogue and reconciles items, tags and
//! authors into a SQLite graph.

pub mod browser;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
