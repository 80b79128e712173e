//! Persisted entities: items, tags, authors and the links between them.

use chrono::{DateTime, Utc};

/// A catalogue record, identified by the id in its source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(id: impl Into<String>, title: Option<String>) -> Self {
        Self {
            id: id.into(),
            title,
            created_at: None,
            updated_at: None,
        }
    }
}

/// A tag with a unique canonical key and a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Assigned by the store on first insert
    pub id: Option<i64>,
    pub key: String,
    pub label: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Tag {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            label: label.into(),
            created_at: None,
        }
    }
}

/// An author, unique by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Assigned by the store on first insert
    pub id: Option<i64>,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Membership of an item in a tag's item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTagLink {
    pub item_id: String,
    pub tag_id: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl ItemTagLink {
    pub fn new(item_id: impl Into<String>, tag_id: i64) -> Self {
        Self {
            item_id: item_id.into(),
            tag_id,
            created_at: None,
        }
    }
}

/// Membership of an item in an author's item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAuthorLink {
    pub item_id: String,
    pub author_id: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl ItemAuthorLink {
    pub fn new(item_id: impl Into<String>, author_id: i64) -> Self {
        Self {
            item_id: item_id.into(),
            author_id,
            created_at: None,
        }
    }
}
