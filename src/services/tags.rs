// src/services/tags.rs

//! Item-tag reconciliation.
//!
//! Unlike authors, tag links are kept in step with the latest detail page:
//! links the page no longer shows are deleted. Tags themselves are never
//! deleted here.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::{AppError, Result};
use crate::models::{ItemTagLink, ObservedTag, Tag};
use crate::storage::store::{
    delete_tag_link, find_tag_by_key, find_tag_by_label, tag_keys_for_item,
};
use crate::storage::{UpsertOutcome, ensure, upsert};

/// Result of linking one observed tag to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked { key: String },
    AlreadyLinked { key: String },
    /// A label-only tag that matches no stored tag; nothing was linked.
    NoSuchTag,
}

impl LinkOutcome {
    /// Key of the tag the item is now linked to.
    pub fn key(&self) -> Option<&str> {
        match self {
            LinkOutcome::Linked { key } | LinkOutcome::AlreadyLinked { key } => Some(key),
            LinkOutcome::NoSuchTag => None,
        }
    }
}

/// Link changes applied by one reconciliation, as tag keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub kept: Vec<String>,
}

impl TagDiff {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Writes item-tag links stamped with one run timestamp.
#[derive(Debug, Clone, Copy)]
pub struct TagReconciler {
    at: DateTime<Utc>,
}

impl TagReconciler {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// Link `item_id` to one observed tag.
    ///
    /// A keyed tag is upserted first, so its label follows the page. A
    /// label-only tag is resolved against stored tags by label, then by a key
    /// equal to the label.
    pub async fn link(
        &self,
        conn: &mut SqliteConnection,
        item_id: &str,
        observed: &ObservedTag,
    ) -> Result<LinkOutcome> {
        log::trace!("link_tag(tag: {:?}, item: {item_id})", observed);

        let tag = match &observed.key {
            Some(key) => {
                let mut tag = Tag::new(key.as_str(), observed.label.as_str());
                if upsert(conn, &mut tag, self.at).await? == UpsertOutcome::Created {
                    log::debug!("Added new tag: {key} ({})", observed.label);
                }
                tag
            }
            None => match resolve_label(conn, &observed.label).await? {
                Some(tag) => tag,
                None => {
                    log::debug!(
                        "No stored tag for label '{}', not linking {item_id}",
                        observed.label
                    );
                    return Ok(LinkOutcome::NoSuchTag);
                }
            },
        };

        let tag_id = tag
            .id
            .ok_or_else(|| AppError::validation(format!("tag '{}' has no id", tag.key)))?;
        let mut link = ItemTagLink::new(item_id, tag_id);
        let outcome = match ensure(conn, &mut link, self.at).await? {
            UpsertOutcome::Created => LinkOutcome::Linked { key: tag.key },
            _ => LinkOutcome::AlreadyLinked { key: tag.key },
        };
        Ok(outcome)
    }

    /// Make the item's persisted tag links equal the observed set.
    ///
    /// Callers run this inside one transaction so adds and removals land
    /// together.
    pub async fn reconcile(
        &self,
        conn: &mut SqliteConnection,
        item_id: &str,
        observed: &[ObservedTag],
    ) -> Result<TagDiff> {
        let persisted: BTreeSet<String> =
            tag_keys_for_item(conn, item_id).await?.into_iter().collect();

        let mut diff = TagDiff::default();
        let mut seen = BTreeSet::new();
        for tag in observed {
            let outcome = self.link(conn, item_id, tag).await?;
            let Some(key) = outcome.key() else { continue };
            if !seen.insert(key.to_string()) {
                continue;
            }
            match outcome {
                LinkOutcome::Linked { key } => diff.added.push(key),
                LinkOutcome::AlreadyLinked { key } => diff.kept.push(key),
                LinkOutcome::NoSuchTag => {}
            }
        }

        for key in persisted.difference(&seen) {
            if delete_tag_link(conn, item_id, key).await? {
                log::debug!("Unlinked tag {key} from {item_id}");
                diff.removed.push(key.clone());
            }
        }

        log::trace!(
            "reconcile({item_id}): +{} -{} ={}",
            diff.added.len(),
            diff.removed.len(),
            diff.kept.len()
        );
        Ok(diff)
    }
}

async fn resolve_label(conn: &mut SqliteConnection, label: &str) -> Result<Option<Tag>> {
    if let Some(tag) = find_tag_by_label(conn, label).await? {
        return Ok(Some(tag));
    }
    find_tag_by_key(conn, label).await
}
