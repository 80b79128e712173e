// src/pipeline/ops.rs

//! The four top-level operations.

use crate::browser::PageDriver;
use crate::error::{AppError, Result};
use crate::pipeline::context::RunContext;
use crate::pipeline::walker::{
    CrawlWalker, DetailOutcome, TitleSource, WalkReport, reconcile_detail,
};
use crate::services::TagDiff;
use crate::storage::store::{delete_item, delete_tags_by_label};

/// One requested operation and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Tags(Vec<String>),
    Items(Vec<String>),
    RemoveTags(Vec<String>),
    RemoveItems(Vec<String>),
}

impl Operation {
    /// Build the operation from the four mutually exclusive argument lists.
    ///
    /// Exactly one list must be given; anything else is rejected before any
    /// page is loaded or row written.
    pub fn from_flags(
        tags: Option<Vec<String>>,
        items: Option<Vec<String>>,
        remove_tags: Option<Vec<String>>,
        remove_items: Option<Vec<String>>,
    ) -> Result<Self> {
        match (tags, items, remove_tags, remove_items) {
            (Some(tags), None, None, None) => Ok(Self::Tags(tags)),
            (None, Some(items), None, None) => Ok(Self::Items(items)),
            (None, None, Some(labels), None) => Ok(Self::RemoveTags(labels)),
            (None, None, None, Some(items)) => Ok(Self::RemoveItems(items)),
            (None, None, None, None) => Err(AppError::invalid_operation(
                "one of --tag, --item, --remove-tag or --remove-item is required",
            )),
            _ => Err(AppError::invalid_operation(
                "--tag, --item, --remove-tag and --remove-item are mutually exclusive",
            )),
        }
    }
}

/// Crawl a tag's full listing.
pub async fn reconcile_by_tag(
    ctx: &RunContext,
    listing: &mut dyn PageDriver,
    detail: &mut dyn PageDriver,
    tag: &str,
    force: bool,
) -> Result<WalkReport> {
    let report = CrawlWalker::new(ctx, tag, force).run(listing, detail).await?;
    log::info!(
        "{}: {} item(s) over {} page(s), {} detail fetch(es), {} fallback(s), {} failure(s)",
        report.tag,
        report.items,
        report.pages,
        report.detail_fetches,
        report.fallbacks,
        report.item_failures
    );
    Ok(report)
}

/// Reconcile one item's tags from its detail page.
///
/// Returns `None` when the page could not be loaded or parsed; stored links
/// are untouched in that case.
pub async fn reconcile_by_item(
    ctx: &RunContext,
    detail: &mut dyn PageDriver,
    item_id: &str,
) -> Result<Option<TagDiff>> {
    match reconcile_detail(ctx, detail, item_id, TitleSource::DetailHeader).await? {
        DetailOutcome::Reconciled(diff) => {
            log::info!(
                "{item_id}: {} tag(s) added, {} removed, {} kept",
                diff.added.len(),
                diff.removed.len(),
                diff.kept.len()
            );
            Ok(Some(diff))
        }
        DetailOutcome::FetchFailure(message) | DetailOutcome::ParseFailure(message) => {
            log::warn!("Could not reconcile {item_id}: {message}");
            Ok(None)
        }
    }
}

/// Delete the tags with a display label. Their item links go with them.
pub async fn remove_tag(ctx: &RunContext, label: &str) -> Result<bool> {
    let mut tx = ctx.store.begin().await?;
    let deleted = delete_tags_by_label(&mut *tx, label).await?;
    tx.commit().await?;

    if deleted == 0 {
        log::warn!("No tag displayed as '{label}'");
    } else {
        log::info!("Removed tag '{label}'");
    }
    Ok(deleted > 0)
}

/// Delete an item. Its tag and author links go with it.
pub async fn remove_item(ctx: &RunContext, item_id: &str) -> Result<bool> {
    let mut tx = ctx.store.begin().await?;
    let deleted = delete_item(&mut *tx, item_id).await?;
    tx.commit().await?;

    if deleted {
        log::info!("Removed item {item_id}");
    } else {
        log::warn!("No item {item_id}");
    }
    Ok(deleted)
}

/// Run every argument of `operation` in order.
pub async fn run(
    ctx: &RunContext,
    operation: &Operation,
    listing: &mut dyn PageDriver,
    detail: &mut dyn PageDriver,
    force: bool,
) -> Result<()> {
    match operation {
        Operation::Tags(tags) => {
            for tag in tags {
                reconcile_by_tag(ctx, listing, detail, tag, force).await?;
            }
        }
        Operation::Items(items) => {
            log::info!("Reconciling {} item(s)", items.len());
            for item_id in items {
                reconcile_by_item(ctx, detail, item_id).await?;
            }
        }
        Operation::RemoveTags(labels) => {
            for label in labels {
                remove_tag(ctx, label).await?;
            }
        }
        Operation::RemoveItems(items) => {
            for item_id in items {
                remove_item(ctx, item_id).await?;
            }
        }
    }
    Ok(())
}
