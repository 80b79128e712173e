// src/pipeline/walker.rs

//! Paginated crawl of one tag's listing.
//!
//! ```text
//! FetchingPage{offset} --page parsed--> ProcessingResults{offset, rows}
//! ProcessingResults --full page-------> FetchingPage{offset + page_size}
//! ProcessingResults --short page------> Done(Exhausted)
//! ProcessingResults --malformed row---> Done(ParseFailed)
//! FetchingPage --load/parse failure---> Done(FetchFailed | ParseFailed)
//! ```
//!
//! Rows before a malformed row are still written.
//!
//! A full last page costs one extra fetch of an empty page, which then ends
//! the walk.

use crate::browser::PageDriver;
use crate::error::{AppError, Result};
use crate::models::{Item, ItemSummary, ObservedTag};
use crate::pipeline::context::RunContext;
use crate::services::{
    AuthorList, FetchBudget, FetchDecision, LinkOutcome, ListingRows, TagDiff, parse_authors,
};
use crate::storage::store::count_tag_links;
use crate::storage::upsert;
use crate::utils::url::{detail_url, listing_url};

/// Position of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkState {
    FetchingPage { offset: usize },
    ProcessingResults {
        offset: usize,
        rows: Vec<ItemSummary>,
        /// Set when the page broke off at a malformed row
        broken: Option<String>,
    },
    Done(WalkEnd),
}

/// Why a walk stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WalkEnd {
    /// A page came back short.
    #[default]
    Exhausted,
    FetchFailed(String),
    ParseFailed(String),
}

/// Result of loading and parsing one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Loaded(Vec<ItemSummary>),
    /// The rows before a malformed one, and why that row failed.
    Truncated {
        rows: Vec<ItemSummary>,
        message: String,
    },
    ParseFailure(String),
    FetchFailure(String),
}

/// Which title a detail reconcile stores for the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// Keep the stored title.
    Stored,
    /// Replace it with the detail page header, if there is one.
    DetailHeader,
}

/// Result of fully reconciling one item from its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Reconciled(TagDiff),
    ParseFailure(String),
    FetchFailure(String),
}

/// Summary of one tag walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub tag: String,
    pub pages: usize,
    pub items: usize,
    pub detail_fetches: usize,
    pub fallbacks: usize,
    pub item_failures: usize,
    pub end: WalkEnd,
}

impl WalkReport {
    /// Whether the walk ran to the end of the listing.
    pub fn is_complete(&self) -> bool {
        self.end == WalkEnd::Exhausted
    }
}

/// Walks one tag's listing, writing items, authors and tags as it goes.
pub struct CrawlWalker<'a> {
    ctx: &'a RunContext,
    tag: &'a str,
    force: bool,
    budget: FetchBudget,
}

impl<'a> CrawlWalker<'a> {
    pub fn new(ctx: &'a RunContext, tag: &'a str, force: bool) -> Self {
        Self {
            ctx,
            tag,
            force,
            budget: FetchBudget::default(),
        }
    }

    /// Run to completion. Only persistence failures are returned as errors;
    /// page and item failures end up in the report.
    pub async fn run(
        &self,
        listing: &mut dyn PageDriver,
        detail: &mut dyn PageDriver,
    ) -> Result<WalkReport> {
        let page_size = self.ctx.config.crawler.page_size;
        let mut report = WalkReport {
            tag: self.tag.to_string(),
            ..WalkReport::default()
        };

        let mut state = WalkState::FetchingPage { offset: 0 };
        loop {
            state = match state {
                WalkState::FetchingPage { offset } => {
                    match self.fetch_page(listing, offset).await? {
                        PageOutcome::Loaded(rows) => {
                            report.pages += 1;
                            log::info!(
                                "Found {} results for {} (offset {offset})",
                                rows.len(),
                                self.tag
                            );
                            WalkState::ProcessingResults {
                                offset,
                                rows,
                                broken: None,
                            }
                        }
                        PageOutcome::Truncated { rows, message } => {
                            report.pages += 1;
                            log::warn!(
                                "Read {} result(s) for {} (offset {offset}) before: {message}",
                                rows.len(),
                                self.tag
                            );
                            WalkState::ProcessingResults {
                                offset,
                                rows,
                                broken: Some(message),
                            }
                        }
                        PageOutcome::FetchFailure(message) => {
                            log::warn!("Stopping {}: {message}", self.tag);
                            WalkState::Done(WalkEnd::FetchFailed(message))
                        }
                        PageOutcome::ParseFailure(message) => {
                            log::warn!("Stopping {}: {message}", self.tag);
                            WalkState::Done(WalkEnd::ParseFailed(message))
                        }
                    }
                }
                WalkState::ProcessingResults {
                    offset,
                    rows,
                    broken,
                } => {
                    for (index, row) in rows.iter().enumerate() {
                        log::debug!(
                            "[{} {}/{}] {}",
                            self.tag,
                            index + 1,
                            rows.len(),
                            row.item_id
                        );
                        self.process_row(row, detail, &mut report).await?;
                    }
                    if let Some(message) = broken {
                        log::warn!("Stopping {}: {message}", self.tag);
                        WalkState::Done(WalkEnd::ParseFailed(message))
                    } else if rows.len() >= page_size {
                        WalkState::FetchingPage {
                            offset: offset + page_size,
                        }
                    } else {
                        WalkState::Done(WalkEnd::Exhausted)
                    }
                }
                WalkState::Done(end) => {
                    report.end = end;
                    break;
                }
            };
        }

        Ok(report)
    }

    async fn fetch_page(&self, listing: &mut dyn PageDriver, offset: usize) -> Result<PageOutcome> {
        let crawler = &self.ctx.config.crawler;
        let url = listing_url(&crawler.base_url, self.tag, crawler.page_size, offset);
        log::debug!("{url}");

        if let Err(e) = listing.load(&url).await {
            return transient(e).map(PageOutcome::FetchFailure);
        }
        match self.ctx.parser().listing(&*listing) {
            Ok(ListingRows { rows, broken: None }) => Ok(PageOutcome::Loaded(rows)),
            Ok(ListingRows {
                rows,
                broken: Some(e),
            }) => transient(e).map(|message| PageOutcome::Truncated { rows, message }),
            Err(e) => transient(e).map(PageOutcome::ParseFailure),
        }
    }

    async fn process_row(
        &self,
        row: &ItemSummary,
        detail: &mut dyn PageDriver,
        report: &mut WalkReport,
    ) -> Result<()> {
        let ctx = self.ctx;
        let item_id = row.item_id.as_str();

        let mut tx = ctx.store.begin().await?;
        let mut item = Item::new(item_id, Some(row.title.clone()));
        upsert(&mut *tx, &mut item, ctx.run_at).await?;

        let authors = row
            .details
            .as_deref()
            .map(|details| parse_authors(details, &ctx.config.selectors.author_delimiter))
            .unwrap_or(AuthorList::NotFound);
        match authors {
            AuthorList::Found(names) => {
                log::debug!("Found {} author(s) for {item_id}", names.len());
                ctx.authors().link(&mut *tx, item_id, &names).await?;
            }
            AuthorList::NotFound => log::debug!("Found 0 authors for {item_id}"),
        }

        let links = count_tag_links(&mut *tx, item_id).await?;
        tx.commit().await?;
        report.items += 1;

        match self.budget.decide(links, self.force) {
            FetchDecision::FullReconcile => {
                report.detail_fetches += 1;
                match reconcile_detail(ctx, detail, item_id, TitleSource::Stored).await? {
                    DetailOutcome::Reconciled(diff) => log::debug!(
                        "Reconciled {item_id}: +{} -{}",
                        diff.added.len(),
                        diff.removed.len()
                    ),
                    DetailOutcome::FetchFailure(message) | DetailOutcome::ParseFailure(message) => {
                        report.item_failures += 1;
                        log::warn!("Skipping tags of {item_id}: {message}");
                    }
                }
            }
            FetchDecision::Fallback => {
                report.fallbacks += 1;
                let mut tx = ctx.store.begin().await?;
                let outcome = ctx
                    .tags()
                    .link(&mut *tx, item_id, &ObservedTag::label_only(self.tag))
                    .await?;
                tx.commit().await?;
                if outcome == LinkOutcome::NoSuchTag {
                    log::debug!("No stored tag '{}' to link {item_id} to", self.tag);
                }
                log::debug!("Skipping detail page of {item_id} for now");
            }
        }
        Ok(())
    }
}

/// Load an item's detail page and make its stored tags match it.
///
/// The page is parsed completely before anything is written, so a parse
/// failure leaves the stored links as they were.
pub async fn reconcile_detail(
    ctx: &RunContext,
    detail: &mut dyn PageDriver,
    item_id: &str,
    title: TitleSource,
) -> Result<DetailOutcome> {
    let url = detail_url(&ctx.config.crawler.base_url, item_id);
    if let Err(e) = detail.load(&url).await {
        return transient(e).map(DetailOutcome::FetchFailure);
    }
    let page = match ctx.parser().detail(&*detail) {
        Ok(page) => page,
        Err(e) => return transient(e).map(DetailOutcome::ParseFailure),
    };
    log::debug!("Found {} tag(s) for {item_id}", page.tags.len());

    let title = match title {
        TitleSource::Stored => None,
        TitleSource::DetailHeader => page.title,
    };

    let mut tx = ctx.store.begin().await?;
    upsert(&mut *tx, &mut Item::new(item_id, title), ctx.run_at).await?;
    let diff = ctx.tags().reconcile(&mut *tx, item_id, &page.tags).await?;
    tx.commit().await?;

    for key in &diff.removed {
        log::info!("Tag {key} has been removed from {item_id}");
    }
    Ok(DetailOutcome::Reconciled(diff))
}

/// Message of a unit-level failure, or the error itself if it is fatal.
fn transient(e: AppError) -> Result<String> {
    if e.is_transient() {
        Ok(e.to_string())
    } else {
        Err(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::FixtureDriver;
    use crate::models::Config;
    use crate::storage::Store;
    use crate::storage::store::{author_names_for_item, find_item, tag_keys_for_item};

    const BASE: &str = "https://nanohub.org";
    const TAG: &str = "graphene";

    async fn context(page_size: usize) -> RunContext {
        let mut config = Config::default();
        config.crawler.page_size = page_size;
        RunContext::new(Store::in_memory().await.unwrap(), config)
    }

    fn listing_page(ids: &[&str]) -> String {
        let rows: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<li><p class="title"><a href="/resources/{id}">Item {id}</a></p>
                       <p class="details">Tools | 2021 | Contributor(s):: Author {id}</p></li>"#
                )
            })
            .collect();
        format!(r#"<ol class="results">{rows}</ol>"#)
    }

    fn detail_page(keys: &[&str]) -> String {
        let tags: String = keys
            .iter()
            .map(|key| format!(r#"<li><a class="tag" href="/tags/{key}">{key}</a></li>"#))
            .collect();
        format!(r#"<div id="content-header"><h2>Detail</h2></div><ol class="tags">{tags}</ol>"#)
    }

    fn listing(pages: &[(usize, String)], page_size: usize) -> FixtureDriver {
        let mut driver = FixtureDriver::new();
        for (offset, html) in pages {
            driver.insert(listing_url(BASE, TAG, page_size, *offset), html.clone());
        }
        driver
    }

    #[tokio::test]
    async fn test_full_page_then_empty_page_terminates() {
        let ctx = context(2).await;
        let mut listing = listing(
            &[(0, listing_page(&["1", "2"])), (2, listing_page(&[]))],
            2,
        );
        let mut detail = FixtureDriver::new();

        let report = CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        assert_eq!(report.end, WalkEnd::Exhausted);
        assert_eq!(report.pages, 2);
        assert_eq!(report.items, 2);
        assert_eq!(listing.loads().len(), 2);
    }

    #[tokio::test]
    async fn test_short_page_terminates_immediately() {
        let ctx = context(2).await;
        let mut listing = listing(&[(0, listing_page(&["1"]))], 2);
        let mut detail = FixtureDriver::new();

        let report = CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.pages, 1);
        assert_eq!(listing.loads().len(), 1);
    }

    #[tokio::test]
    async fn test_rows_write_items_and_authors() {
        let ctx = context(10).await;
        let mut listing = listing(&[(0, listing_page(&["7"]))], 10);
        let mut detail = FixtureDriver::new();

        CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        let mut conn = ctx.store.acquire().await.unwrap();
        let item = find_item(&mut conn, "7").await.unwrap().unwrap();
        assert_eq!(item.title.as_deref(), Some("Item 7"));
        assert_eq!(
            author_names_for_item(&mut conn, "7").await.unwrap(),
            vec!["Author 7"]
        );
    }

    #[tokio::test]
    async fn test_listing_parse_failure_keeps_earlier_pages() {
        let ctx = context(2).await;
        let mut listing = listing(
            &[(0, listing_page(&["1", "2"])), (2, "<p>Server error</p>".to_string())],
            2,
        );
        let mut detail = FixtureDriver::new();

        let report = CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        assert!(matches!(report.end, WalkEnd::ParseFailed(_)));
        assert_eq!(report.items, 2);
        assert_eq!(ctx.store.counts().await.unwrap().items, 2);
    }

    #[tokio::test]
    async fn test_malformed_row_keeps_rows_before_it() {
        let ctx = context(3).await;
        let page = listing_page(&["1", "2"]).replace(
            "</ol>",
            r#"<li><p class="title">Withdrawn</p></li></ol>"#,
        );
        let mut listing = listing(&[(0, page), (3, listing_page(&["4"]))], 3);
        let mut detail = FixtureDriver::new();

        let report = CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        match &report.end {
            WalkEnd::ParseFailed(message) => assert!(message.contains("row 3")),
            end => panic!("unexpected end: {end:?}"),
        }
        assert_eq!(report.pages, 1);
        assert_eq!(report.items, 2);
        assert_eq!(listing.loads().len(), 1);

        let counts = ctx.store.counts().await.unwrap();
        assert_eq!(counts.items, 2);
        assert_eq!(counts.item_authors, 2);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_row_and_aborts() {
        let ctx = context(10).await;
        let mut conn = ctx.store.acquire().await.unwrap();
        sqlx::query(
            "CREATE TRIGGER fail_author_links BEFORE INSERT ON item_authors
             BEGIN SELECT RAISE(ABORT, 'disk full'); END",
        )
        .execute(&mut *conn)
        .await
        .unwrap();
        drop(conn);

        let mut listing = listing(&[(0, listing_page(&["1", "2"]))], 10);
        let mut detail = FixtureDriver::new();
        let err = CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        let counts = ctx.store.counts().await.unwrap();
        assert_eq!(counts.items, 0);
        assert_eq!(counts.authors, 0);
        assert_eq!(counts.item_authors, 0);
    }

    #[tokio::test]
    async fn test_listing_fetch_failure_ends_walk() {
        let ctx = context(2).await;
        let mut listing = listing(&[(0, listing_page(&["1", "2"]))], 2);
        let mut detail = FixtureDriver::new();

        let report = CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        assert!(matches!(report.end, WalkEnd::FetchFailed(_)));
        assert!(!report.is_complete());
        assert_eq!(report.items, 2);
    }

    #[tokio::test]
    async fn test_force_reconciles_every_item() {
        let ctx = context(10).await;
        let mut listing = listing(&[(0, listing_page(&["1"]))], 10);
        let mut detail = FixtureDriver::new()
            .with_page(detail_url(BASE, "1"), detail_page(&["graphene", "nems"]));

        let report = CrawlWalker::new(&ctx, TAG, true)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        assert_eq!(report.detail_fetches, 1);
        assert_eq!(report.fallbacks, 0);
        let mut conn = ctx.store.acquire().await.unwrap();
        assert_eq!(
            tag_keys_for_item(&mut conn, "1").await.unwrap(),
            vec!["graphene", "nems"]
        );
        // The listing title survives the detail reconcile.
        let item = find_item(&mut conn, "1").await.unwrap().unwrap();
        assert_eq!(item.title.as_deref(), Some("Item 1"));
    }

    #[tokio::test]
    async fn test_sparse_item_gets_fallback_link() {
        let ctx = context(10).await;
        let mut seed_detail = FixtureDriver::new()
            .with_page(detail_url(BASE, "1"), detail_page(&["graphene"]));
        reconcile_detail(&ctx, &mut seed_detail, "1", TitleSource::DetailHeader)
            .await
            .unwrap();

        let mut listing = listing(&[(0, listing_page(&["2"]))], 10);
        let mut detail = FixtureDriver::new();
        let report = CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.detail_fetches, 0);
        assert!(detail.loads().is_empty());
        let mut conn = ctx.store.acquire().await.unwrap();
        assert_eq!(tag_keys_for_item(&mut conn, "2").await.unwrap(), vec!["graphene"]);
    }

    #[tokio::test]
    async fn test_well_tagged_item_gets_detail_fetch() {
        let ctx = context(10).await;
        let mut seed = FixtureDriver::new()
            .with_page(detail_url(BASE, "1"), detail_page(&["a", "b"]));
        reconcile_detail(&ctx, &mut seed, "1", TitleSource::DetailHeader)
            .await
            .unwrap();

        let mut listing = listing(&[(0, listing_page(&["1"]))], 10);
        let mut detail = FixtureDriver::new()
            .with_page(detail_url(BASE, "1"), detail_page(&["b", "c"]));
        let report = CrawlWalker::new(&ctx, TAG, false)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        assert_eq!(report.detail_fetches, 1);
        let mut conn = ctx.store.acquire().await.unwrap();
        assert_eq!(tag_keys_for_item(&mut conn, "1").await.unwrap(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_detail_parse_failure_leaves_links_untouched() {
        let ctx = context(10).await;
        let mut seed = FixtureDriver::new()
            .with_page(detail_url(BASE, "1"), detail_page(&["a", "b"]));
        reconcile_detail(&ctx, &mut seed, "1", TitleSource::DetailHeader)
            .await
            .unwrap();

        let mut listing = listing(&[(0, listing_page(&["1", "2"]))], 10);
        let mut detail = FixtureDriver::new()
            .with_page(detail_url(BASE, "1"), "<h2>Maintenance</h2>")
            .with_page(detail_url(BASE, "2"), detail_page(&["z"]));
        let report = CrawlWalker::new(&ctx, TAG, true)
            .run(&mut listing, &mut detail)
            .await
            .unwrap();

        assert_eq!(report.item_failures, 1);
        assert!(report.is_complete());
        let mut conn = ctx.store.acquire().await.unwrap();
        assert_eq!(tag_keys_for_item(&mut conn, "1").await.unwrap(), vec!["a", "b"]);
        assert_eq!(tag_keys_for_item(&mut conn, "2").await.unwrap(), vec!["z"]);
    }

    #[tokio::test]
    async fn test_reconcile_detail_fetch_failure() {
        let ctx = context(10).await;
        let mut detail = FixtureDriver::new();
        let outcome = reconcile_detail(&ctx, &mut detail, "404", TitleSource::DetailHeader)
            .await
            .unwrap();
        assert!(matches!(outcome, DetailOutcome::FetchFailure(_)));
        assert_eq!(ctx.store.counts().await.unwrap().items, 0);
    }
}
