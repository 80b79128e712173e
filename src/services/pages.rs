// src/services/pages.rs

//! Structure extraction for listing and detail pages.
//!
//! A listing page yields its rows up to the first malformed one, which is
//! reported alongside them. A detail page yields every tag or an
//! [`AppError::Parse`], so stored links are never reconciled against half a
//! tag list.

use crate::browser::{Element, PageDriver};
use crate::error::{AppError, Result};
use crate::models::{DetailPage, ItemSummary, ObservedTag, SelectorConfig};
use crate::utils::url::{item_id_from_href, tag_key_from_href};

/// Rows read from one listing page.
#[derive(Debug, Default)]
pub struct ListingRows {
    /// Well-formed rows, in page order, before any malformed one
    pub rows: Vec<ItemSummary>,
    /// Why the first malformed row could not be read
    pub broken: Option<AppError>,
}

/// Reads listing and detail pages using the configured selectors.
#[derive(Debug, Clone, Copy)]
pub struct PageParser<'a> {
    selectors: &'a SelectorConfig,
    base_url: &'a str,
}

impl<'a> PageParser<'a> {
    pub fn new(selectors: &'a SelectorConfig, base_url: &'a str) -> Self {
        Self {
            selectors,
            base_url,
        }
    }

    /// Summaries of the rows on the current listing page, in page order.
    ///
    /// Reading stops at the first malformed row. A page without a results
    /// container fails as a whole.
    pub fn listing(&self, driver: &dyn PageDriver) -> Result<ListingRows> {
        let ctx = context("listing", driver);
        let container = first(driver.query(&self.selectors.results)?).ok_or_else(|| {
            AppError::parse(&ctx, format!("no '{}' container", self.selectors.results))
        })?;

        let mut listing = ListingRows::default();
        for (index, row) in container.query(&self.selectors.row)?.iter().enumerate() {
            match self.listing_row(row, &format!("{ctx}, row {}", index + 1)) {
                Ok(summary) => listing.rows.push(summary),
                Err(e) => {
                    listing.broken = Some(e);
                    break;
                }
            }
        }
        Ok(listing)
    }

    fn listing_row(&self, row: &Element, ctx: &str) -> Result<ItemSummary> {
        let title = row.query_first(&self.selectors.title)?.ok_or_else(|| {
            AppError::parse(ctx, format!("no '{}' element", self.selectors.title))
        })?;
        let link = title
            .query_first(&self.selectors.title_link)?
            .ok_or_else(|| {
                AppError::parse(ctx, format!("no '{}' link in title", self.selectors.title_link))
            })?;
        let href = link
            .attribute("href")
            .ok_or_else(|| AppError::parse(ctx, "title link has no href"))?;
        let item_id = item_id_from_href(self.base_url, href)
            .ok_or_else(|| AppError::parse(ctx, format!("no item id in '{href}'")))?;
        let details = row
            .query_first(&self.selectors.details)?
            .map(|el| el.text().to_string());

        Ok(ItemSummary {
            item_id,
            title: title.text().to_string(),
            details,
        })
    }

    /// Title and tags of the current detail page, tags in page order.
    pub fn detail(&self, driver: &dyn PageDriver) -> Result<DetailPage> {
        let ctx = context("detail page", driver);
        let container = first(driver.query(&self.selectors.tags)?).ok_or_else(|| {
            AppError::parse(&ctx, format!("no '{}' tag list", self.selectors.tags))
        })?;

        let mut tags = Vec::new();
        for entry in container.query(&self.selectors.tag_item)? {
            let link = entry.query_first(&self.selectors.tag_link)?.ok_or_else(|| {
                AppError::parse(
                    &ctx,
                    format!("tag '{}' has no '{}' link", entry.text(), self.selectors.tag_link),
                )
            })?;
            let key = link
                .attribute("href")
                .and_then(|href| tag_key_from_href(self.base_url, href))
                .ok_or_else(|| {
                    AppError::parse(
                        &ctx,
                        format!("tag '{}' has no key in its link", entry.text()),
                    )
                })?;
            tags.push(ObservedTag::keyed(key, entry.text()));
        }

        let title = first(driver.query(&self.selectors.detail_title)?)
            .map(|el| el.text().to_string())
            .filter(|title| !title.is_empty());

        Ok(DetailPage { title, tags })
    }
}

fn first(elements: Vec<Element>) -> Option<Element> {
    elements.into_iter().next()
}

fn context(kind: &str, driver: &dyn PageDriver) -> String {
    format!("{kind} {}", driver.current_url().unwrap_or("<none>"))
}
