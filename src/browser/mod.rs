//! Page loading and element queries.
//!
//! The reconciliation core only needs four operations from a page source:
//! load a URL, query the loaded page with a CSS selector, and read an
//! element's text or one of its attributes. [`PageDriver`] captures that
//! contract; [`HttpDriver`] implements it over HTTP and [`FixtureDriver`]
//! over canned HTML.
//!
//! Pages are kept as source text and parsed per query, since `scraper::Html`
//! cannot be held across an `.await`.

mod fixture;
mod http;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::utils::normalize_whitespace;

pub use fixture::FixtureDriver;
pub use http::HttpDriver;

/// A stateful page source: one page is "current" at a time.
#[async_trait]
pub trait PageDriver: Send {
    /// Load `url`, replacing the current page.
    async fn load(&mut self, url: &str) -> Result<()>;

    /// All elements of the current page matching `selector`, in document order.
    fn query(&self, selector: &str) -> Result<Vec<Element>>;

    /// URL of the current page.
    fn current_url(&self) -> Option<&str>;
}

/// An element detached from its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    html: String,
    text: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    fn from_ref(element: ElementRef<'_>) -> Self {
        let text = normalize_whitespace(&element.text().collect::<String>());
        let attributes = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self {
            html: element.html(),
            text,
            attributes,
        }
    }

    /// Visible text with whitespace collapsed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Value of an attribute on this element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Descendants matching `selector`. The element itself is included when
    /// it matches.
    pub fn query(&self, selector: &str) -> Result<Vec<Element>> {
        let selector = parse_selector(selector)?;
        let fragment = Html::parse_fragment(&self.html);
        Ok(fragment.select(&selector).map(Element::from_ref).collect())
    }

    /// First match of `selector`, if any.
    pub fn query_first(&self, selector: &str) -> Result<Option<Element>> {
        Ok(self.query(selector)?.into_iter().next())
    }
}

/// A loaded page's URL and source.
#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    source: String,
}

impl LoadedPage {
    fn query(&self, selector: &str) -> Result<Vec<Element>> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.source);
        Ok(document.select(&selector).map(Element::from_ref).collect())
    }
}

fn query_loaded(page: Option<&LoadedPage>, selector: &str) -> Result<Vec<Element>> {
    page.ok_or_else(|| AppError::parse("page query", "no page has been loaded"))?
        .query(selector)
}

/// Parse a CSS selector, mapping failures into [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
