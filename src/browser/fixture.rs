//! Page driver serving canned HTML, for offline runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::browser::{Element, LoadedPage, PageDriver, query_loaded};
use crate::error::{AppError, Result};

/// Serves pages from an in-memory URL → HTML map and records every load.
#[derive(Debug, Clone, Default)]
pub struct FixtureDriver {
    pages: HashMap<String, String>,
    page: Option<LoadedPage>,
    loads: Vec<String>,
}

impl FixtureDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the HTML served for `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(url.into(), html.into());
    }

    /// Every URL passed to `load`, in order, including failed ones.
    pub fn loads(&self) -> &[String] {
        &self.loads
    }
}

#[async_trait]
impl PageDriver for FixtureDriver {
    async fn load(&mut self, url: &str) -> Result<()> {
        self.loads.push(url.to_string());
        self.page = None;
        let source = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::fetch(url, "no fixture registered"))?;
        self.page = Some(LoadedPage {
            url: url.to_string(),
            source,
        });
        Ok(())
    }

    fn query(&self, selector: &str) -> Result<Vec<Element>> {
        query_loaded(self.page.as_ref(), selector)
    }

    fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|page| page.url.as_str())
    }
}
