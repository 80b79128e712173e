//! Page driver backed by an HTTP client.

use async_trait::async_trait;
use reqwest::Client;

use crate::browser::{Element, LoadedPage, PageDriver, query_loaded};
use crate::error::Result;
use crate::models::CrawlerConfig;
use crate::utils::http;

/// Loads pages over HTTP with a bounded timeout.
pub struct HttpDriver {
    client: Client,
    page: Option<LoadedPage>,
}

impl HttpDriver {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::with_client(http::create_client(config)?))
    }

    /// Share an existing client (connection pool) between drivers.
    pub fn with_client(client: Client) -> Self {
        Self { client, page: None }
    }
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn load(&mut self, url: &str) -> Result<()> {
        // A failed load leaves no stale page behind.
        self.page = None;
        let source = http::fetch_text(&self.client, url).await?;
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
