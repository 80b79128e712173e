// src/pipeline/context.rs

use chrono::{DateTime, Utc};

use crate::models::Config;
use crate::services::{AuthorLinker, PageParser, TagReconciler};
use crate::storage::Store;

/// Everything one invocation shares: the persistence session, the run
/// timestamp stamped on every write, and the configuration.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub store: Store,
    pub run_at: DateTime<Utc>,
    pub config: Config,
}

impl RunContext {
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            store,
            run_at: Utc::now(),
            config,
        }
    }

    /// Pin the run timestamp.
    pub fn with_run_at(mut self, run_at: DateTime<Utc>) -> Self {
        self.run_at = run_at;
        self
    }

    pub fn parser(&self) -> PageParser<'_> {
        PageParser::new(&self.config.selectors, &self.config.crawler.base_url)
    }

    pub fn tags(&self) -> TagReconciler {
        TagReconciler::new(self.run_at)
    }

    pub fn authors(&self) -> AuthorLinker {
        AuthorLinker::new(self.run_at)
    }
}
