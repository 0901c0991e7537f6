//! Scrape pipeline: fetch → translate → render
//!
//! `Exporter` is synchronous and holds no per-request state, so a single
//! instance is shared by every HTTP task (each scrape runs on the blocking
//! pool). The only shared mutable state is the transport's connection lock.

use tracing::{debug, error, warn};

use crate::core::{Category, MetricRecord, ScrapeError};
use crate::data::SnapshotFetcher;
use crate::monitoring::registry;
use crate::rcon::CommandTransport;
use crate::translate::Translator;

/// Outcome of `/metrics/all`
#[derive(Debug, Clone, PartialEq)]
pub struct AllScrape {
    /// Exposition text of every successful category plus failure markers
    pub body: String,
    pub succeeded: Vec<Category>,
    /// Failed categories with their error kind
    pub failed: Vec<(Category, &'static str)>,
}

impl AllScrape {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Comment line appended to `/metrics/all` for a failed category
pub fn failure_marker(category: Category, kind: &str) -> String {
    format!(
        "# fex_scrape_error category=\"{}\" kind=\"{}\"\n",
        category, kind
    )
}

/// Fetches, translates and renders category snapshots
pub struct Exporter<T> {
    fetcher: SnapshotFetcher<T>,
    translator: Translator,
}

impl<T: CommandTransport> Exporter<T> {
    pub fn new(transport: T, translator: Translator) -> Self {
        Self {
            fetcher: SnapshotFetcher::new(transport),
            translator,
        }
    }

    pub fn transport(&self) -> &T {
        self.fetcher.transport()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Fetch and translate one category
    pub fn collect(&self, category: Category) -> Result<Vec<MetricRecord>, ScrapeError> {
        let snapshot = self.fetcher.fetch(category)?;
        let records = self.translator.translate(category, &snapshot)?;
        debug!(category = %category, records = records.len(), "translated snapshot");
        Ok(records)
    }

    /// Exposition text for one category
    pub fn scrape(&self, category: Category) -> Result<String, ScrapeError> {
        let records = self.collect(category)?;
        Ok(registry::render(records)?)
    }

    /// Exposition text for every category
    ///
    /// Failures are isolated per category and listed as marker comments
    /// after the successful sections. An authentication failure stops the
    /// remaining categories and fails the whole scrape; so does every
    /// category failing, in which case the first error is returned.
    pub fn scrape_all(&self) -> Result<AllScrape, ScrapeError> {
        let mut body = String::new();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut first_error = None;

        for category in Category::ALL {
            match self.scrape(category) {
                Ok(text) => {
                    body.push_str(&text);
                    succeeded.push(category);
                }
                Err(e) if e.is_auth() => {
                    warn!(category = %category, kind = e.kind(), "authentication failed, aborting scrape");
                    return Err(e);
                }
                Err(e) => {
                    log_failure(category, &e);
                    failed.push((category, e.kind()));
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if succeeded.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        for (category, kind) in &failed {
            body.push_str(&failure_marker(*category, kind));
        }

        Ok(AllScrape {
            body,
            succeeded,
            failed,
        })
    }
}

/// Render conflicts are defects and get the full detail at error level
pub(crate) fn log_failure(category: Category, e: &ScrapeError) {
    match e {
        ScrapeError::Render(conflict) => {
            error!(category = %category, error = %conflict, "render conflict");
        }
        _ => {
            warn!(category = %category, kind = e.kind(), error = %e, "category scrape failed");
        }
    }
}
