//! Provider crawlers.
//!
//! A crawler harvests repository and contributor metadata from one hosting
//! platform and writes it into the store. Only GitHub is implemented
//! today; the factory keys on the configuration's `type` field so further
//! platforms slot in beside it.

mod filter;
pub mod github;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::CrawlerConfig;
use crate::github::ApiError;

pub use filter::{LanguageHint, is_language_wanted};
pub use github::GithubCrawler;

/// Errors produced when constructing a crawler.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("unsupported crawler type: {0}")]
    UnsupportedKind(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A metadata crawler for one provider.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// The provider this crawler talks to, for logging.
    fn kind(&self) -> &'static str;

    /// Run one full crawling pass. Per-record failures are logged and
    /// skipped; the pass only ends early on shutdown.
    async fn crawl(&self);
}

/// Create the crawler described by a configuration block.
pub fn new_crawler(
    cfg: &CrawlerConfig,
    db: DatabaseConnection,
    cancel: CancellationToken,
) -> Result<Box<dyn Crawler>, CrawlerError> {
    match cfg.kind.as_str() {
        "github" => Ok(Box::new(GithubCrawler::new(cfg, db, cancel)?)),
        other => Err(CrawlerError::UnsupportedKind(other.to_string())),
    }
}
