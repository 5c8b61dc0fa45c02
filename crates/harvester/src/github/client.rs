//! GitHub API client.
//!
//! [`GithubClient`] wraps an [`Octocrab`] instance and exposes the typed
//! calls the crawler needs. Raw routes with our own payload types are
//! used throughout so the daemon only depends on the fields it stores.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::error::{ApiError, classify};
use super::rate_limit::{RateLimitBucket, retry_on_rate_limit};
use super::types::{
    GhAccount, GhOrg, GhRepo, GhUser, LanguageBreakdown, RateLimitResponse, SearchRepos,
};

/// Result type for GitHub API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Listing and search endpoints page at 100 items regardless of smaller
/// `per_page` requests.
pub const PAGE_SIZE: usize = 100;

/// The search API never returns more than 1000 results per query.
pub const SEARCH_RESULT_CEILING: i64 = 1000;

/// A typed client over the GitHub HTTP surface.
#[derive(Clone)]
pub struct GithubClient {
    inner: Arc<Octocrab>,
}

impl GithubClient {
    /// Create a client, optionally authenticated with a personal access
    /// token. Without one the provider grants only a small call budget.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            builder = builder.personal_token(token.to_string());
        }
        let client = builder.build().map_err(ApiError::Api)?;
        Ok(Self::from_octocrab(client))
    }

    /// Wrap an existing Octocrab instance. Useful for tests that point
    /// the client at a local stub server.
    pub fn from_octocrab(client: Octocrab) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    async fn get<T: DeserializeOwned>(&self, route: &str) -> Result<T> {
        self.inner.get(route, None::<&()>).await.map_err(classify)
    }

    /// One page of the public repository listing, starting after the
    /// repository id `since`.
    pub async fn list_repositories(&self, since: u64) -> Result<Vec<GhRepo>> {
        self.get(&format!("/repositories?since={since}")).await
    }

    /// One page of repository search results for a language, ranked by
    /// stargazer count descending.
    pub async fn search_repositories(&self, language: &str, page: u32) -> Result<SearchRepos> {
        let route = {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            query.append_pair("q", &format!("language:{language}"));
            query.append_pair("sort", "stars");
            query.append_pair("order", "desc");
            query.append_pair("per_page", &PAGE_SIZE.to_string());
            query.append_pair("page", &page.to_string());

            format!("/search/repositories?{}", query.finish())
        };

        self.get(&route).await
    }

    /// The full record of a single repository.
    pub async fn get_repository(&self, owner: &str, name: &str) -> Result<GhRepo> {
        self.get(&format!("/repos/{owner}/{name}")).await
    }

    /// The per-repository language breakdown (language name to bytes).
    pub async fn list_languages(&self, owner: &str, name: &str) -> Result<LanguageBreakdown> {
        self.get(&format!("/repos/{owner}/{name}/languages")).await
    }

    /// The full record of a user.
    pub async fn get_user(&self, login: &str) -> Result<GhUser> {
        self.get(&format!("/users/{login}")).await
    }

    /// The full record of an organization.
    pub async fn get_organization(&self, login: &str) -> Result<GhOrg> {
        self.get(&format!("/orgs/{login}")).await
    }

    /// The public members of an organization.
    pub async fn list_organization_members(&self, login: &str) -> Result<Vec<GhAccount>> {
        self.get(&format!("/orgs/{login}/members?per_page={PAGE_SIZE}"))
            .await
    }

    /// The instant at which the given rate-limit bucket resets.
    pub async fn rate_limit_reset(&self, bucket: RateLimitBucket) -> Result<DateTime<Utc>> {
        let limits: RateLimitResponse = self.get("/rate_limit").await?;
        let window = match bucket {
            RateLimitBucket::Core => limits.resources.core,
            RateLimitBucket::Search => limits.resources.search,
        };

        Ok(DateTime::from_timestamp(window.reset, 0).unwrap_or_else(Utc::now))
    }

    /// Run an API operation under the rate-limit policy: when it reports
    /// [`ApiError::RateExceeded`], suspend until the bucket's reset
    /// instant plus one second and retry. All other errors bubble.
    pub async fn call<T, Op, Fut>(
        &self,
        bucket: RateLimitBucket,
        cancel: &CancellationToken,
        op: Op,
    ) -> Result<T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let client = self.clone();
        retry_on_rate_limit(
            op,
            move || {
                let client = client.clone();
                async move { client.rate_limit_reset(bucket).await }
            },
            cancel,
        )
        .await
    }
}
