//! The GitHub crawler.
//!
//! Two modes, selected per configuration block:
//!
//! - **Listing mode** walks the exhaustive public-repository listing with
//!   a `since` cursor. Expensive in API calls: every kept repository
//!   costs a detail fetch, plus a language-breakdown fetch when the
//!   coarse filter misses.
//! - **Search mode** queries the search API per configured language,
//!   ranked by stargazers, and is capped at 1000 results per query by
//!   the provider.
//!
//! Every provider call goes through the rate-limit adapter; every
//! per-record failure is logged and skipped so a crawling pass only ends
//! early on shutdown.

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

use crate::config::CrawlerConfig;
use crate::github::client::{PAGE_SIZE, SEARCH_RESULT_CEILING};
use crate::github::types::{GhAccount, GhOrg, GhRepo, GhUser, LanguageBreakdown, SearchRepos};
use crate::github::{ApiError, GithubClient, RateLimitBucket};
use crate::store::{self, VerifiedRepo, verify_repo};

use super::filter::{LanguageHint, is_language_wanted};
use super::{Crawler, CrawlerError};

/// Crawls repositories, contributors and organizations from GitHub.
pub struct GithubCrawler {
    languages: Vec<String>,
    limit: i64,
    keep_forks: bool,
    use_search_api: bool,
    since_id: u64,
    client: GithubClient,
    db: DatabaseConnection,
    cancel: CancellationToken,
}

impl GithubCrawler {
    /// Create a crawler from its configuration block.
    pub fn new(
        cfg: &CrawlerConfig,
        db: DatabaseConnection,
        cancel: CancellationToken,
    ) -> Result<Self, CrawlerError> {
        let token = (!cfg.oauth_access_token.trim().is_empty())
            .then_some(cfg.oauth_access_token.as_str());
        let client = GithubClient::new(token)?;

        Ok(Self {
            languages: cfg.languages.clone(),
            limit: cfg.limit,
            keep_forks: cfg.fork,
            use_search_api: cfg.use_search_api,
            since_id: cfg.since_id,
            client,
            db,
            cancel,
        })
    }

    // ─── Rate-limited call wrappers ──────────────────────────────────────

    async fn fetch_listing_page(&self, since: u64) -> Result<Vec<GhRepo>, ApiError> {
        let client = self.client.clone();
        self.client
            .call(RateLimitBucket::Core, &self.cancel, move || {
                let client = client.clone();
                async move { client.list_repositories(since).await }
            })
            .await
    }

    async fn fetch_search_page(&self, language: &str, page: u32) -> Result<SearchRepos, ApiError> {
        let client = self.client.clone();
        let language = language.to_string();
        self.client
            .call(RateLimitBucket::Search, &self.cancel, move || {
                let client = client.clone();
                let language = language.clone();
                async move { client.search_repositories(&language, page).await }
            })
            .await
    }

    async fn fetch_repository(&self, owner: &str, name: &str) -> Result<GhRepo, ApiError> {
        let client = self.client.clone();
        let owner = owner.to_string();
        let name = name.to_string();
        self.client
            .call(RateLimitBucket::Core, &self.cancel, move || {
                let client = client.clone();
                let owner = owner.clone();
                let name = name.clone();
                async move { client.get_repository(&owner, &name).await }
            })
            .await
    }

    async fn fetch_languages(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<LanguageBreakdown, ApiError> {
        let client = self.client.clone();
        let owner = owner.to_string();
        let name = name.to_string();
        self.client
            .call(RateLimitBucket::Core, &self.cancel, move || {
                let client = client.clone();
                let owner = owner.clone();
                let name = name.clone();
                async move { client.list_languages(&owner, &name).await }
            })
            .await
    }

    async fn fetch_user(&self, login: &str) -> Result<GhUser, ApiError> {
        let client = self.client.clone();
        let login = login.to_string();
        self.client
            .call(RateLimitBucket::Core, &self.cancel, move || {
                let client = client.clone();
                let login = login.clone();
                async move { client.get_user(&login).await }
            })
            .await
    }

    async fn fetch_organization(&self, login: &str) -> Result<GhOrg, ApiError> {
        let client = self.client.clone();
        let login = login.to_string();
        self.client
            .call(RateLimitBucket::Core, &self.cancel, move || {
                let client = client.clone();
                let login = login.clone();
                async move { client.get_organization(&login).await }
            })
            .await
    }

    async fn fetch_members(&self, login: &str) -> Result<Vec<GhAccount>, ApiError> {
        let client = self.client.clone();
        let login = login.to_string();
        self.client
            .call(RateLimitBucket::Core, &self.cancel, move || {
                let client = client.clone();
                let login = login.clone();
                async move { client.list_organization_members(&login).await }
            })
            .await
    }

    // ─── Crawling modes ──────────────────────────────────────────────────

    /// Walk the exhaustive public listing with a `since` cursor.
    ///
    /// The cursor advances past every item, kept or not, so a later pass
    /// never revisits skipped repositories. The configured limit, when
    /// non-zero, is global across languages.
    async fn crawl_listing(&self) -> Result<(), ApiError> {
        let mut budget = self.limit;
        let has_limit = budget > 0;
        let mut since_id = self.since_id;

        'pages: loop {
            let repos = self.fetch_listing_page(since_id).await?;
            if repos.is_empty() {
                break;
            }

            for repo in &repos {
                if self.cancel.is_cancelled() {
                    return Err(ApiError::Cancelled);
                }

                let Some(id) = repo.id else {
                    tracing::error!("listing item has no id field");
                    continue;
                };
                since_id = id as u64;

                if budget == 0 && has_limit {
                    break 'pages;
                }

                let Some(fork) = repo.fork else {
                    tracing::error!(github_id = id, "listing item has no fork field");
                    continue;
                };
                if fork && !self.keep_forks {
                    continue;
                }

                if !self.wants_languages_of(repo).await? {
                    continue;
                }

                let Some((owner, name)) = owner_and_name(repo) else {
                    continue;
                };
                let full = match self.fetch_repository(owner, name).await {
                    Ok(full) => full,
                    Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
                    Err(err) => {
                        tracing::warn!(github_id = id, error = %err, "cannot fetch repository");
                        continue;
                    }
                };

                let verified = match verify_repo(&full) {
                    Ok(verified) => verified,
                    Err(err) => {
                        tracing::error!(error = %err, "skipping repository");
                        continue;
                    }
                };

                if !self.record_repository(&verified).await {
                    continue;
                }

                budget -= 1;
            }

            if budget <= 0 && has_limit {
                break;
            }
        }

        Ok(())
    }

    /// Coarse filter on the listing item's primary language, refined with
    /// the per-repository breakdown on a miss.
    async fn wants_languages_of(&self, repo: &GhRepo) -> Result<bool, ApiError> {
        let hint = repo.language.as_deref().map(LanguageHint::Primary);
        if is_language_wanted(&self.languages, hint) {
            return Ok(true);
        }

        let Some((owner, name)) = owner_and_name(repo) else {
            return Ok(false);
        };

        match self.fetch_languages(owner, name).await {
            Ok(breakdown) => Ok(is_language_wanted(
                &self.languages,
                Some(LanguageHint::Breakdown(&breakdown)),
            )),
            Err(ApiError::Cancelled) => Err(ApiError::Cancelled),
            Err(err) => {
                tracing::warn!(owner, name, error = %err, "cannot fetch language breakdown");
                Ok(false)
            }
        }
    }

    /// Crawl the stargazer-ranked search results for one language. The
    /// configured limit, when non-zero, applies to this language alone.
    async fn crawl_top_repositories(&self, language: &str) -> Result<(), ApiError> {
        let mut budget = self.limit;
        let has_limit = budget > 0;
        let mut page: u32 = 1;
        let mut seen: i64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }

            let results = self.fetch_search_page(language, page).await?;
            let count = results.items.len();

            for repo in &results.items {
                if budget == 0 && has_limit {
                    return Ok(());
                }

                let verified = match verify_repo(repo) {
                    Ok(verified) => verified,
                    Err(err) => {
                        tracing::error!(error = %err, "skipping repository");
                        continue;
                    }
                };

                if verified.fork && !self.keep_forks {
                    continue;
                }

                if !self.record_repository(&verified).await {
                    continue;
                }

                budget -= 1;
            }

            seen += count as i64;
            let exhausted = count < PAGE_SIZE
                || seen >= SEARCH_RESULT_CEILING
                || seen >= results.total_count;
            if exhausted || (budget <= 0 && has_limit) {
                break;
            }

            page += 1;
        }

        Ok(())
    }

    // ─── Metadata graph walk ─────────────────────────────────────────────

    /// Upsert a repository together with its owner, detail row,
    /// organization and members. Returns false when any upsert failed;
    /// the walk stops at the first failure so link tables never reference
    /// a row that was not written in this pass.
    async fn record_repository(&self, repo: &VerifiedRepo<'_>) -> bool {
        tracing::info!(repository = repo.name, "recording repository");

        let repository_id = match store::repository::upsert_repository(&self.db, repo).await {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(repository = repo.name, error = %err, "repository upsert failed");
                return false;
            }
        };

        let owner_recorded = if repo.owner_is_org {
            self.record_organization(repo.owner_login, repository_id)
                .await
        } else {
            self.record_user(repo.owner_login, repository_id, None)
                .await
        };
        if !owner_recorded {
            return false;
        }

        if let Err(err) =
            store::repository::upsert_github_repository(&self.db, repository_id, repo).await
        {
            tracing::error!(repository = repo.name, error = %err, "detail upsert failed");
            return false;
        }

        // The detail record may name an organization distinct from the
        // owner account.
        if let Some(org_login) = repo
            .raw
            .organization
            .as_ref()
            .and_then(|org| org.login.as_deref())
        {
            if !self.record_organization(org_login, repository_id).await {
                return false;
            }
        }

        true
    }

    /// Fetch a user record, upsert it with its detail row, link it to the
    /// repository and, when given, to an organization.
    async fn record_user(
        &self,
        login: &str,
        repository_id: i64,
        organization_id: Option<i64>,
    ) -> bool {
        tracing::info!(user = login, "recording user");

        let user = match self.fetch_user(login).await {
            Ok(user) => user,
            Err(err) => {
                tracing::error!(user = login, error = %err, "cannot fetch user");
                return false;
            }
        };

        let user_id = match store::user::upsert_user(&self.db, &user).await {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(user = login, error = %err, "user upsert failed");
                return false;
            }
        };

        if let Err(err) = store::link::link_user_repository(&self.db, user_id, repository_id).await
        {
            tracing::error!(user = login, error = %err, "user-repository link failed");
            return false;
        }

        let gh_user_id = match store::user::upsert_github_user(&self.db, user_id, &user).await {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(user = login, error = %err, "user detail upsert failed");
                return false;
            }
        };

        if let Some(organization_id) = organization_id {
            if let Err(err) =
                store::link::link_github_user_organization(&self.db, gh_user_id, organization_id)
                    .await
            {
                tracing::error!(user = login, error = %err, "user-organization link failed");
                return false;
            }
        }

        true
    }

    /// Fetch an organization record, upsert it, and record its members as
    /// users linked to both the organization and the repository.
    async fn record_organization(&self, login: &str, repository_id: i64) -> bool {
        tracing::info!(organization = login, "recording organization");

        let org = match self.fetch_organization(login).await {
            Ok(org) => org,
            Err(err) => {
                tracing::error!(organization = login, error = %err, "cannot fetch organization");
                return false;
            }
        };

        let organization_id = match store::organization::upsert_github_organization(&self.db, &org)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(organization = login, error = %err, "organization upsert failed");
                return false;
            }
        };

        // A failed member listing degrades the pass, it does not fail it.
        let members = match self.fetch_members(login).await {
            Ok(members) => members,
            Err(err) => {
                tracing::warn!(organization = login, error = %err, "cannot list members");
                Vec::new()
            }
        };

        for member in &members {
            let Some(member_login) = member.login.as_deref() else {
                continue;
            };
            if !self
                .record_user(member_login, repository_id, Some(organization_id))
                .await
            {
                return false;
            }
        }

        true
    }
}

fn owner_and_name(repo: &GhRepo) -> Option<(&str, &str)> {
    let owner = repo.owner.as_ref()?.login.as_deref()?;
    let name = repo.name.as_deref()?;
    Some((owner, name))
}

#[async_trait]
impl Crawler for GithubCrawler {
    fn kind(&self) -> &'static str {
        "github"
    }

    async fn crawl(&self) {
        if self.use_search_api {
            for language in &self.languages {
                match self.crawl_top_repositories(language).await {
                    Ok(()) => {}
                    Err(ApiError::Cancelled) => return,
                    Err(err) => {
                        tracing::error!(language = %language, error = %err, "search crawl failed");
                    }
                }
            }
        } else {
            match self.crawl_listing().await {
                Ok(()) | Err(ApiError::Cancelled) => {}
                Err(err) => tracing::error!(error = %err, "listing crawl failed"),
            }
        }
    }
}
