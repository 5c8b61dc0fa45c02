//! Payload types for the GitHub API surface the crawler consumes.
//!
//! Everything the API may omit is an `Option`; validating the fields the
//! store actually needs is a separate explicit step in the store layer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A repository record, as returned by both the listing and the detail
/// endpoints (the listing variant simply leaves most fields unset).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GhRepo {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub owner: Option<GhAccount>,
    pub fork: Option<bool>,
    pub language: Option<String>,
    pub clone_url: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub default_branch: Option<String>,
    pub html_url: Option<String>,
    pub forks_count: Option<i32>,
    pub open_issues_count: Option<i32>,
    pub stargazers_count: Option<i32>,
    pub subscribers_count: Option<i32>,
    pub watchers_count: Option<i32>,
    /// Repository size in kilobytes.
    pub size: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub organization: Option<GhAccount>,
}

/// A user or organization reference embedded in other records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GhAccount {
    pub id: Option<i64>,
    pub login: Option<String>,
    /// "User" or "Organization".
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl GhAccount {
    /// Whether this account is an organization.
    pub fn is_organization(&self) -> bool {
        self.kind.as_deref() == Some("Organization")
    }
}

/// A full user record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GhUser {
    pub id: Option<i64>,
    pub login: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub blog: Option<String>,
    pub company: Option<String>,
    pub hireable: Option<bool>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub followers: Option<i32>,
    pub following: Option<i32>,
    pub collaborators: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A full organization record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GhOrg {
    pub id: Option<i64>,
    pub login: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub collaborators: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-repository language breakdown: language name to bytes of code.
pub type LanguageBreakdown = HashMap<String, i64>;

/// Response of the repository search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRepos {
    pub total_count: i64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<GhRepo>,
}

/// Response of the `/rate_limit` endpoint, reduced to the buckets the
/// daemon consults.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitWindow,
    pub search: RateLimitWindow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitWindow {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp at which the window resets.
    pub reset: i64,
}
