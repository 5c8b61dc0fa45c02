//! Integration tests for the GitHub client against a stubbed HTTP server.

use chrono::{TimeZone, Utc};
use harvester::github::{ApiError, GithubClient, RateLimitBucket};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> GithubClient {
    let octo = octocrab::Octocrab::builder()
        .base_uri(server.uri())
        .expect("valid base uri")
        .build()
        .expect("octocrab builds");
    GithubClient::from_octocrab(octo)
}

#[tokio::test]
async fn rate_limit_message_classifies_as_rate_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repositories"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "API rate limit exceeded for 127.0.0.1.",
            "documentation_url": "https://docs.github.com/rest/overview/rate-limits"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .list_repositories(0)
        .await
        .expect_err("403 must be an error");
    assert!(matches!(err, ApiError::RateExceeded), "got {err:?}");
}

#[tokio::test]
async fn access_blocked_message_classifies_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/blocked"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Repository access blocked",
            "documentation_url": "https://docs.github.com"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .get_repository("acme", "blocked")
        .await
        .expect_err("403 must be an error");
    assert!(matches!(err, ApiError::Unavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn other_403s_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/secret"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Must have admin rights to Repository.",
            "documentation_url": "https://docs.github.com"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .get_repository("acme", "secret")
        .await
        .expect_err("403 must be an error");
    assert!(matches!(err, ApiError::Api(_)), "got {err:?}");
}

#[tokio::test]
async fn listing_parses_sparse_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repositories"))
        .and(query_param("since", "1200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1296269,
                "name": "Hello-World",
                "full_name": "octocat/Hello-World",
                "owner": {"login": "octocat", "id": 1, "type": "User"},
                "fork": false
            },
            {
                "id": 1296270,
                "name": "forked-thing",
                "owner": {"login": "octocat", "id": 1, "type": "User"},
                "fork": true
            }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let repos = client.list_repositories(1200).await.expect("listing");

    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].id, Some(1296269));
    assert_eq!(repos[1].fork, Some(true));
}

#[tokio::test]
async fn search_sends_ranking_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "language:rust"))
        .and(query_param("sort", "stars"))
        .and(query_param("order", "desc"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "incomplete_results": false,
            "items": [{
                "id": 7,
                "name": "ripgrep",
                "owner": {"login": "BurntSushi", "id": 2, "type": "User"},
                "fork": false,
                "language": "Rust",
                "clone_url": "https://github.com/BurntSushi/ripgrep.git"
            }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let results = client
        .search_repositories("rust", 2)
        .await
        .expect("search page");

    assert_eq!(results.total_count, 1);
    assert_eq!(results.items[0].name.as_deref(), Some("ripgrep"));
}

#[tokio::test]
async fn rate_limit_reset_reads_the_requested_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": {
                "core": {"limit": 5000, "remaining": 0, "reset": 1700000000},
                "search": {"limit": 30, "remaining": 0, "reset": 1700000060}
            },
            "rate": {"limit": 5000, "remaining": 0, "reset": 1700000000}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let core = client
        .rate_limit_reset(RateLimitBucket::Core)
        .await
        .expect("core reset");
    assert_eq!(core, Utc.timestamp_opt(1700000000, 0).unwrap());

    let search = client
        .rate_limit_reset(RateLimitBucket::Search)
        .await
        .expect("search reset");
    assert_eq!(search, Utc.timestamp_opt(1700000060, 0).unwrap());
}
