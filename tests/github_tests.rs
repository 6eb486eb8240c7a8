use codecritic::analysis::analyze_repository;
use codecritic::api::analyze_url;
use codecritic::config::{Config, FetchLimits};
use codecritic::error::CriticError;
use codecritic::github::{GitHubClient, RepositorySource};
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;

mod common;
use common::test_helpers::*;

#[tokio::test]
async fn test_listing_not_found_is_none() {
    setup_test_logger();
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/repos/invalid/repo/contents/")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let client = github_client(&server);
    assert!(client.list_top_level("invalid", "repo").await.unwrap().is_none());
}

#[tokio::test]
async fn test_listing_rate_limit() {
    setup_test_logger();
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/repos/rust-lang/rust/contents/")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "API rate limit exceeded for 127.0.0.1."}"#)
        .create_async()
        .await;

    let client = github_client(&server);
    let result = client.list_top_level("rust-lang", "rust").await;
    assert!(matches!(result, Err(CriticError::RateLimitExceeded(_))));
}

#[tokio::test]
async fn test_listing_server_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/repos/o/r/contents/")
        .with_status(502)
        .create_async()
        .await;

    let result = github_client(&server).list_top_level("o", "r").await;
    assert!(matches!(result, Err(CriticError::GitHubApi(_))));
}

#[tokio::test]
async fn test_file_content_raw_and_base64() {
    let mut server = mockito::Server::new_async().await;
    let _raw = server
        .mock("GET", "/raw/README.md")
        .with_status(200)
        .with_header("content-type", "text/plain; charset=utf-8")
        .with_body("# Hello")
        .create_async()
        .await;
    let _api = server
        .mock("GET", "/repos/o/r/contents/.env")
        .with_status(200)
        .with_header("content-type", "application/json")
        // "TOKEN=\"x\"\n" wrapped the way the contents API wraps base64
        .with_body(json!({"encoding": "base64", "content": "VE9LRU49\nIngiCg==\n"}).to_string())
        .create_async()
        .await;
    let _gone = server
        .mock("GET", "/raw/missing.txt")
        .with_status(404)
        .create_async()
        .await;

    let client = github_client(&server);
    assert_eq!(client.fetch_file_content(&format!("{}/raw/README.md", server.url())).await, "# Hello");
    assert_eq!(
        client.fetch_file_content(&format!("{}/repos/o/r/contents/.env", server.url())).await,
        "TOKEN=\"x\"\n"
    );
    assert_eq!(client.fetch_file_content(&format!("{}/raw/missing.txt", server.url())).await, "");
}

#[tokio::test]
async fn test_commits_and_issues_are_bounded() {
    let mut server = mockito::Server::new_async().await;
    let commits = server
        .mock("GET", "/repos/o/r/commits")
        .match_query(Matcher::UrlEncoded("per_page".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"commit": {"message": "fix: things", "author": {"name": "ana"}}},
                {"commit": {"message": "wip", "author": {"name": "bo"}}},
                {"commit": {"message": "ignored", "author": {"name": "cy"}}}
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let issues = server
        .mock("GET", "/repos/o/r/issues")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("state".into(), "open".into()),
            Matcher::UrlEncoded("per_page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"title": "crash", "state": "open"}]).to_string())
        .create_async()
        .await;

    let client = github_client(&server);
    let found = client.fetch_recent_commits("o", "r", 2).await;
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].message, "fix: things");
    assert_eq!(found[1].author, "bo");

    let open = client.fetch_open_issues("o", "r", 2).await;
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].title, "crash");

    commits.assert_async().await;
    issues.assert_async().await;
}

#[tokio::test]
async fn test_commits_error_is_empty() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/repos/o/r/commits")
        .match_query(Matcher::Any)
        .with_status(409)
        .with_body(r#"{"message": "Git Repository is empty."}"#)
        .create_async()
        .await;

    assert!(github_client(&server).fetch_recent_commits("o", "r", 5).await.is_empty());
}

#[tokio::test]
async fn test_snapshot_over_github_client() {
    setup_test_logger();
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    let listing = json!([
        {"name": "README.md", "type": "file", "download_url": format!("{}/raw/README.md", base)},
        {"name": "app.env", "type": "file", "download_url": format!("{}/raw/app.env", base)},
        {"name": "package.json", "type": "file", "download_url": format!("{}/raw/package.json", base)},
        {"name": "index.js", "type": "file", "download_url": format!("{}/raw/index.js", base)},
        {"name": "src", "type": "dir", "download_url": null, "url": format!("{}/repos/octo/demo/contents/src", base)}
    ]);

    let _listing = server
        .mock("GET", "/repos/octo/demo/contents/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(listing.to_string())
        .create_async()
        .await;
    let _readme = server
        .mock("GET", "/raw/README.md")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("Hello demo")
        .create_async()
        .await;
    let _env = server
        .mock("GET", "/raw/app.env")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body(r#"API_KEY="xyz""#)
        .create_async()
        .await;
    let _pkg = server
        .mock("GET", "/raw/package.json")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body(r#"{"name":"demo","dependencies":{"express":"4"}}"#)
        .create_async()
        .await;
    let index_js = server
        .mock("GET", "/raw/index.js")
        .expect(0)
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/commits")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"commit": {"message": "init", "author": {"name": "dev"}}}]).to_string())
        .create_async()
        .await;
    let _issues = server
        .mock("GET", "/repos/octo/demo/issues")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let client = github_client(&server);
    let record = analyze_repository(&client, "octo", "demo", FetchLimits::default())
        .await
        .unwrap()
        .unwrap();

    assert!(record.has_readme);
    assert!(record.readme_needs_update);
    assert!(record.has_env_file);
    assert_eq!(record.exposed_secrets, vec![r#"API_KEY="xyz""#.to_string()]);
    assert_eq!(record.package_file.as_deref(), Some("package.json"));
    assert_eq!(
        record.file_structure,
        vec!["README.md", "app.env", "package.json", "index.js", "src"]
    );
    assert_eq!(record.recent_commits.len(), 1);
    assert!(record.open_issues.is_empty());
    assert_eq!(record.stack().backend.as_deref(), Some("Node.js"));
    index_js.assert_async().await;
}

#[tokio::test]
async fn test_analyze_url_needs_no_generation_keys() {
    let mut server = mockito::Server::new_async().await;
    let config = Config {
        github_api_url: server.url(),
        ..Config::default()
    };
    assert!(config.gemini.api_keys.is_empty());
    assert!(config.ensure_keys().is_err());

    let _listing = server
        .mock("GET", "/repos/octo/demo/contents/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"name": "main.go", "type": "file", "download_url": null}]).to_string())
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/repos/octo/gone/contents/")
        .with_status(404)
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/commits")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;
    let _issues = server
        .mock("GET", "/repos/octo/demo/issues")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let source = GitHubClient::from_config(&config).unwrap();
    let record = analyze_url(&source, "https://github.com/octo/demo", config.limits)
        .await
        .unwrap();
    assert_eq!(record.file_structure, vec!["main.go"]);
    assert!(!record.has_readme);

    let err = analyze_url(&source, "https://github.com/octo/gone", config.limits)
        .await
        .unwrap_err();
    assert!(matches!(err, CriticError::NotFound(_)));
}
