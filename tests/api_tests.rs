use codecritic::api::{CriticService, ReadmeRequest, RoastRequest};
use codecritic::config::FetchLimits;
use codecritic::error::CriticError;
use codecritic::generation::{GenerationClient, KEYS_EXHAUSTED_MESSAGE, GENERATION_FAILED_MESSAGE};
use pretty_assertions::assert_eq;
use std::sync::Arc;

mod common;
use common::test_helpers::*;
use common::{InMemoryRepo, KeyedGenerator};

fn service(repo: Arc<InMemoryRepo>, generator: Arc<KeyedGenerator>, key_count: usize) -> CriticService {
    let client = GenerationClient::new(generator, keys(key_count)).unwrap();
    CriticService::new(repo, Arc::new(client), FetchLimits::default())
}

fn demo_repo() -> Arc<InMemoryRepo> {
    InMemoryRepo::new(&[
        ("README.md", "Hello demo"),
        ("app.env", r#"API_KEY="xyz""#),
        ("package.json", r#"{"dependencies":{"react":"18"}}"#),
        ("index.js", "console.log(1)"),
    ])
}

#[tokio::test]
async fn test_malformed_url_is_rejected_before_any_call() {
    let repo = demo_repo();
    let generator = KeyedGenerator::new(&[]);
    let svc = service(repo.clone(), generator.clone(), 1);

    let err = svc
        .roast(&RoastRequest { repo_url: "https://github.com/onlyonesegment".into() })
        .await
        .unwrap_err();

    assert!(matches!(err, CriticError::Validation(_)));
    assert_eq!(repo.listing_calls(), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_missing_repository_is_not_found() {
    let generator = KeyedGenerator::new(&[]);
    let svc = service(InMemoryRepo::missing(), generator.clone(), 1);

    let err = svc
        .readme(&ReadmeRequest { repo_url: "https://github.com/a/b".into(), ..ReadmeRequest::default() })
        .await
        .unwrap_err();

    assert!(matches!(err, CriticError::NotFound(_)));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_roast_returns_summary_and_text() {
    setup_test_logger();
    let generator = KeyedGenerator::new(&[]);
    let svc = service(demo_repo(), generator.clone(), 1);

    let response = svc
        .roast(&RoastRequest { repo_url: "https://github.com/octo/demo".into() })
        .await
        .unwrap();

    assert_eq!(response.roast, "generated with key-0");
    assert!(response.analysis.has_readme);
    assert!(response.analysis.readme_needs_update);
    assert!(response.analysis.has_env_file);
    assert_eq!(response.analysis.exposed_secret_count, 1);
    assert_eq!(response.analysis.file_structure.len(), 4);

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("Exposed secrets found: 1"));
    assert!(prompt.contains("initial commit"));
}

#[tokio::test]
async fn test_roast_rotates_past_exhausted_keys() {
    let generator = KeyedGenerator::new(&["key-0", "key-1"]);
    let client = Arc::new(GenerationClient::new(generator.clone(), keys(3)).unwrap());
    let svc = CriticService::new(demo_repo(), client.clone(), FetchLimits::default());

    let response = svc
        .roast(&RoastRequest { repo_url: "https://github.com/octo/demo".into() })
        .await
        .unwrap();

    assert_eq!(response.roast, "generated with key-2");
    assert_eq!(client.current_index(), 2);
}

#[tokio::test]
async fn test_exhaustion_differs_between_roast_and_readme() {
    let generator = KeyedGenerator::new(&["key-0", "key-1"]);
    let svc = service(demo_repo(), generator, 2);

    let roast = svc
        .roast(&RoastRequest { repo_url: "https://github.com/octo/demo".into() })
        .await
        .unwrap();
    assert_eq!(roast.roast, KEYS_EXHAUSTED_MESSAGE);

    let err = svc
        .readme(&ReadmeRequest { repo_url: "https://github.com/octo/demo".into(), ..ReadmeRequest::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, CriticError::KeysExhausted { attempts: 2 }));
}

#[tokio::test]
async fn test_roast_apologizes_on_provider_failure() {
    let generator = KeyedGenerator::failing(|| CriticError::Generation("blocked".into()));
    let svc = service(demo_repo(), generator.clone(), 3);

    let response = svc
        .roast(&RoastRequest { repo_url: "https://github.com/octo/demo".into() })
        .await
        .unwrap();

    assert_eq!(response.roast, GENERATION_FAILED_MESSAGE);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_readme_uses_request_facts_and_stack() {
    let generator = KeyedGenerator::new(&[]);
    let svc = service(demo_repo(), generator.clone(), 1);

    let response = svc
        .readme(&ReadmeRequest {
            repo_url: "https://github.com/octo/demo.git".into(),
            project_description: Some("A demo app".into()),
            environment_variables: Some("API_KEY".into()),
            ..ReadmeRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(response.readme, "generated with key-0");
    assert_eq!(response.stack.frontend.as_deref(), Some("React"));

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("Project description: A demo app"));
    assert!(prompt.contains("Environment variables: API_KEY"));
    assert!(prompt.contains("Key features: None"));
    assert!(prompt.contains("Existing README:\nHello demo"));
}
