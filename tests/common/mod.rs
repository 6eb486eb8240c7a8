#![allow(dead_code)]

use async_trait::async_trait;
use codecritic::error::{CriticError, Result};
use codecritic::generation::{GenerationOptions, TextGenerator};
use codecritic::github::{CommitSummary, GitHubClient, IssueSummary, RepoEntry, RepositorySource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub mod test_helpers {
    use super::*;

    pub fn setup_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    pub fn github_client(server: &mockito::ServerGuard) -> GitHubClient {
        GitHubClient::with_base_url(None, &server.url(), Duration::from_secs(5)).unwrap()
    }

    pub fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("key-{}", i)).collect()
    }
}

/// Repository source backed by a fixed file map
#[derive(Default)]
pub struct InMemoryRepo {
    pub files: Vec<(String, String)>,
    pub missing: bool,
    pub listing_calls: AtomicUsize,
}

impl InMemoryRepo {
    pub fn new(files: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            files: files.iter().map(|(n, c)| (n.to_string(), c.to_string())).collect(),
            ..Self::default()
        })
    }

    pub fn missing() -> Arc<Self> {
        Arc::new(Self { missing: true, ..Self::default() })
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositorySource for InMemoryRepo {
    async fn list_top_level(&self, _owner: &str, _repo: &str) -> Result<Option<Vec<RepoEntry>>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if self.missing {
            return Ok(None);
        }
        Ok(Some(
            self.files
                .iter()
                .map(|(name, _)| RepoEntry::file(name.clone(), name.clone()))
                .collect(),
        ))
    }

    async fn fetch_file_content(&self, download_ref: &str) -> String {
        let files: HashMap<_, _> = self.files.iter().cloned().collect();
        files.get(download_ref).cloned().unwrap_or_default()
    }

    async fn fetch_recent_commits(&self, _owner: &str, _repo: &str, limit: usize) -> Vec<CommitSummary> {
        vec![CommitSummary { message: "initial commit".into(), author: "dev".into() }]
            .into_iter()
            .take(limit)
            .collect()
    }

    async fn fetch_open_issues(&self, _owner: &str, _repo: &str, _limit: usize) -> Vec<IssueSummary> {
        Vec::new()
    }
}

/// Generator that returns quota errors for the listed credentials and
/// echoes everything else
pub struct KeyedGenerator {
    pub exhausted: Vec<String>,
    pub prompts: Mutex<Vec<String>>,
    pub credentials: Mutex<Vec<String>>,
    pub fail_with: Option<fn() -> CriticError>,
}

impl KeyedGenerator {
    pub fn new(exhausted: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            exhausted: exhausted.iter().map(|k| k.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
            fail_with: None,
        })
    }

    pub fn failing(fail_with: fn() -> CriticError) -> Arc<Self> {
        Arc::new(Self {
            exhausted: Vec::new(),
            prompts: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
            fail_with: Some(fail_with),
        })
    }

    pub fn calls(&self) -> usize {
        self.credentials.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for KeyedGenerator {
    async fn generate_text(&self, prompt: &str, _options: &GenerationOptions, credential: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.credentials.lock().unwrap().push(credential.to_string());
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        if self.exhausted.iter().any(|k| k == credential) {
            return Err(CriticError::QuotaExceeded(format!("{} is out of quota", credential)));
        }
        Ok(format!("generated with {}", credential))
    }
}
