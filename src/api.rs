use crate::analysis::{analyze_repository, AnalysisRecord, ProjectFacts, StackInfo};
use crate::config::{Config, FetchLimits};
use crate::error::{CriticError, Result};
use crate::generation::{GeminiGenerator, GenerationClient, GenerationOptions};
use crate::github::{CommitSummary, GitHubClient, IssueSummary, RepositorySource};
use crate::prompts::{readme_prompt, roast_prompt};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Account or organization
    pub owner: String,
    /// Repository name without a `.git` suffix
    pub repo: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Parses `https://github.com/<owner>/<repo>[/...]` into a [`RepoRef`].
///
/// Extra path segments (`/tree/main`, `/issues`) are ignored. Anything that
/// is not a GitHub repository URL is a [`CriticError::Validation`].
pub fn parse_repo_url(repo_url: &str) -> Result<RepoRef> {
    let trimmed = repo_url.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| CriticError::Validation(format!("Invalid repository URL '{}': {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CriticError::Validation(format!(
            "Invalid repository URL '{}': unsupported scheme",
            trimmed
        )));
    }
    let host = url.host_str().unwrap_or_default().to_lowercase();
    if !GITHUB_HOSTS.contains(&host.as_str()) {
        return Err(CriticError::Validation(format!(
            "Invalid repository URL '{}': not a GitHub URL",
            trimmed
        )));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    match segments.as_slice() {
        [owner, repo, ..] => {
            let repo = repo.strip_suffix(".git").unwrap_or(repo);
            if repo.is_empty() {
                return Err(CriticError::Validation(format!(
                    "Invalid repository URL '{}': empty repository name",
                    trimmed
                )));
            }
            Ok(RepoRef {
                owner: (*owner).to_string(),
                repo: repo.to_string(),
            })
        }
        _ => Err(CriticError::Validation(format!(
            "Invalid repository URL '{}': expected https://github.com/<owner>/<repo>",
            trimmed
        ))),
    }
}

/// Body of `POST /analyze-repo`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoastRequest {
    /// Repository URL
    pub repo_url: String,
}

/// Body of `POST /generate-readme`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadmeRequest {
    /// Repository URL
    pub repo_url: String,
    /// What the project is for
    #[serde(default)]
    pub project_description: Option<String>,
    /// Notable features
    #[serde(default)]
    pub project_features: Option<String>,
    /// How to set the project up
    #[serde(default)]
    pub setup_instructions: Option<String>,
    /// Environment variables the project reads
    #[serde(default)]
    pub environment_variables: Option<String>,
}

impl ReadmeRequest {
    /// User-supplied facts carried by the request
    pub fn facts(&self) -> ProjectFacts {
        ProjectFacts {
            description: self.project_description.clone(),
            features: self.project_features.clone(),
            setup_instructions: self.setup_instructions.clone(),
            environment_variables: self.environment_variables.clone(),
        }
    }
}

/// Public subset of an [`AnalysisRecord`]; secret values are never returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Top-level `README.md` present
    pub has_readme: bool,
    /// README heuristic outcome
    pub readme_needs_update: bool,
    /// Any `.env`-like file present
    pub has_env_file: bool,
    /// Number of secret scanner hits
    pub exposed_secret_count: usize,
    /// Top-level names
    pub file_structure: Vec<String>,
    /// Open issues
    pub open_issues: Vec<IssueSummary>,
    /// Recent commits
    pub recent_commits: Vec<CommitSummary>,
}

impl From<&AnalysisRecord> for AnalysisSummary {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            has_readme: record.has_readme,
            readme_needs_update: record.readme_needs_update,
            has_env_file: record.has_env_file,
            exposed_secret_count: record.exposed_secrets.len(),
            file_structure: record.file_structure.clone(),
            open_issues: record.open_issues.clone(),
            recent_commits: record.recent_commits.clone(),
        }
    }
}

/// Response of `POST /analyze-repo`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoastResponse {
    /// Generated roast, or a fixed apology when generation failed
    pub roast: String,
    /// Snapshot summary
    pub analysis: AnalysisSummary,
}

/// Response of `POST /generate-readme`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadmeResponse {
    /// Generated README markdown
    pub readme: String,
    /// Stack the README was written for
    pub stack: StackInfo,
}

/// Request orchestrator shared by the server and the CLI
#[derive(Clone)]
pub struct CriticService {
    source: Arc<dyn RepositorySource>,
    generator: Arc<GenerationClient>,
    limits: FetchLimits,
}

/// Parses the URL and builds the snapshot straight from `source`.
///
/// Needs no generation credentials. An absent repository becomes
/// [`CriticError::NotFound`].
pub async fn analyze_url(source: &dyn RepositorySource, repo_url: &str, limits: FetchLimits) -> Result<AnalysisRecord> {
    let repo = parse_repo_url(repo_url)?;
    info!("Analyzing {}", repo);
    analyze_repository(source, &repo.owner, &repo.repo, limits)
        .await?
        .ok_or_else(|| CriticError::NotFound(repo.to_string()))
}

impl CriticService {
    /// Wires a service from its collaborators
    pub fn new(source: Arc<dyn RepositorySource>, generator: Arc<GenerationClient>, limits: FetchLimits) -> Self {
        Self { source, generator, limits }
    }

    /// Builds the GitHub and Gemini collaborators from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.ensure_keys()?;
        let source = Arc::new(GitHubClient::from_config(config)?);
        let gemini = Arc::new(GeminiGenerator::from_config(config)?);
        let generator = Arc::new(GenerationClient::new(gemini, config.gemini.api_keys.clone())?);
        Ok(Self::new(source, generator, config.limits))
    }

    /// Shared generation client
    pub fn generator(&self) -> &GenerationClient {
        &self.generator
    }

    /// Builds the snapshot with the service's source, see [`analyze_url`]
    pub async fn analyze(&self, repo_url: &str) -> Result<AnalysisRecord> {
        analyze_url(self.source.as_ref(), repo_url, self.limits).await
    }

    /// Analyzes a repository and roasts it. Generation failures become an
    /// apology in the `roast` field.
    pub async fn roast(&self, request: &RoastRequest) -> Result<RoastResponse> {
        let record = self.analyze(&request.repo_url).await?;
        let roast = self
            .generator
            .generate_or_apologize(&roast_prompt(&record), &GenerationOptions::roast())
            .await;
        Ok(RoastResponse {
            analysis: AnalysisSummary::from(&record),
            roast,
        })
    }

    /// Analyzes a repository and generates a README for it
    pub async fn readme(&self, request: &ReadmeRequest) -> Result<ReadmeResponse> {
        let record = self
            .analyze(&request.repo_url)
            .await?
            .with_project_facts(request.facts());
        let stack = record.stack();
        let readme = self
            .generator
            .generate(&readme_prompt(&record, None), &GenerationOptions::readme())
            .await?;
        Ok(ReadmeResponse { readme, stack })
    }
}
