//! Repository snapshot construction.
//!
//! [`SnapshotBuilder`] turns one repository's top-level listing, commits and
//! issues into an [`AnalysisRecord`]. The build is best-effort: a file that
//! cannot be fetched contributes empty content and the fold carries on.

/// README adequacy heuristic
pub mod readme;
/// Credential pattern scanner
pub mod secrets;
/// Technology stack detection
pub mod stack;

use crate::config::FetchLimits;
use crate::error::Result;
use crate::github::{CommitSummary, IssueSummary, RepoEntry, RepositorySource};
use futures::future::join_all;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use readme::{readme_needs_update, ReadmeHeuristic, ReadmeVerdict};
pub use secrets::{scan_secrets, SecretScanner};
pub use stack::{detect_stack, parse_manifest, StackInfo};

/// Manifest file names in priority order
pub const MANIFEST_FILES: &[&str] = &["package.json", "requirements.txt", "pyproject.toml"];

/// User-supplied facts merged into README generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFacts {
    /// What the project is for
    pub description: Option<String>,
    /// Notable features
    pub features: Option<String>,
    /// How to set the project up
    pub setup_instructions: Option<String>,
    /// Environment variables the project reads
    pub environment_variables: Option<String>,
}

impl ProjectFacts {
    /// `true` when no fact carries any text
    pub fn is_empty(&self) -> bool {
        [&self.description, &self.features, &self.setup_instructions, &self.environment_variables]
            .iter()
            .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// Normalised snapshot of one repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Top-level `README.md` present
    pub has_readme: bool,
    /// README body; `Some` exactly when `has_readme` is set
    pub readme_content: Option<String>,
    /// Outcome of the README heuristic; `true` when there is no README
    pub readme_needs_update: bool,
    /// A top-level name contains `.env`
    pub has_env_file: bool,
    /// Secret scanner hits across every `.env`-like file
    pub exposed_secrets: Vec<String>,
    /// Name of the manifest whose content is in `package_info`
    pub package_file: Option<String>,
    /// Raw manifest content
    pub package_info: Option<String>,
    /// Top-level names in listing order
    pub file_structure: Vec<String>,
    /// Newest commits first
    pub recent_commits: Vec<CommitSummary>,
    /// Open issues
    pub open_issues: Vec<IssueSummary>,
    /// User facts, only set for README generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_facts: Option<ProjectFacts>,
}

impl AnalysisRecord {
    /// Attaches user-supplied facts; empty facts are dropped
    pub fn with_project_facts(mut self, facts: ProjectFacts) -> Self {
        self.project_facts = if facts.is_empty() { None } else { Some(facts) };
        self
    }

    /// Runs stack detection over the listing and the selected manifest
    pub fn stack(&self) -> StackInfo {
        let raw = self.package_info.as_deref().unwrap_or_default();
        let parsed = self
            .package_file
            .as_deref()
            .and_then(|file| parse_manifest(file, raw));
        detect_stack(&self.file_structure, raw, parsed.as_ref())
    }
}

/// How a listing entry takes part in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryRole {
    Readme,
    EnvFile,
    Manifest,
    Listed,
}

fn classify(name: &str) -> EntryRole {
    let lower = name.to_lowercase();
    if lower == "readme.md" {
        EntryRole::Readme
    } else if lower.contains(".env") {
        EntryRole::EnvFile
    } else if MANIFEST_FILES.contains(&lower.as_str()) {
        EntryRole::Manifest
    } else {
        EntryRole::Listed
    }
}

/// Picks the index of the highest-priority manifest in the listing
fn select_manifest(entries: &[RepoEntry], roles: &[EntryRole]) -> Option<usize> {
    MANIFEST_FILES.iter().find_map(|manifest| {
        entries
            .iter()
            .zip(roles)
            .position(|(entry, role)| *role == EntryRole::Manifest && entry.name.eq_ignore_ascii_case(manifest))
    })
}

/// Builds [`AnalysisRecord`]s from a [`RepositorySource`]
pub struct SnapshotBuilder<'a> {
    source: &'a dyn RepositorySource,
    limits: FetchLimits,
}

impl<'a> SnapshotBuilder<'a> {
    /// Creates a builder over `source` with the given commit/issue bounds
    pub fn new(source: &'a dyn RepositorySource, limits: FetchLimits) -> Self {
        Self { source, limits }
    }

    /// Builds the snapshot for `owner/repo`.
    ///
    /// Returns `Ok(None)` when the repository is missing or its listing is
    /// empty. Errors only come from the listing call itself.
    pub async fn build(&self, owner: &str, repo: &str) -> Result<Option<AnalysisRecord>> {
        let entries = match self.source.list_top_level(owner, repo).await? {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                info!("No listing for {}/{}", owner, repo);
                return Ok(None);
            }
        };
        debug!("{}/{} has {} top-level entries", owner, repo, entries.len());

        let roles: Vec<EntryRole> = entries.iter().map(|e| classify(&e.name)).collect();
        let manifest = select_manifest(&entries, &roles);

        let contents = async {
            let fetches = entries.iter().zip(&roles).enumerate().map(|(idx, (entry, role))| async move {
                let wanted = match role {
                    EntryRole::Readme | EntryRole::EnvFile => true,
                    EntryRole::Manifest => Some(idx) == manifest,
                    EntryRole::Listed => false,
                };
                if !wanted {
                    return None;
                }
                Some(match entry.download_ref() {
                    Some(reference) => self.source.fetch_file_content(reference).await,
                    None => String::new(),
                })
            });
            join_all(fetches).await
        };

        let (contents, recent_commits, open_issues) = tokio::join!(
            contents,
            self.source.fetch_recent_commits(owner, repo, self.limits.commits),
            self.source.fetch_open_issues(owner, repo, self.limits.issues),
        );

        let scanner = SecretScanner::new();
        let initial = AnalysisRecord {
            recent_commits,
            open_issues,
            ..AnalysisRecord::default()
        };

        let mut record = entries
            .iter()
            .zip(roles)
            .zip(contents)
            .fold(initial, |mut record, ((entry, role), content)| {
                match (role, content) {
                    (EntryRole::Readme, Some(body)) if !record.has_readme => {
                        record.has_readme = true;
                        record.readme_content = Some(body);
                    }
                    (EntryRole::EnvFile, Some(body)) => {
                        record.has_env_file = true;
                        record.exposed_secrets.extend(scanner.scan(&body));
                    }
                    (EntryRole::Manifest, Some(body)) => {
                        record.package_file = Some(entry.name.clone());
                        record.package_info = Some(body);
                    }
                    _ => {}
                }
                record.file_structure.push(entry.name.clone());
                record
            });

        record.readme_needs_update = readme_needs_update(record.readme_content.as_deref());
        info!(
            "Snapshot of {}/{}: {} entries, readme={}, env files={}, secrets={}",
            owner,
            repo,
            record.file_structure.len(),
            record.has_readme,
            record.has_env_file,
            record.exposed_secrets.len()
        );
        Ok(Some(record))
    }
}

/// Builds the snapshot of `owner/repo` from `source`
pub async fn analyze_repository(
    source: &dyn RepositorySource,
    owner: &str,
    repo: &str,
    limits: FetchLimits,
) -> Result<Option<AnalysisRecord>> {
    SnapshotBuilder::new(source, limits).build(owner, repo).await
}
