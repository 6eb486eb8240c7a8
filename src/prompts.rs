//! Prompt templates for the roast and README generations.
//!
//! Templates carry `{name}` placeholders filled by [`roast_prompt`] and
//! [`readme_prompt`]. Both functions are total: every absent field renders
//! as a fixed marker instead of failing.

use crate::analysis::{AnalysisRecord, ProjectFacts};
use crate::github::{CommitSummary, IssueSummary};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Characters of manifest content kept in the roast prompt
pub const ROAST_PACKAGE_INFO_LIMIT: usize = 1500;
/// Characters of manifest content kept in the README prompt
pub const README_PACKAGE_INFO_LIMIT: usize = 4000;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

const NONE: &str = "None";
const EMPTY_LIST: &str = "(none)";

/// Roast instructions around the snapshot facts
pub const REPOSITORY_ROAST: &str = r#"
You are a brutally honest senior engineer roasting a GitHub repository.

Repository facts:
- README: {readme_status}
- README needs an update: {readme_needs_update}
- .env-like files: {env_file_count}
- README-like files: {readme_file_count}
- Exposed secrets found: {secret_count}
- Top-level files: {files}

Recent commits:
{commits}

Open issues:
{issues}

Package info:
{package_info}

Rules:
1. Be harsh, sarcastic and funny. Mild profanity is allowed.
2. Never use slurs or attack people for who they are. Roast the code, not the humans.
3. Comment on code organization, commit messages, issue management, security practices and documentation quality.
4. Keep it short: at most 8 lines, no headings, no preamble."#;

/// README instructions around the stack, facts and listing
pub const README_GENERATION: &str = r#"
You are a technical writer. Write a complete README.md for the repository described below.

Detected stack:
{stack}

Project description: {description}
Key features: {features}
Setup instructions: {setup}
Environment variables: {env_vars}

Existing README:
{existing_readme}

Top-level files:
{files}

Package info:
{package_info}

The README must contain these sections, in order:
1. Title and a one-paragraph description
2. Features
3. Installation
4. Environment Variables
5. Usage
6. License

Rules:
- Output GitHub-flavored markdown only, with no commentary before or after it.
- Put every command and code sample in a fenced code block with a language tag.
- Add badges only for technologies listed in the detected stack.
- Never write placeholder text such as "TODO", "Lorem ipsum" or "your-project-name".
- Never invent features that the facts above do not support. When a section has no facts, keep it brief and generic."#;

/// Builds the roast prompt for a snapshot
pub fn roast_prompt(record: &AnalysisRecord) -> String {
    let env_file_count = count_names(&record.file_structure, |n| n.contains(".env"));
    let readme_file_count = count_names(&record.file_structure, |n| n.contains("readme"));

    fill(REPOSITORY_ROAST, |name| {
        Some(match name {
            "readme_status" => readme_status(record),
            "readme_needs_update" => yes_no(record.readme_needs_update).to_string(),
            "env_file_count" => env_file_count.to_string(),
            "readme_file_count" => readme_file_count.to_string(),
            "secret_count" => record.exposed_secrets.len().to_string(),
            "files" => inline_list(&record.file_structure),
            "commits" => format_commits(&record.recent_commits),
            "issues" => format_issues(&record.open_issues),
            "package_info" => optional_text(record.package_info.as_deref(), ROAST_PACKAGE_INFO_LIMIT),
            _ => return None,
        })
    })
}

/// Builds the README prompt for a snapshot.
///
/// `facts` takes precedence over the facts attached to the record.
pub fn readme_prompt(record: &AnalysisRecord, facts: Option<&ProjectFacts>) -> String {
    let facts = facts.or(record.project_facts.as_ref());
    let fact = |select: fn(&ProjectFacts) -> &Option<String>| {
        facts
            .and_then(|f| select(f).as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NONE)
            .to_string()
    };

    let existing_readme = match record.readme_content.as_deref() {
        Some(body) if !body.trim().is_empty() => body.to_string(),
        _ => NONE.to_string(),
    };

    fill(README_GENERATION, |name| {
        Some(match name {
            "stack" => record.stack().to_string(),
            "description" => fact(|f| &f.description),
            "features" => fact(|f| &f.features),
            "setup" => fact(|f| &f.setup_instructions),
            "env_vars" => fact(|f| &f.environment_variables),
            "existing_readme" => existing_readme.clone(),
            "files" => bullet_list(&record.file_structure),
            "package_info" => optional_text(record.package_info.as_deref(), README_PACKAGE_INFO_LIMIT),
            _ => return None,
        })
    })
}

/// Substitutes every `{name}` in one pass over the template.
///
/// Substituted text is never rescanned. Unknown names stay as written.
fn fill(template: &str, value: impl Fn(&str) -> Option<String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| value(&caps[1]).unwrap_or_else(|| caps[0].to_string()))
        .into_owned()
}

fn readme_status(record: &AnalysisRecord) -> String {
    match record.readme_content.as_deref() {
        None => "missing".to_string(),
        Some(body) if body.trim().is_empty() => "present but empty".to_string(),
        Some(body) => format!("present with {} characters", body.chars().count()),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn count_names(names: &[String], pred: impl Fn(&str) -> bool) -> usize {
    names.iter().filter(|n| pred(&n.to_lowercase())).count()
}

fn inline_list(items: &[String]) -> String {
    if items.is_empty() {
        EMPTY_LIST.to_string()
    } else {
        items.join(", ")
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return EMPTY_LIST.to_string();
    }
    items.iter().map(|i| format!("- {}", i)).collect::<Vec<_>>().join("\n")
}

fn format_commits(commits: &[CommitSummary]) -> String {
    if commits.is_empty() {
        return EMPTY_LIST.to_string();
    }
    commits
        .iter()
        .map(|c| {
            let subject = c.message.lines().next().unwrap_or_default();
            format!("- \"{}\" by {}", subject, c.author)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_issues(issues: &[IssueSummary]) -> String {
    if issues.is_empty() {
        return EMPTY_LIST.to_string();
    }
    issues
        .iter()
        .map(|i| format!("- [{}] {}", i.state, i.title))
        .collect::<Vec<_>>()
        .join("\n")
}

fn optional_text(text: Option<&str>, limit: usize) -> String {
    match text {
        Some(t) if !t.trim().is_empty() => truncate(t, limit),
        _ => NONE.to_string(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}\n...(truncated)", &text[..idx]),
        None => text.to_string(),
    }
}
