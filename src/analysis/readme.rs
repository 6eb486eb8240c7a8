//! README adequacy heuristic.
//!
//! Three ordered rules decide whether an existing README should be
//! regenerated: too short, scaffold boilerplate, or too few of the topic
//! headings a useful README carries. The first rule that fires wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Trimmed length below which a README is considered a stub
pub const MIN_README_CHARS: usize = 50;
/// Distinct topics an adequate README must cover
pub const MIN_TOPICS: usize = 2;

/// Outcome of the heuristic, tagged with the rule that decided it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadmeVerdict {
    /// No README, or fewer than [`MIN_README_CHARS`] characters after trimming
    TooShort,
    /// Matches a scaffold or placeholder signature
    Boilerplate(&'static str),
    /// Covers fewer than [`MIN_TOPICS`] topics
    MissingTopics(usize),
    /// Covers at least [`MIN_TOPICS`] topics
    Adequate(usize),
}

impl ReadmeVerdict {
    /// Whether the README should be regenerated
    pub fn needs_update(self) -> bool {
        !matches!(self, Self::Adequate(_))
    }
}

struct Signature {
    name: &'static str,
    pattern: Regex,
}

struct Topic {
    name: &'static str,
    heading: Regex,
}

fn signature(name: &'static str, pattern: &str) -> Signature {
    Signature {
        name,
        pattern: Regex::new(pattern).expect("boilerplate signature is valid"),
    }
}

fn topic(name: &'static str, keywords: &str) -> Topic {
    // A markdown heading line mentioning one of the keywords
    let pattern = format!(r"(?im)^\s{{0,3}}#{{1,6}}[^\n]*\b({})\b", keywords);
    Topic {
        name,
        heading: Regex::new(&pattern).expect("topic heading pattern is valid"),
    }
}

static SIGNATURES: Lazy<Vec<Signature>> = Lazy::new(|| {
    vec![
        signature("create-react-app", r"(?i)bootstrapped with \[?create react app"),
        signature("create-react-app", r"(?i)getting started with create react app"),
        signature("create-next-app", r"(?i)this is a \[?next\.js\]?(\([^)]*\))? project bootstrapped with"),
        signature("vite-template", r"(?i)this template provides a minimal setup to get react working in vite"),
        signature(
            "placeholder",
            r"(?i)this readme would normally document whatever steps are necessary",
        ),
        signature("bare-heading", r"\A\s*#[^\n]*\s*\z"),
    ]
});

static TOPICS: Lazy<Vec<Topic>> = Lazy::new(|| {
    vec![
        topic("installation", r"installation|install|setup|getting started"),
        topic("usage", r"usage|features|how to use|examples?"),
        topic("configuration", r"configuration|config|environment|env variables"),
        topic("prerequisites", r"prerequisites|requirements|dependencies"),
    ]
});

/// Ordered-rule README classifier
pub struct ReadmeHeuristic;

impl ReadmeHeuristic {
    /// Applies the rules in order and reports which one decided
    pub fn evaluate(content: Option<&str>) -> ReadmeVerdict {
        let text = match content {
            Some(text) if text.trim().chars().count() >= MIN_README_CHARS => text,
            _ => return ReadmeVerdict::TooShort,
        };

        if let Some(sig) = SIGNATURES.iter().find(|s| s.pattern.is_match(text)) {
            return ReadmeVerdict::Boilerplate(sig.name);
        }

        let covered = Self::topics_covered(text).len();
        if covered < MIN_TOPICS {
            ReadmeVerdict::MissingTopics(covered)
        } else {
            ReadmeVerdict::Adequate(covered)
        }
    }

    /// `true` when the README should be regenerated
    pub fn is_incomplete(content: Option<&str>) -> bool {
        Self::evaluate(content).needs_update()
    }

    /// Names of the topics that appear as headings
    pub fn topics_covered(text: &str) -> Vec<&'static str> {
        TOPICS
            .iter()
            .filter(|t| t.heading.is_match(text))
            .map(|t| t.name)
            .collect()
    }
}

/// Shorthand for [`ReadmeHeuristic::is_incomplete`]
pub fn readme_needs_update(content: Option<&str>) -> bool {
    ReadmeHeuristic::is_incomplete(content)
}
