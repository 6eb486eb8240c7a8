//! Naive credential detection for `.env`-like files.

use once_cell::sync::Lazy;
use regex::Regex;

/// A tagged detection pattern
#[derive(Debug)]
pub struct SecretRule {
    /// Stable rule identifier
    pub id: &'static str,
    /// Case-insensitive pattern; the whole match is reported
    pub pattern: Regex,
}

static DEFAULT_RULES: Lazy<Vec<SecretRule>> = Lazy::new(|| {
    vec![
        SecretRule {
            id: "generic-key-assignment",
            pattern: Regex::new(
                r#"(?i)(api[_-]key|apikey|secret|password|token)[\w-]*\s*[=:]\s*['"]([^'"]*)['"]"#,
            )
            .expect("generic secret pattern is valid"),
        },
        SecretRule {
            id: "aws-access-key-id",
            pattern: Regex::new(r#"(?i)aws[_-]access[_-]key[_-]id\s*[=:]\s*['"]([^'"]*)['"]"#)
                .expect("aws secret pattern is valid"),
        },
    ]
});

/// Regex scanner over an ordered rule list
pub struct SecretScanner {
    rules: &'static [SecretRule],
}

impl SecretScanner {
    /// Scanner with the built-in rules
    pub fn new() -> Self {
        Self { rules: &DEFAULT_RULES }
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[SecretRule] {
        self.rules
    }

    /// Returns every match of every rule, rule by rule, in discovery order.
    /// Overlapping hits from different rules are all kept.
    pub fn scan(&self, content: &str) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|rule| rule.pattern.find_iter(content).map(|m| m.as_str().to_string()))
            .collect()
    }
}

impl Default for SecretScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans `content` with the built-in rules
pub fn scan_secrets(content: &str) -> Vec<String> {
    SecretScanner::new().scan(content)
}
