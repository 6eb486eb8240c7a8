use std::env;

/// Highest numbered `GEMINI_API_KEY_<n>` variable consulted
const MAX_NUMBERED_KEYS: usize = 9;

/// Returns the value of an environment variable, treating empty strings as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Splits a comma separated list, trimming entries and dropping empty ones
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collects Gemini API keys from the environment in rotation order.
///
/// `GEMINI_API_KEYS` (comma separated) wins when present. Otherwise the
/// keys are `GEMINI_API_KEY` followed by `GEMINI_API_KEY_1` ..
/// `GEMINI_API_KEY_9`. Duplicates are dropped, first occurrence kept.
pub fn collect_api_keys() -> Vec<String> {
    collect_api_keys_with(get_env_value)
}

pub(crate) fn collect_api_keys_with<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(list) = lookup("GEMINI_API_KEYS") {
        return clean_keys(parse_list(&list));
    }

    let mut keys = Vec::new();
    if let Some(key) = lookup("GEMINI_API_KEY") {
        keys.push(key);
    }
    for n in 1..=MAX_NUMBERED_KEYS {
        if let Some(key) = lookup(&format!("GEMINI_API_KEY_{}", n)) {
            keys.push(key);
        }
    }
    clean_keys(keys)
}

/// Trims credentials, dropping blank entries and duplicates
pub fn clean_keys(keys: Vec<String>) -> Vec<String> {
    dedup(
        keys.into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect(),
    )
}

fn dedup(keys: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(keys.len());
    for key in keys {
        if !seen.contains(&key) {
            seen.push(key);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_keys_list_takes_precedence() {
        let keys = collect_api_keys_with(lookup_from(&[
            ("GEMINI_API_KEYS", "k1,k2,k1"),
            ("GEMINI_API_KEY", "ignored"),
        ]));
        assert_eq!(keys, vec!["k1", "k2"]);
    }

    #[test]
    fn test_numbered_keys_follow_primary() {
        let keys = collect_api_keys_with(lookup_from(&[
            ("GEMINI_API_KEY_2", "third"),
            ("GEMINI_API_KEY", "first"),
            ("GEMINI_API_KEY_1", "second"),
        ]));
        assert_eq!(keys, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_no_keys() {
        assert!(collect_api_keys_with(lookup_from(&[])).is_empty());
    }

    #[test]
    fn test_clean_keys_drops_blanks() {
        let keys = vec!["".to_string(), " k ".to_string(), "   ".to_string(), "k".to_string()];
        assert_eq!(clean_keys(keys), vec!["k"]);
    }
}
