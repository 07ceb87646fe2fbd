// GitHub API response types.
// Defines structs for deserializing GitHub REST API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public repository as consumed by the portfolio.
///
/// Also the shape of pinned-repo data files and configured fallbacks, so
/// everything except `name` and `html_url` is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    /// Owner-supplied URL, not validated by GitHub.
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fork: bool,
}

impl Repository {
    /// Primary language followed by topics, skipping absent values.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.language
            .as_deref()
            .into_iter()
            .chain(self.topics.iter().map(String::as_str))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `GET /repos/{owner}/{repo}/readme`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadmePayload {
    pub content: String,
    pub html_url: String,
    pub download_url: String,
}

/// README fetched for one modal open.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadmeDocument {
    pub owner_login: String,
    pub repo_name: String,
    pub raw_base64_content: String,
    pub html_url: String,
    pub download_url: String,
}

/// Language name to byte count, in API order.
pub type LanguageBreakdown = serde_json::Map<String, serde_json::Value>;

/// Repository paired with its leading languages.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryWithLanguages {
    pub repo: Repository,
    pub languages: Vec<String>,
}

/// Body of the pinned-repos data file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinnedReposFile {
    #[serde(default)]
    pub repos: Vec<Repository>,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_from_api_record() {
        let json = r#"{
            "id": 1,
            "name": "folio",
            "description": null,
            "html_url": "https://github.com/o/folio",
            "language": "Rust",
            "topics": ["tui", "portfolio"],
            "stargazers_count": 5,
            "forks_count": 1,
            "homepage": "",
            "updated_at": "2024-05-01T12:00:00Z",
            "fork": false
        }"#;

        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.name, "folio");
        assert_eq!(repo.description, None);
        assert_eq!(repo.topics, vec!["tui", "portfolio"]);
        assert_eq!(repo.stargazers_count, 5);
        assert!(repo.updated_at.is_some());
        assert_eq!(repo.tags().collect::<Vec<_>>(), vec!["Rust", "tui", "portfolio"]);
    }

    #[test]
    fn test_repository_tolerates_missing_fields() {
        let json = r#"{"name": "bare", "html_url": "https://github.com/o/bare", "topics": null}"#;

        let repo: Repository = serde_json::from_str(json).unwrap();
        assert!(repo.language.is_none());
        assert!(repo.topics.is_empty());
        assert!(!repo.fork);
        assert_eq!(repo.tags().count(), 0);
    }

    #[test]
    fn test_language_breakdown_keeps_api_order() {
        let json = r#"{"TypeScript": 10, "Rust": 500, "C": 3}"#;
        let langs: LanguageBreakdown = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = langs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["TypeScript", "Rust", "C"]);
    }
}
