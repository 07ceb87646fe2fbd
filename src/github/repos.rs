// Repository list and language fetching.
// Cache-first listing of the account's repositories plus per-repo language lookups.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::Result;

use super::client::Transport;
use super::types::{LanguageBreakdown, Repository, RepositoryWithLanguages};

/// Settings the fetcher needs from the configuration.
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub api_base: String,
    pub username: String,
    pub excluded: HashSet<String>,
    pub cache_key: String,
    pub ttl: Duration,
    pub max_languages: usize,
}

pub struct RepositoryFetcher {
    transport: Arc<dyn Transport>,
    cache: CacheStore,
    settings: FetcherSettings,
}

impl RepositoryFetcher {
    pub fn new(transport: Arc<dyn Transport>, cache: CacheStore, settings: FetcherSettings) -> Self {
        Self {
            transport,
            cache,
            settings,
        }
    }

    /// All public, non-fork, non-excluded repositories, most recently updated first.
    ///
    /// Served from cache while the stored list is fresh. Any failure yields an
    /// empty list.
    pub async fn fetch_all_repositories(&self) -> Vec<Repository> {
        if let Some(entry) = self.cache.get::<Vec<Repository>>(&self.settings.cache_key) {
            if entry.is_fresh(self.settings.ttl, Utc::now()) {
                debug!(count = entry.data.len(), "using cached repositories");
                return entry.data;
            }
        }

        match self.request_repositories().await {
            Ok(repos) => {
                let repos = self.filter_and_sort(repos);
                info!(count = repos.len(), "fetched repositories");
                self.cache.set(&self.settings.cache_key, &repos);
                repos
            }
            Err(e) => {
                warn!(user = %self.settings.username, error = %e, "fetching repositories failed");
                Vec::new()
            }
        }
    }

    /// Drop the cached list so the next fetch goes to the network.
    pub fn invalidate_cache(&self) {
        debug!(key = %self.settings.cache_key, "invalidating repository cache");
        self.cache.remove(&self.settings.cache_key);
    }

    async fn request_repositories(&self) -> Result<Vec<Repository>> {
        let url = format!(
            "{}/users/{}/repos?sort=updated&per_page=100",
            self.settings.api_base, self.settings.username
        );
        let response = self.transport.get(&url).await?.error_for_status()?;
        response.json()
    }

    fn filter_and_sort(&self, repos: Vec<Repository>) -> Vec<Repository> {
        let mut repos: Vec<Repository> = repos
            .into_iter()
            .filter(|repo| !repo.fork && !self.settings.excluded.contains(&repo.name))
            .collect();
        // Undated repositories sort last.
        repos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        repos
    }

    /// Leading languages of one repository, in API order. Empty on failure.
    pub async fn fetch_repository_languages(&self, repo_name: &str) -> Vec<String> {
        match self.request_languages(repo_name).await {
            Ok(languages) => languages
                .into_iter()
                .map(|(name, _)| name)
                .take(self.settings.max_languages)
                .collect(),
            Err(e) => {
                warn!(repo = repo_name, error = %e, "fetching languages failed");
                Vec::new()
            }
        }
    }

    async fn request_languages(&self, repo_name: &str) -> Result<LanguageBreakdown> {
        let url = format!(
            "{}/repos/{}/{}/languages",
            self.settings.api_base, self.settings.username, repo_name
        );
        let response = self.transport.get(&url).await?.error_for_status()?;
        response.json()
    }

    /// Pair the first `limit` repositories with their languages.
    ///
    /// Lookups run concurrently and are joined; output order matches input order.
    pub async fn fetch_repositories_with_languages(
        &self,
        repos: &[Repository],
        limit: usize,
    ) -> Vec<RepositoryWithLanguages> {
        let lookups = repos.iter().take(limit).map(|repo| async move {
            RepositoryWithLanguages {
                repo: repo.clone(),
                languages: self.fetch_repository_languages(&repo.name).await,
            }
        });
        join_all(lookups).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::MemoryStorage;
    use crate::cache::store::CacheEntry;
    use crate::github::client::mock::MockTransport;

    const REPOS_URL: &str = "https://api.test/users/octo/repos?sort=updated&per_page=100";

    fn settings() -> FetcherSettings {
        FetcherSettings {
            api_base: "https://api.test".to_string(),
            username: "octo".to_string(),
            excluded: ["secret".to_string()].into_iter().collect(),
            cache_key: "github_portfolio_data_v2".to_string(),
            ttl: Duration::from_secs(3600),
            max_languages: 2,
        }
    }

    fn fetcher(transport: Arc<MockTransport>) -> RepositoryFetcher {
        RepositoryFetcher::new(
            transport,
            CacheStore::new(Box::new(MemoryStorage::new())),
            settings(),
        )
    }

    fn repo(name: &str, updated: Option<&str>, fork: bool) -> Repository {
        Repository {
            name: name.to_string(),
            description: None,
            html_url: format!("https://github.com/octo/{}", name),
            language: None,
            topics: Vec::new(),
            stargazers_count: 0,
            forks_count: 0,
            homepage: None,
            updated_at: updated.map(|s| s.parse().unwrap()),
            fork,
        }
    }

    fn listing() -> String {
        serde_json::to_string(&vec![
            repo("old", Some("2023-01-01T00:00:00Z"), false),
            repo("forked", Some("2024-06-01T00:00:00Z"), true),
            repo("undated", None, false),
            repo("secret", Some("2024-05-01T00:00:00Z"), false),
            repo("new", Some("2024-04-01T00:00:00Z"), false),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_filters_forks_and_excluded_and_sorts() {
        let transport = Arc::new(MockTransport::new().respond(REPOS_URL, 200, listing()));
        let fetcher = fetcher(transport);

        let repos = fetcher.fetch_all_repositories().await;
        let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["new", "old", "undated"]);
        assert!(repos.iter().all(|r| !r.fork && r.name != "secret"));
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_uses_cache() {
        let transport = Arc::new(MockTransport::new().respond(REPOS_URL, 200, listing()));
        let fetcher = fetcher(transport.clone());

        let first = fetcher.fetch_all_repositories().await;
        let second = fetcher.fetch_all_repositories().await;

        assert_eq!(first, second);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_cache_forces_refetch() {
        let transport = Arc::new(MockTransport::new().respond(REPOS_URL, 200, listing()));
        let fetcher = fetcher(transport.clone());

        fetcher.fetch_all_repositories().await;
        fetcher.invalidate_cache();
        fetcher.fetch_all_repositories().await;

        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let transport = Arc::new(MockTransport::new().respond(REPOS_URL, 200, listing()));
        let fetcher = fetcher(transport.clone());

        let stale = vec![repo("stale", None, false)];
        let stored_at = Utc::now() - chrono::Duration::hours(2);
        fetcher
            .cache
            .put("github_portfolio_data_v2", &CacheEntry::at(stale, stored_at));

        let repos = fetcher.fetch_all_repositories().await;
        assert_eq!(transport.request_count(), 1);
        assert_eq!(repos.len(), 3);
    }

    #[tokio::test]
    async fn test_http_failure_returns_empty() {
        let transport = Arc::new(MockTransport::new().respond(REPOS_URL, 500, "oops"));
        let fetcher = fetcher(transport.clone());

        assert!(fetcher.fetch_all_repositories().await.is_empty());
        // Failures are not cached.
        assert!(fetcher.fetch_all_repositories().await.is_empty());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_listing_returns_empty() {
        let transport = Arc::new(MockTransport::new().respond(REPOS_URL, 200, "{\"message\":1}"));
        assert!(fetcher(transport).fetch_all_repositories().await.is_empty());
    }

    #[tokio::test]
    async fn test_languages_truncated_in_api_order() {
        let transport = Arc::new(MockTransport::new().respond(
            "https://api.test/repos/octo/folio/languages",
            200,
            r#"{"Rust": 9000, "Shell": 10, "Nix": 5000}"#,
        ));

        let languages = fetcher(transport).fetch_repository_languages("folio").await;
        assert_eq!(languages, vec!["Rust", "Shell"]);
    }

    #[tokio::test]
    async fn test_one_language_failure_is_isolated() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(
                    "https://api.test/repos/octo/a/languages",
                    200,
                    r#"{"Rust": 1}"#,
                )
                .respond(
                    "https://api.test/repos/octo/b/languages",
                    403,
                    r#"{"message": "API rate limit exceeded"}"#,
                )
                .respond(
                    "https://api.test/repos/octo/c/languages",
                    200,
                    r#"{"Go": 1, "C": 2}"#,
                ),
        );
        let fetcher = fetcher(transport.clone());
        let repos = vec![
            repo("a", None, false),
            repo("b", None, false),
            repo("c", None, false),
            repo("d", None, false),
        ];

        let paired = fetcher.fetch_repositories_with_languages(&repos, 3).await;

        assert_eq!(paired.len(), 3);
        assert_eq!(paired[0].languages, vec!["Rust"]);
        assert!(paired[1].languages.is_empty());
        assert_eq!(paired[2].languages, vec!["Go", "C"]);
        assert_eq!(transport.request_count(), 3);
    }
}
