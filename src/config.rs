// Configuration loading.
// Reads an optional TOML file; every setting falls back to a built-in default.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{DEFAULT_TTL, REPOSITORIES_KEY, paths};
use crate::error::{FolioError, Result};
use crate::github::Repository;
use crate::github::client::GITHUB_API_BASE;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub cache: CacheConfig,
    pub pinned: PinnedConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Account whose repositories are shown.
    pub username: String,
    pub api_base: String,
    /// Host accepted in repository URLs handed to the README viewer.
    pub web_host: String,
    /// Repository names never shown.
    pub excluded_repos: Vec<String>,
    /// Environment variable holding an optional API token.
    pub token_env: String,
    /// Repositories shown in the showcase carousel.
    pub max_projects: usize,
    /// Language badges per card.
    pub max_languages: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            username: "daniel-kindl".to_string(),
            api_base: GITHUB_API_BASE.to_string(),
            web_host: "github.com".to_string(),
            excluded_repos: Vec::new(),
            token_env: "GITHUB_TOKEN".to_string(),
            max_projects: 12,
            max_languages: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub key: String,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: REPOSITORIES_KEY.to_string(),
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinnedConfig {
    /// URL or local path of the pinned-repos JSON file.
    pub source: String,
    /// Shown when the source is unavailable or empty.
    pub fallback: Vec<Repository>,
}

impl Default for PinnedConfig {
    fn default() -> Self {
        Self {
            source: "data/pinned-repos.json".to_string(),
            fallback: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub description_max_length: usize,
    pub projects_per_page: usize,
    pub language_icons: BTreeMap<String, String>,
    pub default_language_icon: String,
    pub project_icon: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        let language_icons = [
            ("JavaScript", "JS"),
            ("TypeScript", "TS"),
            ("Python", "🐍"),
            ("Java", "☕"),
            ("C#", "#"),
            ("C++", "++"),
            ("C", "C"),
            ("Ruby", "💎"),
            ("Go", "Go"),
            ("Rust", "🦀"),
            ("PHP", "🐘"),
            ("Swift", "🐦"),
            ("Kotlin", "K"),
            ("HTML", "<>"),
            ("CSS", "🎨"),
            ("Shell", "$"),
            ("Dockerfile", "🐳"),
            ("Vue", "V"),
        ]
        .into_iter()
        .map(|(lang, icon)| (lang.to_string(), icon.to_string()))
        .collect();

        Self {
            description_max_length: 120,
            projects_per_page: 6,
            language_icons,
            default_language_icon: "</>".to_string(),
            project_icon: "📁".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file just yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match paths::config_path() {
                Some(default) if default.exists() => Self::from_file(&default),
                _ => {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| FolioError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&contents)
            .map_err(|e| FolioError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| FolioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.github.username.trim().is_empty() {
            return Err(FolioError::Config("github.username is empty".to_string()));
        }
        if self.ui.projects_per_page == 0 {
            return Err(FolioError::Config(
                "ui.projects_per_page must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.github.api_base)
            .map_err(|e| FolioError::Config(format!("github.api_base: {}", e)))?;
        Ok(())
    }

    /// API token from the configured environment variable, if set and non-empty.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.github.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    /// API base without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.github.api_base.trim_end_matches('/')
    }
}
