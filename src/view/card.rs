// Project card projection.
// Derives the display-only fields of a repository card.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::Url;

use crate::config::Config;
use crate::github::Repository;

/// Topics shown per card.
const MAX_TOPICS: usize = 3;

/// Display settings shared by every card.
#[derive(Debug, Clone)]
pub struct CardOptions {
    pub description_max_length: usize,
    pub max_languages: usize,
    pub language_icons: BTreeMap<String, String>,
    pub default_language_icon: String,
    pub project_icon: String,
}

impl CardOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            description_max_length: config.ui.description_max_length,
            max_languages: config.github.max_languages,
            language_icons: config.ui.language_icons.clone(),
            default_language_icon: config.ui.default_language_icon.clone(),
            project_icon: config.ui.project_icon.clone(),
        }
    }

    pub fn language_icon(&self, language: &str) -> &str {
        self.language_icons
            .get(language)
            .map(String::as_str)
            .unwrap_or(&self.default_language_icon)
    }
}

impl Default for CardOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechBadge {
    pub icon: String,
    pub name: String,
}

/// Everything a card displays. Absent data stays `None`/empty and is not drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableCard {
    pub name: String,
    pub html_url: String,
    pub icon: String,
    pub description: Option<String>,
    pub badges: Vec<TechBadge>,
    pub topics: Vec<String>,
    pub stars: u64,
    pub forks: u64,
    pub homepage: Option<String>,
    pub updated: Option<String>,
}

impl RenderableCard {
    /// Build a card. `languages` comes from a language lookup; when empty the
    /// repository's primary language is used instead.
    pub fn build(
        repo: &Repository,
        languages: &[String],
        options: &CardOptions,
        now: DateTime<Utc>,
    ) -> Self {
        let names: Vec<&str> = if languages.is_empty() {
            repo.language.as_deref().into_iter().collect()
        } else {
            languages.iter().map(String::as_str).collect()
        };
        let badges = names
            .into_iter()
            .take(options.max_languages)
            .map(|name| TechBadge {
                icon: options.language_icon(name).to_string(),
                name: name.to_string(),
            })
            .collect();

        Self {
            name: repo.name.clone(),
            html_url: repo.html_url.clone(),
            icon: options.project_icon.clone(),
            description: repo
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(|d| truncate_text(d, options.description_max_length)),
            badges,
            topics: repo.topics.iter().take(MAX_TOPICS).cloned().collect(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            homepage: repo.homepage.as_deref().and_then(normalize_homepage),
            updated: repo.updated_at.map(|at| relative_date(at, now)),
        }
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

/// Accept only http(s) homepages; scheme-less values are assumed https.
pub fn normalize_homepage(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url.to_string()),
        _ => None,
    }
}

/// Coarse "how long ago" label.
pub fn relative_date(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = now.signed_duration_since(at).num_days().abs();
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{} days ago", d),
        d if d < 30 => format!("{} weeks ago", d / 7),
        d if d < 365 => format!("{} months ago", d / 30),
        d => format!("{} years ago", d / 365),
    }
}
