// README retrieval and rendering.
// Resolves a repository URL, fetches its README, and renders it with a fallback panel on failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FolioError, Result};
use crate::markdown::{LinkRewriter, MarkdownRenderer, escape_html};

use super::client::Transport;
use super::types::{ReadmeDocument, ReadmePayload};

/// Owner and name taken from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

/// Parse `https://{host}/{owner}/{repo}[/...]`.
pub fn parse_repo_url(input: &str, host: &str) -> Result<RepoRef> {
    let invalid = || FolioError::InvalidRepoUrl(input.to_string());

    let url = Url::parse(input.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    if !url
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case(host))
    {
        return Err(invalid());
    }

    let mut segments = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = segments.next().ok_or_else(invalid)?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return Err(invalid());
    }

    Ok(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// Decode GitHub's line-wrapped base64 into UTF-8 text.
pub fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| FolioError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| FolioError::Decode(e.to_string()))
}

/// A successfully rendered README.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadmeView {
    /// `owner/repo`.
    pub title: String,
    pub html_url: String,
    /// Source text for terminal display, link targets already absolute.
    pub markdown: String,
    pub html: String,
}

/// Shown instead of a README that could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadmeFallback {
    pub repo_url: String,
    pub message: String,
    pub html: String,
}

impl ReadmeFallback {
    const MESSAGE: &'static str =
        "Could not load README. It might not exist or the API limit was reached.";

    pub fn new(repo_url: &str) -> Self {
        let html = format!(
            r#"<div class="readme-error"><p>{}</p><a href="{}" target="_blank" rel="noopener noreferrer">View on GitHub</a></div>"#,
            Self::MESSAGE,
            escape_html(repo_url)
        );
        Self {
            repo_url: repo_url.to_string(),
            message: Self::MESSAGE.to_string(),
            html,
        }
    }
}

/// README panel lifecycle: `Idle -> Loading -> {Rendered | Error} -> Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReadmeState {
    #[default]
    Idle,
    Loading { repo_url: String },
    Rendered(ReadmeView),
    Error(ReadmeFallback),
}

impl ReadmeState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ReadmeState::Loading { .. })
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, ReadmeState::Idle)
    }

    pub fn close(&mut self) {
        *self = ReadmeState::Idle;
    }
}

/// Clears the in-flight flag when an open finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ReadmeFetcher {
    transport: Arc<dyn Transport>,
    renderer: Arc<dyn MarkdownRenderer>,
    api_base: String,
    web_host: String,
    in_flight: AtomicBool,
}

impl ReadmeFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        renderer: Arc<dyn MarkdownRenderer>,
        api_base: impl Into<String>,
        web_host: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            renderer,
            api_base: api_base.into(),
            web_host: web_host.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Load and render the README for `repo_url`.
    ///
    /// Returns `None` without doing anything while another open is in flight.
    /// Otherwise resolves to `Rendered` or, on any failure, `Error`.
    pub async fn open(&self, repo_url: &str) -> Option<ReadmeState> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!(repo_url, "README already loading, ignoring open");
            return None;
        };

        let state = match self.load(repo_url).await {
            Ok(view) => ReadmeState::Rendered(view),
            Err(e) => {
                warn!(repo_url, error = %e, "README unavailable");
                ReadmeState::Error(ReadmeFallback::new(repo_url))
            }
        };
        Some(state)
    }

    async fn load(&self, repo_url: &str) -> Result<ReadmeView> {
        let repo = parse_repo_url(repo_url, &self.web_host)?;
        let document = self.fetch_document(&repo).await?;
        self.render_document(&document)
    }

    pub async fn fetch_document(&self, repo: &RepoRef) -> Result<ReadmeDocument> {
        let url = format!("{}/repos/{}/{}/readme", self.api_base, repo.owner, repo.repo);
        let payload: ReadmePayload = self.transport.get(&url).await?.error_for_status()?.json()?;

        Ok(ReadmeDocument {
            owner_login: repo.owner.clone(),
            repo_name: repo.repo.clone(),
            raw_base64_content: payload.content,
            html_url: payload.html_url,
            download_url: payload.download_url,
        })
    }

    pub fn render_document(&self, document: &ReadmeDocument) -> Result<ReadmeView> {
        let markdown = decode_content(&document.raw_base64_content)?;
        let links = LinkRewriter::for_document(&document.html_url, &document.download_url);
        let html = self.renderer.render(&markdown, &links);

        Ok(ReadmeView {
            title: format!("{}/{}", document.owner_login, document.repo_name),
            html_url: document.html_url.clone(),
            markdown: links.rewrite_markdown(&markdown),
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::HttpResponse;
    use crate::github::client::mock::MockTransport;
    use crate::markdown::CmarkRenderer;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    const REPO_URL: &str = "https://github.com/o/r";
    const README_URL: &str = "https://api.test/repos/o/r/readme";

    fn wrapped_base64(text: &str) -> String {
        let encoded = STANDARD.encode(text);
        encoded
            .as_bytes()
            .chunks(60)
            .map(|chunk| std::str::from_utf8(chunk).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn readme_body(markdown: &str) -> String {
        serde_json::json!({
            "content": wrapped_base64(markdown),
            "html_url": "https://github.com/o/r/blob/main/README.md",
            "download_url": "https://raw.githubusercontent.com/o/r/main/README.md",
        })
        .to_string()
    }

    fn fetcher(transport: Arc<dyn Transport>) -> ReadmeFetcher {
        ReadmeFetcher::new(transport, Arc::new(CmarkRenderer), "https://api.test", "github.com")
    }

    #[test]
    fn test_parse_repo_url() {
        let parsed = parse_repo_url("https://github.com/o/r", "github.com").unwrap();
        assert_eq!(
            parsed,
            RepoRef {
                owner: "o".to_string(),
                repo: "r".to_string()
            }
        );

        let parsed = parse_repo_url("https://github.com/o/r.git/", "github.com").unwrap();
        assert_eq!(parsed.repo, "r");

        let parsed = parse_repo_url("https://github.com/o/r/tree/main/docs", "github.com").unwrap();
        assert_eq!(parsed.owner, "o");
        assert_eq!(parsed.repo, "r");
    }

    #[test]
    fn test_parse_repo_url_rejects() {
        for input in [
            "https://github.com/o",
            "https://github.com/",
            "https://gitlab.com/o/r",
            "https://github.com.evil.test/o/r",
            "ftp://github.com/o/r",
            "github.com/o/r",
            "not a url",
        ] {
            assert!(
                matches!(parse_repo_url(input, "github.com"), Err(FolioError::InvalidRepoUrl(_))),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_decode_multibyte() {
        let text = "# Projekt 🚀\n\nGrüße aus Köln, ✨ emoji 👩‍💻\n";
        assert_eq!(decode_content(&wrapped_base64(text)).unwrap(), text);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_content("%%%"), Err(FolioError::Decode(_))));
        // Valid base64, invalid UTF-8.
        assert!(matches!(decode_content("/w=="), Err(FolioError::Decode(_))));
    }

    #[tokio::test]
    async fn test_open_renders() {
        let transport = Arc::new(MockTransport::new().respond(
            README_URL,
            200,
            readme_body("# Hello 🌍\n\nSee [guide](./docs/guide.md)."),
        ));

        let state = fetcher(transport).open(REPO_URL).await.unwrap();
        let ReadmeState::Rendered(view) = state else {
            panic!("expected rendered README, got {:?}", state);
        };
        assert_eq!(view.title, "o/r");
        assert!(view.markdown.starts_with("# Hello 🌍"));
        assert!(view.markdown.contains("[guide](https://github.com/o/r/blob/main/docs/guide.md)"));
        assert!(view.html.contains("https://github.com/o/r/blob/main/docs/guide.md"));
    }

    #[tokio::test]
    async fn test_open_missing_readme_falls_back() {
        let transport = Arc::new(MockTransport::new().respond(README_URL, 404, "{}"));
        let fetcher = fetcher(transport);

        let state = fetcher.open(REPO_URL).await.unwrap();
        let ReadmeState::Error(fallback) = state else {
            panic!("expected fallback, got {:?}", state);
        };
        assert_eq!(fallback.repo_url, REPO_URL);
        assert!(fallback.html.contains("noopener"));
        assert!(!fetcher.is_loading());
    }

    #[tokio::test]
    async fn test_open_bad_url_skips_network() {
        let transport = Arc::new(MockTransport::new());
        let state = fetcher(transport.clone())
            .open("https://example.com/nothing")
            .await
            .unwrap();

        assert!(matches!(state, ReadmeState::Error(_)));
        assert_eq!(transport.request_count(), 0);
    }

    struct GatedTransport {
        inner: MockTransport,
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse> {
            self.started.notify_one();
            self.release.notified().await;
            self.inner.get(url).await
        }
    }

    #[tokio::test]
    async fn test_second_open_while_loading_is_ignored() {
        let transport = Arc::new(GatedTransport {
            inner: MockTransport::new().respond(README_URL, 200, readme_body("hi")),
            started: Notify::new(),
            release: Notify::new(),
        });
        let fetcher = Arc::new(fetcher(transport.clone()));

        let first = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.open(REPO_URL).await }
        });
        transport.started.notified().await;

        assert!(fetcher.is_loading());
        assert!(fetcher.open(REPO_URL).await.is_none());
        assert_eq!(transport.inner.request_count(), 0);

        transport.release.notify_one();
        let state = first.await.unwrap();
        assert!(matches!(state, Some(ReadmeState::Rendered(_))));

        // Guard released: a later open may retry.
        assert!(!fetcher.is_loading());
    }

    #[test]
    fn test_state_close() {
        let mut state = ReadmeState::Error(ReadmeFallback::new(REPO_URL));
        assert!(state.is_open());
        state.close();
        assert_eq!(state, ReadmeState::Idle);
        assert!(!state.is_loading());
    }
}
