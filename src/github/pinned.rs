// Pinned repository loading.
// Reads the curated repo list from a URL or file, falling back to configured entries.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;

use super::client::Transport;
use super::types::{PinnedReposFile, Repository};

/// Where the pinned-repos JSON lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinnedSource {
    Url(String),
    File(PathBuf),
}

impl PinnedSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            PinnedSource::Url(source.to_string())
        } else {
            PinnedSource::File(PathBuf::from(source))
        }
    }
}

pub struct PinnedRepoLoader {
    transport: Arc<dyn Transport>,
    source: PinnedSource,
    fallback: Vec<Repository>,
}

impl PinnedRepoLoader {
    pub fn new(
        transport: Arc<dyn Transport>,
        source: PinnedSource,
        fallback: Vec<Repository>,
    ) -> Self {
        Self {
            transport,
            source,
            fallback,
        }
    }

    /// Pinned repositories, or the fallback list when the source fails or is empty.
    pub async fn get_pinned_repos(&self) -> Vec<Repository> {
        match self.load().await {
            Ok(file) if !file.repos.is_empty() => {
                debug!(count = file.repos.len(), "loaded pinned repositories");
                file.repos
            }
            Ok(_) => {
                debug!("pinned repository list empty, using fallback");
                self.fallback.clone()
            }
            Err(e) => {
                warn!(source = ?self.source, error = %e, "loading pinned repositories failed");
                self.fallback.clone()
            }
        }
    }

    async fn load(&self) -> Result<PinnedReposFile> {
        let body = match &self.source {
            PinnedSource::Url(url) => self.transport.get(url).await?.error_for_status()?.body,
            PinnedSource::File(path) => tokio::fs::read_to_string(path).await?,
        };
        Ok(serde_json::from_str(&body)?)
    }
}
