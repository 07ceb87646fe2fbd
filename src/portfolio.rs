// Composition root.
// Builds and owns every fetcher from the configuration.

use std::sync::Arc;

use crate::cache::{CacheStore, Storage};
use crate::config::Config;
use crate::github::{
    FetcherSettings, PinnedRepoLoader, PinnedSource, ReadmeFetcher, RepositoryFetcher, Transport,
};
use crate::markdown::MarkdownRenderer;
use crate::view::CardOptions;

pub struct Portfolio {
    pub transport: Arc<dyn Transport>,
    pub repos: RepositoryFetcher,
    pub pinned: PinnedRepoLoader,
    pub readme: ReadmeFetcher,
    pub cards: CardOptions,
    pub username: String,
    pub max_projects: usize,
    pub page_size: usize,
}

impl Portfolio {
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        storage: Box<dyn Storage>,
        renderer: Arc<dyn MarkdownRenderer>,
    ) -> Self {
        let api_base = config.api_base().to_string();

        let repos = RepositoryFetcher::new(
            transport.clone(),
            CacheStore::new(storage),
            FetcherSettings {
                api_base: api_base.clone(),
                username: config.github.username.clone(),
                excluded: config.github.excluded_repos.iter().cloned().collect(),
                cache_key: config.cache.key.clone(),
                ttl: config.cache.ttl(),
                max_languages: config.github.max_languages,
            },
        );
        let pinned = PinnedRepoLoader::new(
            transport.clone(),
            PinnedSource::parse(&config.pinned.source),
            config.pinned.fallback.clone(),
        );
        let readme = ReadmeFetcher::new(
            transport.clone(),
            renderer,
            api_base,
            config.github.web_host.clone(),
        );

        Self {
            transport,
            repos,
            pinned,
            readme,
            cards: CardOptions::from_config(config),
            username: config.github.username.clone(),
            max_projects: config.github.max_projects,
            page_size: config.ui.projects_per_page,
        }
    }
}
