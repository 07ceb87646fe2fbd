// App state and main event loop.
// Manages tabs, background loads, and keyboard input handling.

use std::io;
use std::sync::Arc;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

use crate::github::{ReadmeState, Repository, RepositoryWithLanguages};
use crate::portfolio::Portfolio;
use crate::state::{LoadingState, RequestGuard};
use crate::ui;
use crate::view::{Carousel, GalleryState, merge_projects};

/// Active tab in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Pinned,
    Showcase,
    Projects,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Pinned, Tab::Showcase, Tab::Projects];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Pinned => "Pinned",
            Tab::Showcase => "Showcase",
            Tab::Projects => "Projects",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Pinned => Tab::Showcase,
            Tab::Showcase => Tab::Projects,
            Tab::Projects => Tab::Pinned,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Pinned => Tab::Projects,
            Tab::Showcase => Tab::Pinned,
            Tab::Projects => Tab::Showcase,
        }
    }
}

/// Results delivered from background loads.
#[derive(Debug)]
pub enum AppEvent {
    PinnedLoaded {
        ticket: u64,
        repos: Vec<Repository>,
    },
    ShowcaseLoaded {
        ticket: u64,
        projects: Vec<RepositoryWithLanguages>,
    },
    ProjectsLoaded {
        ticket: u64,
        projects: Vec<Repository>,
    },
    ReadmeLoaded {
        ticket: u64,
        state: ReadmeState,
    },
    /// The fetcher refused the open because another one held it.
    ReadmeDeclined {
        ticket: u64,
    },
}

/// Main application state.
pub struct App {
    /// Currently active tab.
    pub active_tab: Tab,
    /// Whether the app should exit.
    pub should_quit: bool,
    /// Whether the key help overlay is shown.
    pub show_help: bool,

    pub pinned: LoadingState<Vec<Repository>>,
    pub pinned_list: ListState,
    pinned_guard: RequestGuard,

    pub showcase: LoadingState<Vec<RepositoryWithLanguages>>,
    pub carousel: Carousel,
    showcase_guard: RequestGuard,

    pub projects: LoadingState<GalleryState>,
    pub projects_list: ListState,
    projects_guard: RequestGuard,

    pub readme: ReadmeState,
    pub readme_scroll: u16,
    readme_guard: RequestGuard,

    portfolio: Arc<Portfolio>,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(portfolio: Arc<Portfolio>) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            active_tab: Tab::default(),
            should_quit: false,
            show_help: false,
            pinned: LoadingState::Idle,
            pinned_list: ListState::default(),
            pinned_guard: RequestGuard::new(),
            showcase: LoadingState::Idle,
            carousel: Carousel::default(),
            showcase_guard: RequestGuard::new(),
            projects: LoadingState::Idle,
            projects_list: ListState::default(),
            projects_guard: RequestGuard::new(),
            readme: ReadmeState::Idle,
            readme_scroll: 0,
            readme_guard: RequestGuard::new(),
            portfolio,
            events_tx,
            events_rx,
        }
    }

    pub fn portfolio(&self) -> Arc<Portfolio> {
        self.portfolio.clone()
    }

    /// Main event loop. Must be called from within a tokio runtime.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        self.load_pinned();
        self.load_showcase();
        self.load_projects();

        while !self.should_quit {
            self.drain_events();
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Apply every finished background load.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::PinnedLoaded { ticket, repos } => {
                if !self.pinned_guard.is_current(ticket) {
                    debug!(ticket, "discarding superseded pinned load");
                    return;
                }
                self.pinned_list
                    .select(if repos.is_empty() { None } else { Some(0) });
                self.pinned = LoadingState::Loaded(repos);
            }
            AppEvent::ShowcaseLoaded { ticket, projects } => {
                if !self.showcase_guard.is_current(ticket) {
                    debug!(ticket, "discarding superseded showcase load");
                    return;
                }
                self.carousel = Carousel::new(projects.len());
                self.showcase = LoadingState::Loaded(projects);
            }
            AppEvent::ProjectsLoaded { ticket, projects } => {
                if !self.projects_guard.is_current(ticket) {
                    debug!(ticket, "discarding superseded projects load");
                    return;
                }
                let mut gallery = GalleryState::new(self.portfolio.page_size);
                gallery.set_projects(projects);
                self.projects_list
                    .select(if gallery.visible().is_empty() { None } else { Some(0) });
                self.projects = LoadingState::Loaded(gallery);
            }
            AppEvent::ReadmeLoaded { ticket, state } => {
                if !self.readme_guard.is_current(ticket) || !self.readme.is_loading() {
                    debug!(ticket, "discarding README for closed panel");
                    return;
                }
                self.readme = state;
                self.readme_scroll = 0;
            }
            AppEvent::ReadmeDeclined { ticket } => {
                if self.readme_guard.is_current(ticket) && self.readme.is_loading() {
                    debug!(ticket, "README open declined, closing panel");
                    self.readme.close();
                }
            }
        }
    }

    fn load_pinned(&mut self) {
        let ticket = self.pinned_guard.begin();
        self.pinned = LoadingState::Loading;

        let portfolio = self.portfolio.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let repos = portfolio.pinned.get_pinned_repos().await;
            let _ = tx.send(AppEvent::PinnedLoaded { ticket, repos });
        });
    }

    fn load_showcase(&mut self) {
        let ticket = self.showcase_guard.begin();
        self.showcase = LoadingState::Loading;

        let portfolio = self.portfolio.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let repos = portfolio.repos.fetch_all_repositories().await;
            let projects = portfolio
                .repos
                .fetch_repositories_with_languages(&repos, portfolio.max_projects)
                .await;
            let _ = tx.send(AppEvent::ShowcaseLoaded { ticket, projects });
        });
    }

    fn load_projects(&mut self) {
        let ticket = self.projects_guard.begin();
        self.projects = LoadingState::Loading;

        let portfolio = self.portfolio.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let (featured, fetched) = tokio::join!(
                portfolio.pinned.get_pinned_repos(),
                portfolio.repos.fetch_all_repositories()
            );
            let projects = merge_projects(featured, fetched);
            let _ = tx.send(AppEvent::ProjectsLoaded { ticket, projects });
        });
    }

    /// Open the README panel for `repo_url`.
    ///
    /// Ignored while a README is still loading, including one whose panel
    /// was already closed.
    pub fn open_readme(&mut self, repo_url: String) {
        if self.readme.is_loading() || self.portfolio.readme.is_loading() {
            debug!(%repo_url, "README already loading");
            return;
        }

        let ticket = self.readme_guard.begin();
        self.readme = ReadmeState::Loading {
            repo_url: repo_url.clone(),
        };
        self.readme_scroll = 0;

        let portfolio = self.portfolio.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match portfolio.readme.open(&repo_url).await {
                Some(state) => AppEvent::ReadmeLoaded { ticket, state },
                None => AppEvent::ReadmeDeclined { ticket },
            };
            let _ = tx.send(event);
        });
    }

    pub fn close_readme(&mut self) {
        self.readme_guard.begin();
        self.readme.close();
        self.readme_scroll = 0;
    }

    /// Reload the data behind the active tab, bypassing the repository cache.
    fn refresh(&mut self) {
        match self.active_tab {
            Tab::Pinned => self.load_pinned(),
            Tab::Showcase => {
                self.portfolio.repos.invalidate_cache();
                self.load_showcase();
            }
            Tab::Projects => {
                self.portfolio.repos.invalidate_cache();
                self.load_projects();
            }
        }
    }

    /// Repository URL under the cursor on the active tab.
    pub fn selected_repo_url(&self) -> Option<String> {
        match self.active_tab {
            Tab::Pinned => {
                let index = self.pinned_list.selected()?;
                self.pinned.data()?.get(index).map(|r| r.html_url.clone())
            }
            Tab::Showcase => {
                let index = self.carousel.current()?;
                self.showcase.data()?.get(index).map(|p| p.repo.html_url.clone())
            }
            Tab::Projects => {
                let index = self.projects_list.selected()?;
                let gallery = self.projects.data()?;
                gallery.visible().get(index).map(|r| r.html_url.clone())
            }
        }
    }

    /// Handle keyboard and other events.
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.readme.is_open() {
            match code {
                KeyCode::Esc | KeyCode::Char('q') => self.close_readme(),
                KeyCode::Up | KeyCode::Char('k') => {
                    self.readme_scroll = self.readme_scroll.saturating_sub(1)
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.readme_scroll = self.readme_scroll.saturating_add(1)
                }
                KeyCode::PageUp => self.readme_scroll = self.readme_scroll.saturating_sub(20),
                KeyCode::PageDown => self.readme_scroll = self.readme_scroll.saturating_add(20),
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.active_tab = self.active_tab.next(),
            KeyCode::BackTab => self.active_tab = self.active_tab.prev(),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Enter => {
                if let Some(url) = self.selected_repo_url() {
                    self.open_readme(url);
                }
            }
            _ => match self.active_tab {
                Tab::Pinned => self.handle_pinned_key(code),
                Tab::Showcase => self.handle_showcase_key(code),
                Tab::Projects => self.handle_projects_key(code),
            },
        }
    }

    fn handle_pinned_key(&mut self, code: KeyCode) {
        let len = self.pinned.data().map_or(0, Vec::len);
        match code {
            KeyCode::Up | KeyCode::Char('k') => select_prev(&mut self.pinned_list, len),
            KeyCode::Down | KeyCode::Char('j') => select_next(&mut self.pinned_list, len),
            _ => {}
        }
    }

    fn handle_showcase_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('h') => self.carousel.previous(),
            KeyCode::Right | KeyCode::Char('l') => self.carousel.next(),
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                let index = c as usize - '1' as usize;
                self.carousel.go_to(index);
            }
            _ => {}
        }
    }

    fn handle_projects_key(&mut self, code: KeyCode) {
        let Some(gallery) = self.projects.data_mut() else {
            return;
        };
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                let len = gallery.visible().len();
                select_prev(&mut self.projects_list, len);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = gallery.visible().len();
                select_next(&mut self.projects_list, len);
            }
            KeyCode::Char('f') | KeyCode::Right => {
                if gallery.cycle_filter(true) {
                    reset_selection(&mut self.projects_list, gallery.visible().len());
                }
            }
            KeyCode::Char('F') | KeyCode::Left => {
                if gallery.cycle_filter(false) {
                    reset_selection(&mut self.projects_list, gallery.visible().len());
                }
            }
            KeyCode::Char('m') => {
                gallery.load_more();
            }
            _ => {}
        }
    }
}

/// Select the next item, staying at the end.
fn select_next(list: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let i = match list.selected() {
        Some(i) if i + 1 < len => i + 1,
        Some(i) => i,
        None => 0,
    };
    list.select(Some(i));
}

/// Select the previous item, staying at the start.
fn select_prev(list: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let i = match list.selected() {
        Some(i) => i.saturating_sub(1),
        None => 0,
    };
    list.select(Some(i));
}

fn reset_selection(list: &mut ListState, len: usize) {
    list.select(if len == 0 { None } else { Some(0) });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::MemoryStorage;
    use crate::config::Config;
    use crate::error::{FolioError, Result};
    use crate::github::client::mock::MockTransport;
    use crate::github::client::{HttpResponse, Transport};
    use crate::github::readme::ReadmeFallback;
    use crate::markdown::CmarkRenderer;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    fn app() -> App {
        let portfolio = Portfolio::new(
            &Config::default(),
            Arc::new(MockTransport::new()),
            Box::new(MemoryStorage::new()),
            Arc::new(CmarkRenderer),
        );
        App::new(Arc::new(portfolio))
    }

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            description: None,
            html_url: format!("https://github.com/o/{}", name),
            language: Some("Rust".to_string()),
            topics: Vec::new(),
            stargazers_count: 0,
            forks_count: 0,
            homepage: None,
            updated_at: None,
            fork: false,
        }
    }

    #[test]
    fn test_tab_cycle() {
        let mut tab = Tab::Pinned;
        for _ in 0..Tab::ALL.len() {
            tab = tab.next();
        }
        assert_eq!(tab, Tab::Pinned);
        assert_eq!(Tab::Pinned.prev(), Tab::Projects);
    }

    #[test]
    fn test_stale_load_discarded() {
        let mut app = app();
        let stale = app.projects_guard.begin();
        let fresh = app.projects_guard.begin();

        app.apply(AppEvent::ProjectsLoaded {
            ticket: fresh,
            projects: vec![repo("new")],
        });
        app.apply(AppEvent::ProjectsLoaded {
            ticket: stale,
            projects: vec![repo("old"), repo("older")],
        });

        let gallery = app.projects.data().unwrap();
        assert_eq!(gallery.projects().len(), 1);
        assert_eq!(gallery.projects()[0].name, "new");
    }

    #[test]
    fn test_showcase_navigation() {
        let mut app = app();
        let ticket = app.showcase_guard.begin();
        app.apply(AppEvent::ShowcaseLoaded {
            ticket,
            projects: ["a", "b", "c"]
                .iter()
                .map(|name| RepositoryWithLanguages {
                    repo: repo(name),
                    languages: Vec::new(),
                })
                .collect(),
        });
        app.active_tab = Tab::Showcase;

        app.handle_key(KeyCode::Left);
        assert_eq!(app.carousel.current(), Some(2));
        assert_eq!(app.selected_repo_url().as_deref(), Some("https://github.com/o/c"));

        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.carousel.current(), Some(1));
    }

    #[test]
    fn test_projects_filter_and_load_more() {
        let mut app = app();
        let ticket = app.projects_guard.begin();
        let projects = (0..10).map(|i| repo(&format!("r{}", i))).collect();
        app.apply(AppEvent::ProjectsLoaded { ticket, projects });
        app.active_tab = Tab::Projects;

        app.handle_key(KeyCode::Char('m'));
        assert_eq!(app.projects.data().unwrap().visible().len(), 10);

        app.handle_key(KeyCode::Char('f'));
        let gallery = app.projects.data().unwrap();
        assert_eq!(gallery.active_filter(), "Rust");
        assert_eq!(gallery.visible().len(), 6);
        assert_eq!(app.projects_list.selected(), Some(0));
    }

    #[test]
    fn test_readme_result_after_close_is_discarded() {
        let mut app = app();
        let ticket = app.readme_guard.begin();
        app.readme = ReadmeState::Loading {
            repo_url: "https://github.com/o/a".to_string(),
        };

        app.close_readme();
        app.apply(AppEvent::ReadmeLoaded {
            ticket,
            state: ReadmeState::Error(ReadmeFallback::new("https://github.com/o/a")),
        });

        assert_eq!(app.readme, ReadmeState::Idle);
    }

    #[test]
    fn test_escape_closes_readme_before_quitting() {
        let mut app = app();
        app.readme = ReadmeState::Error(ReadmeFallback::new("https://github.com/o/a"));

        app.handle_key(KeyCode::Esc);
        assert!(!app.readme.is_open());
        assert!(!app.should_quit);

        app.handle_key(KeyCode::Esc);
        assert!(app.should_quit);
    }

    /// Holds every request until released, then fails it.
    struct GatedTransport {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse> {
            self.started.notify_one();
            self.release.notified().await;
            Err(FolioError::Other(format!("offline: {}", url)))
        }
    }

    async fn settle(app: &mut App) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        app.drain_events();
    }

    #[tokio::test]
    async fn test_declined_readme_open_does_not_stick_loading() {
        let transport = Arc::new(GatedTransport {
            started: Notify::new(),
            release: Notify::new(),
        });
        let portfolio = Portfolio::new(
            &Config::default(),
            transport.clone(),
            Box::new(MemoryStorage::new()),
            Arc::new(CmarkRenderer),
        );
        let mut app = App::new(Arc::new(portfolio));

        // Both opens are spawned before the first one reaches the network.
        app.open_readme("https://github.com/o/a".to_string());
        app.close_readme();
        app.open_readme("https://github.com/o/b".to_string());
        assert!(app.readme.is_loading());

        transport.started.notified().await;
        settle(&mut app).await;
        assert_eq!(app.readme, ReadmeState::Idle);

        transport.release.notify_one();
        settle(&mut app).await;
        assert_eq!(app.readme, ReadmeState::Idle);
        assert!(!app.portfolio.readme.is_loading());

        app.open_readme("https://github.com/o/c".to_string());
        assert!(app.readme.is_loading());
    }
}
