// folio: portfolio browser for a GitHub account.
// Entry point: parses arguments, wires the portfolio, runs the TUI or a one-shot command.

mod app;
mod cache;
mod config;
mod error;
mod github;
mod logging;
mod markdown;
mod portfolio;
mod state;
mod ui;
mod view;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::app::App;
use crate::cache::{NoopStorage, Storage, paths, select_storage};
use crate::config::Config;
use crate::error::Result;
use crate::github::{HttpTransport, ReadmeState, Repository};
use crate::markdown::CmarkRenderer;
use crate::portfolio::Portfolio;
use crate::view::{CardOptions, RenderableCard};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Browse a GitHub account's portfolio: pinned projects, showcase, gallery, READMEs")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip the on-disk repository cache
    #[arg(long)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive browser (default)
    Tui,
    /// List the account's public repositories
    Repos,
    /// List the most recent repositories with their language breakdown
    Showcase,
    /// List the pinned repositories
    Pinned,
    /// Print a repository README as sanitized HTML
    Readme {
        /// Repository page URL, e.g. https://github.com/owner/repo
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);

    match (&command, paths::log_path()) {
        (Command::Tui, Some(log_path)) => logging::init_file(&log_path)?,
        (Command::Tui, None) => {}
        _ => logging::init_stderr(),
    }

    let config = Config::load(cli.config.as_deref())?;
    info!(username = %config.github.username, "starting folio v{}", env!("CARGO_PKG_VERSION"));

    let token = config.token();
    if token.is_none() {
        info!(env = %config.github.token_env, "no API token set, using unauthenticated requests");
    }
    let transport = Arc::new(HttpTransport::new(token.as_deref())?);
    let storage: Box<dyn Storage> = if cli.no_cache {
        Box::new(NoopStorage)
    } else {
        select_storage(paths::storage_dir())
    };
    let portfolio = Arc::new(Portfolio::new(
        &config,
        transport,
        storage,
        Arc::new(CmarkRenderer),
    ));

    match command {
        Command::Tui => run_tui(portfolio)?,
        Command::Repos => {
            let repos = portfolio.repos.fetch_all_repositories().await;
            print_repos(&repos, &portfolio.cards);
        }
        Command::Showcase => {
            let repos = portfolio.repos.fetch_all_repositories().await;
            let projects = portfolio
                .repos
                .fetch_repositories_with_languages(&repos, portfolio.max_projects)
                .await;
            let now = Utc::now();
            for project in &projects {
                let card =
                    RenderableCard::build(&project.repo, &project.languages, &portfolio.cards, now);
                print_card(&card);
            }
        }
        Command::Pinned => {
            let repos = portfolio.pinned.get_pinned_repos().await;
            print_repos(&repos, &portfolio.cards);
        }
        Command::Readme { url } => match portfolio.readme.open(&url).await {
            Some(ReadmeState::Rendered(view)) => println!("{}", view.html),
            Some(ReadmeState::Error(fallback)) => println!("{}", fallback.html),
            _ => warn!(%url, "README not loaded"),
        },
    }
    Ok(())
}

fn run_tui(portfolio: Arc<Portfolio>) -> Result<()> {
    let mut terminal = ratatui::try_init()?;
    let result = App::new(portfolio).run(&mut terminal);
    ratatui::try_restore()?;
    Ok(result?)
}

fn print_repos(repos: &[Repository], options: &CardOptions) {
    if repos.is_empty() {
        println!("No projects found.");
        return;
    }
    let now = Utc::now();
    for repo in repos {
        print_card(&RenderableCard::build(repo, &[], options, now));
    }
}

fn print_card(card: &RenderableCard) {
    println!("{} {}  ★ {}  ⑂ {}", card.icon, card.name, card.stars, card.forks);
    println!("   {}", card.html_url);
    if let Some(description) = &card.description {
        println!("   {}", description);
    }
    if !card.badges.is_empty() {
        let badges: Vec<String> = card
            .badges
            .iter()
            .map(|b| format!("{} {}", b.icon, b.name))
            .collect();
        println!("   {}", badges.join(" · "));
    }
    if !card.topics.is_empty() {
        println!("   #{}", card.topics.join(" #"));
    }
    if let Some(homepage) = &card.homepage {
        println!("   ↗ {}", homepage);
    }
    if let Some(updated) = &card.updated {
        println!("   Updated {}", updated);
    }
    println!();
}
