// Project gallery state.
// Category filtering and "load more" pagination over an already-ordered project list.

use std::collections::{BTreeSet, HashSet};

use crate::github::Repository;

/// Sentinel category that matches every project.
pub const ALL: &str = "All";

/// Pinned projects first, then fetched ones not already pinned (URL, case-insensitive).
pub fn merge_projects(featured: Vec<Repository>, fetched: Vec<Repository>) -> Vec<Repository> {
    let featured_urls: HashSet<String> = featured
        .iter()
        .map(|repo| repo.html_url.to_lowercase())
        .collect();

    let mut projects = featured;
    projects.extend(
        fetched
            .into_iter()
            .filter(|repo| !featured_urls.contains(&repo.html_url.to_lowercase())),
    );
    projects
}

#[derive(Debug, Clone)]
pub struct GalleryState {
    projects: Vec<Repository>,
    active_filter: String,
    visible_count: usize,
    page_size: usize,
}

impl GalleryState {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            projects: Vec::new(),
            active_filter: ALL.to_string(),
            visible_count: page_size,
            page_size,
        }
    }

    /// Replace the project list. The active filter is kept if it still exists.
    pub fn set_projects(&mut self, projects: Vec<Repository>) {
        self.projects = projects;
        if !self.categories().iter().any(|c| *c == self.active_filter) {
            self.active_filter = ALL.to_string();
        }
        self.visible_count = self.page_size;
    }

    pub fn projects(&self) -> &[Repository] {
        &self.projects
    }

    pub fn active_filter(&self) -> &str {
        &self.active_filter
    }

    /// `All` followed by every language and topic, sorted.
    pub fn categories(&self) -> Vec<String> {
        let tags: BTreeSet<&str> = self.projects.iter().flat_map(|repo| repo.tags()).collect();
        std::iter::once(ALL.to_string())
            .chain(tags.into_iter().filter(|t| *t != ALL).map(str::to_string))
            .collect()
    }

    /// Switch category. Returns false when `category` is already active.
    pub fn set_filter(&mut self, category: &str) -> bool {
        if self.active_filter == category {
            return false;
        }
        self.active_filter = category.to_string();
        self.visible_count = self.page_size;
        true
    }

    /// Move to the next (or previous) category, wrapping around.
    pub fn cycle_filter(&mut self, forward: bool) -> bool {
        let categories = self.categories();
        let current = categories
            .iter()
            .position(|c| *c == self.active_filter)
            .unwrap_or(0);
        let len = categories.len();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.set_filter(&categories[next])
    }

    /// Projects matching the active category, in input order.
    pub fn filtered(&self) -> Vec<&Repository> {
        self.projects
            .iter()
            .filter(|repo| {
                self.active_filter == ALL || repo.tags().any(|tag| tag == self.active_filter)
            })
            .collect()
    }

    /// The currently revealed slice of the filtered list.
    pub fn visible(&self) -> Vec<&Repository> {
        let mut filtered = self.filtered();
        filtered.truncate(self.visible_count);
        filtered
    }

    pub fn has_more(&self) -> bool {
        self.filtered().len() > self.visible_count
    }

    /// Reveal one more page. Returns false when nothing was hidden.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.visible_count += self.page_size;
        true
    }
}
