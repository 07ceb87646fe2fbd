// GitHub API module.
// Transport, response types, and the repository, pinned-list and README fetchers.

pub mod client;
pub mod pinned;
pub mod readme;
pub mod repos;
pub mod types;

pub use client::{HttpTransport, Transport};
pub use pinned::{PinnedRepoLoader, PinnedSource};
pub use readme::{ReadmeFetcher, ReadmeState};
pub use repos::{FetcherSettings, RepositoryFetcher};
pub use types::*;
