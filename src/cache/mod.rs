// Cache module for local persistence.
// Stores fetched repository lists so repeat launches skip the network.

pub mod paths;
pub mod storage;
pub mod store;

pub use storage::{NoopStorage, Storage, select_storage};
pub use store::{CacheStore, DEFAULT_TTL, REPOSITORIES_KEY};
