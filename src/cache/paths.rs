// Cache path utilities.
// Resolves the per-user directories folio reads and writes.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "folio")
}

/// Get the base cache directory (~/.cache/folio on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Directory holding one file per storage key.
pub fn storage_dir() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("storage"))
}

/// Log file written while the TUI owns the terminal.
pub fn log_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("folio.log"))
}

/// Default configuration file location.
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the file backing a storage key inside `dir`.
pub fn key_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", sanitize_name(key)))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("github_portfolio_data_v2"), "github_portfolio_data_v2");
        assert_eq!(sanitize_name("with/slash"), "with_slash");
        assert_eq!(sanitize_name("../escape"), "___escape");
    }

    #[test]
    fn test_key_path_stays_in_dir() {
        let dir = Path::new("/tmp/folio-storage");
        let path = key_path(dir, "../../etc/passwd");
        assert_eq!(path.parent(), Some(dir));
        assert!(path.ends_with("______etc_passwd.json"));
    }

    #[test]
    fn test_known_paths() {
        if let Some(log) = log_path() {
            assert!(log.ends_with("folio.log"));
        }
        if let Some(config) = config_path() {
            assert!(config.ends_with("config.toml"));
        }
    }
}
