//! Location and opening of the local store.

use hobart::{Result, SqliteStore};
use std::path::{Path, PathBuf};

/// Default store directory.
///
/// - Linux: `~/.cache/hobart/`
/// - macOS: `~/Library/Caches/hobart/`
/// - Windows: `%LOCALAPPDATA%\hobart\`
pub(crate) fn default_store_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hobart")
}

/// Default store database path.
pub(crate) fn default_store_path() -> PathBuf {
    default_store_dir().join("hobart.db")
}

/// Open the store at `path`, or at the default location, creating parent
/// directories as needed.
pub(crate) fn open_store(path: Option<&Path>) -> Result<SqliteStore> {
    let store_path = path.map_or_else(default_store_path, Path::to_path_buf);

    if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::debug!(path = %store_path.display(), "opening store");
    SqliteStore::new(&store_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_is_under_hobart_dir() {
        let path = default_store_path();
        assert!(path.ends_with("hobart/hobart.db"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("hobart_store_{}", std::process::id()));
        let path = dir.join("nested").join("hobart.db");
        let store = open_store(Some(&path)).unwrap();
        assert!(path.exists());
        drop(store);
        std::fs::remove_dir_all(&dir).ok();
    }
}
