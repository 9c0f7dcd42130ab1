//! Local cache of node addresses, reused across runs
//!
//! The file is newline-delimited, one address per line, and is only ever
//! written by an explicit `NodeCache::store` call.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ControlError, Result};

pub const DEFAULT_CACHE_PATH: &str = "cache/mock-clients.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCache {
    path: PathBuf,
}

impl NodeCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `addresses` to the cache file, creating its directory.
    pub fn store(&self, addresses: &[String]) -> Result<()> {
        let write_err = |source| ControlError::CacheWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            create_dir(dir).map_err(write_err)?;
        }

        let mut file = open_restricted(&self.path).map_err(write_err)?;
        file.write_all(addresses.join("\n").as_bytes())
            .map_err(write_err)?;

        info!(path = %self.path.display(), count = addresses.len(), "Saved node addresses to cache");
        Ok(())
    }

    /// Read the cached address list, preserving its order.
    pub fn load(&self) -> Result<Vec<String>> {
        let contents = fs::read_to_string(&self.path).map_err(|source| ControlError::CacheRead {
            path: self.path.clone(),
            source,
        })?;

        let addresses: Vec<String> = contents
            .trim()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if addresses.is_empty() {
            return Err(ControlError::CacheEmpty(self.path.clone()));
        }

        debug!(path = %self.path.display(), count = addresses.len(), "Loaded node addresses from cache");
        Ok(addresses)
    }
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PATH)
    }
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_restricted(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_restricted(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_then_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let cache = NodeCache::new(dir.path().join("cache").join("mock-clients.txt"));

        let addresses = vec![
            "node-c:7777".to_string(),
            "node-a:7777".to_string(),
            "node-b:7777".to_string(),
        ];
        cache.store(&addresses).unwrap();

        assert_eq!(cache.load().unwrap(), addresses);
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cache = NodeCache::new(dir.path().join("mock-clients.txt"));
        cache.store(&["node-a:7777".to_string()]).unwrap();

        let mode = fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let cache = NodeCache::new(dir.path().join("absent.txt"));
        assert!(matches!(cache.load(), Err(ControlError::CacheRead { .. })));
    }

    #[test]
    fn test_blank_file_is_empty_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mock-clients.txt");
        fs::write(&path, "\n  \n").unwrap();

        let cache = NodeCache::new(path);
        assert!(matches!(cache.load(), Err(ControlError::CacheEmpty(_))));
    }

    #[test]
    fn test_unwritable_directory_fails_fast() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let cache = NodeCache::new(blocker.join("mock-clients.txt"));
        assert!(matches!(
            cache.store(&["node-a:7777".to_string()]),
            Err(ControlError::CacheWrite { .. })
        ));
    }
}
