use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::disk::DiskCacheProvider;
use crate::error::{CacheError, CacheResult};

/// Version identifier that resolves to the newest cache under the root.
pub const LATEST: &str = "latest";

/// Resolves cache version identifiers to cache directories.
///
/// Each version lives in its own directory directly under `root`.
#[derive(Clone, Debug)]
pub struct CacheLocator {
    root: PathBuf,
}

impl CacheLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All version directory names, oldest first.
    pub async fn versions(&self) -> CacheResult<Vec<String>> {
        let mut reader = match tokio::fs::read_dir(&self.root).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut versions = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    versions.push(name.to_string());
                }
            }
        }
        versions.sort_by(|a, b| compare_versions(a, b));
        Ok(versions)
    }

    /// Resolve `version` to its canonical name and directory.
    pub async fn resolve(&self, version: &str) -> CacheResult<(String, PathBuf)> {
        let not_found = || CacheError::VersionNotFound {
            root: self.root.clone(),
            version: version.to_string(),
        };

        if version.eq_ignore_ascii_case(LATEST) {
            let name = self.versions().await?.pop().ok_or_else(not_found)?;
            let dir = self.root.join(&name);
            return Ok((name, dir));
        }

        let mut components = Path::new(version).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(CacheError::InvalidVersion(version.to_string()));
        }

        let dir = self.root.join(version);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok((version.to_string(), dir)),
            Ok(_) => Err(not_found()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve `version` and open a provider over it.
    pub async fn open(&self, version: &str) -> CacheResult<DiskCacheProvider> {
        let (name, dir) = self.resolve(version).await?;
        info!(version = %name, dir = %dir.display(), "opened cache");
        Ok(DiskCacheProvider::new(name, dir))
    }
}

/// Numeric names sort numerically and before non-numeric names.
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
