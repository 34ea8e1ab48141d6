use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use cw_types::{ArchiveId, EntryIdentity, FileId, IndexType};
use serde::Deserialize;
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::traits::CacheProvider;

const FILE_EXTENSION: &str = "dat";
const INDEX_METADATA: &str = "index.toml";

/// Contents of `<dir>/<index>/index.toml`.
#[derive(Debug, Deserialize)]
struct IndexMetadata {
    revision: u32,
}

/// Provider over an unpacked cache directory.
///
/// Layout:
///
/// ```text
/// <dir>/<index id>/index.toml              (optional, `revision = N`)
/// <dir>/<index id>/<archive id>/<file id>.dat
/// ```
#[derive(Clone, Debug)]
pub struct DiskCacheProvider {
    version: String,
    dir: PathBuf,
}

impl DiskCacheProvider {
    /// Open the cache at `dir` under the given version identifier.
    pub fn new(version: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            dir: dir.into(),
        }
    }

    /// Root directory of this cache.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_dir(&self, index: IndexType) -> PathBuf {
        self.dir.join(index.id().to_string())
    }

    fn archive_dir(&self, index: IndexType, archive: ArchiveId) -> PathBuf {
        self.index_dir(index).join(archive.to_string())
    }

    fn file_path(&self, id: EntryIdentity) -> PathBuf {
        self.archive_dir(id.index, id.archive)
            .join(format!("{}.{FILE_EXTENSION}", id.file))
    }
}

/// List the numeric names under `dir`, keeping directories when
/// `extension` is `None` and `<n>.<extension>` files otherwise.
///
/// A missing directory lists as empty.
async fn numeric_entries(dir: &Path, extension: Option<&str>) -> CacheResult<Vec<u32>> {
    let mut reader = match tokio::fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut ids = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let file_type = entry.file_type().await?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let stem = match extension {
            None if file_type.is_dir() => Some(name),
            Some(ext) if file_type.is_file() => name
                .strip_suffix(ext)
                .and_then(|rest| rest.strip_suffix('.')),
            _ => None,
        };
        match stem.and_then(|s| s.parse::<u32>().ok()) {
            Some(id) => ids.push(id),
            None => debug!(path = %entry.path().display(), "ignoring non-cache entry"),
        }
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

#[async_trait]
impl CacheProvider for DiskCacheProvider {
    fn version(&self) -> &str {
        &self.version
    }

    async fn list_indexes(&self) -> CacheResult<Vec<IndexType>> {
        let ids = numeric_entries(&self.dir, None).await?;
        let mut indexes = Vec::with_capacity(ids.len());
        for id in ids {
            match u8::try_from(id).ok().and_then(IndexType::from_id) {
                Some(index) => indexes.push(index),
                None => debug!(index_id = id, "skipping unknown cache index"),
            }
        }
        Ok(indexes)
    }

    async fn list_archives(&self, index: IndexType) -> CacheResult<Vec<ArchiveId>> {
        numeric_entries(&self.index_dir(index), None).await
    }

    async fn list_files(&self, index: IndexType, archive: ArchiveId) -> CacheResult<Vec<FileId>> {
        numeric_entries(&self.archive_dir(index, archive), Some(FILE_EXTENSION)).await
    }

    async fn read_file(&self, id: EntryIdentity) -> CacheResult<Bytes> {
        match tokio::fs::read(self.file_path(id)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn index_revision(&self, index: IndexType) -> CacheResult<u32> {
        let path = self.index_dir(index).join(INDEX_METADATA);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let metadata: IndexMetadata =
            toml::from_str(&text).map_err(|e| CacheError::CorruptMetadata {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(metadata.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(root: &Path, index: u8, archive: u32, file: &str, data: &[u8]) {
        let dir = root.join(index.to_string()).join(archive.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), data).unwrap();
    }

    #[tokio::test]
    async fn enumerates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), 2, 9, "1.dat", b"goblin");
        write_file(tmp.path(), 2, 9, "10.dat", b"guard");
        write_file(tmp.path(), 2, 9, "notes.txt", b"ignored");
        write_file(tmp.path(), 2, 10, "4151.dat", b"whip");
        write_file(tmp.path(), 8, 0, "0.dat", b"sprite");
        fs::create_dir_all(tmp.path().join("99")).unwrap();

        let cache = DiskCacheProvider::new("231", tmp.path());
        assert_eq!(
            cache.list_indexes().await.unwrap(),
            vec![IndexType::Configs, IndexType::Sprites]
        );
        assert_eq!(cache.list_archives(IndexType::Configs).await.unwrap(), vec![9, 10]);
        assert_eq!(cache.list_files(IndexType::Configs, 9).await.unwrap(), vec![1, 10]);
    }

    #[tokio::test]
    async fn missing_directories_enumerate_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = DiskCacheProvider::new("231", tmp.path().join("absent"));
        assert!(cache.list_indexes().await.unwrap().is_empty());
        assert!(cache.list_archives(IndexType::Maps).await.unwrap().is_empty());
        assert!(cache.list_files(IndexType::Maps, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_payload_and_revision() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), 2, 9, "1.dat", b"goblin");
        fs::write(tmp.path().join("2").join("index.toml"), "revision = 1402\n").unwrap();

        let cache = DiskCacheProvider::new("231", tmp.path());
        let id = EntryIdentity::new(IndexType::Configs, 9, 1);
        assert_eq!(cache.read_file(id).await.unwrap(), Bytes::from_static(b"goblin"));
        assert_eq!(cache.index_revision(IndexType::Configs).await.unwrap(), 1402);
        assert_eq!(cache.index_revision(IndexType::Sprites).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = DiskCacheProvider::new("231", tmp.path());
        let err = cache
            .read_file(EntryIdentity::new(IndexType::Configs, 9, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));
    }

    #[tokio::test]
    async fn corrupt_metadata_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("2")).unwrap();
        fs::write(tmp.path().join("2").join("index.toml"), "revision = \"x\"").unwrap();

        let cache = DiskCacheProvider::new("231", tmp.path());
        let err = cache.index_revision(IndexType::Configs).await.unwrap_err();
        assert!(matches!(err, CacheError::CorruptMetadata { .. }));
    }
}
