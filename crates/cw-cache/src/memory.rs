use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use cw_types::{ArchiveId, EntryIdentity, FileId, IndexType};

use crate::error::{CacheError, CacheResult};
use crate::traits::CacheProvider;

/// In-memory, `BTreeMap`-based cache provider.
///
/// Intended for tests and embedding. Files are held behind a `RwLock` so a
/// provider can be populated through a shared reference and then read
/// concurrently.
pub struct InMemoryCacheProvider {
    version: String,
    files: RwLock<BTreeMap<EntryIdentity, Bytes>>,
    revisions: RwLock<BTreeMap<IndexType, u32>>,
}

impl InMemoryCacheProvider {
    /// Create an empty provider for `version`.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            files: RwLock::new(BTreeMap::new()),
            revisions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or replace one file.
    pub fn insert(&self, id: EntryIdentity, payload: impl Into<Bytes>) {
        self.files
            .write()
            .expect("lock poisoned")
            .insert(id, payload.into());
    }

    /// Builder-style [`Self::insert`].
    pub fn with_file(self, id: EntryIdentity, payload: impl Into<Bytes>) -> Self {
        self.insert(id, payload);
        self
    }

    /// Remove one file. Returns `true` if it existed.
    pub fn remove(&self, id: &EntryIdentity) -> bool {
        self.files.write().expect("lock poisoned").remove(id).is_some()
    }

    /// Set the revision number reported for `index`.
    pub fn set_index_revision(&self, index: IndexType, revision: u32) {
        self.revisions
            .write()
            .expect("lock poisoned")
            .insert(index, revision);
    }

    /// Number of files held.
    pub fn len(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the provider holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.read().expect("lock poisoned").is_empty()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCacheProvider {
    fn version(&self) -> &str {
        &self.version
    }

    async fn list_indexes(&self) -> CacheResult<Vec<IndexType>> {
        let files = self.files.read().expect("lock poisoned");
        let indexes: BTreeSet<IndexType> = files.keys().map(|id| id.index).collect();
        Ok(indexes.into_iter().collect())
    }

    async fn list_archives(&self, index: IndexType) -> CacheResult<Vec<ArchiveId>> {
        let files = self.files.read().expect("lock poisoned");
        let archives: BTreeSet<ArchiveId> = files
            .keys()
            .filter(|id| id.index == index)
            .map(|id| id.archive)
            .collect();
        Ok(archives.into_iter().collect())
    }

    async fn list_files(&self, index: IndexType, archive: ArchiveId) -> CacheResult<Vec<FileId>> {
        let files = self.files.read().expect("lock poisoned");
        Ok(files
            .keys()
            .filter(|id| id.index == index && id.archive == archive)
            .map(|id| id.file)
            .collect())
    }

    async fn read_file(&self, id: EntryIdentity) -> CacheResult<Bytes> {
        let files = self.files.read().expect("lock poisoned");
        files.get(&id).cloned().ok_or(CacheError::NotFound(id))
    }

    async fn index_revision(&self, index: IndexType) -> CacheResult<u32> {
        let revisions = self.revisions.read().expect("lock poisoned");
        Ok(revisions.get(&index).copied().unwrap_or(0))
    }
}

impl std::fmt::Debug for InMemoryCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCacheProvider")
            .field("version", &self.version)
            .field("file_count", &self.len())
            .finish()
    }
}
