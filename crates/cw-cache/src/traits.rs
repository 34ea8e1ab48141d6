use async_trait::async_trait;
use bytes::Bytes;
use cw_types::{ArchiveId, CacheRevision, EntryIdentity, FileContext, FileId, IndexType};

use crate::error::CacheResult;

/// Read-only view of one cache version.
///
/// All implementations must satisfy these invariants:
/// - Enumeration results are sorted ascending and free of duplicates.
/// - Enumerating a missing index or archive returns an empty list, not an error.
/// - Concurrent reads are always safe.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// The version identifier this provider was opened for.
    fn version(&self) -> &str;

    /// Indices present in this cache.
    async fn list_indexes(&self) -> CacheResult<Vec<IndexType>>;

    /// Archive ids present in `index`.
    async fn list_archives(&self, index: IndexType) -> CacheResult<Vec<ArchiveId>>;

    /// File ids present in `index/archive`.
    async fn list_files(&self, index: IndexType, archive: ArchiveId) -> CacheResult<Vec<FileId>>;

    /// Read the raw payload of one file.
    async fn read_file(&self, id: EntryIdentity) -> CacheResult<Bytes>;

    /// Revision number of `index`. Zero when the cache carries no metadata.
    async fn index_revision(&self, index: IndexType) -> CacheResult<u32>;

    /// Revision metadata for entries of `index` in this cache.
    async fn revision(&self, index: IndexType) -> CacheResult<CacheRevision> {
        let index_revision = self.index_revision(index).await?;
        Ok(CacheRevision::new(self.version(), index_revision))
    }

    /// Read one file together with its identity and revision metadata.
    async fn read_context(&self, id: EntryIdentity) -> CacheResult<FileContext> {
        let payload = self.read_file(id).await?;
        let revision = self.revision(id.index).await?;
        Ok(FileContext::new(id, payload, revision))
    }
}
