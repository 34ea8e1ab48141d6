//! Blob-level comparison of opaque binary payloads.
//!
//! Binary payloads (images, packed model data) have no leaf-level diff: two
//! blobs are either identical or wholly changed.

/// The result of comparing two blobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlobDiff {
    /// Byte-for-byte identical.
    Unchanged,
    /// Any difference at all, including a length change.
    Changed { old_len: usize, new_len: usize },
}

impl BlobDiff {
    /// Returns `true` if the two blobs are identical.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Compare two blobs for binary equality.
pub fn diff_blobs(old: &[u8], new: &[u8]) -> BlobDiff {
    if old == new {
        BlobDiff::Unchanged
    } else {
        BlobDiff::Changed {
            old_len: old.len(),
            new_len: new.len(),
        }
    }
}
