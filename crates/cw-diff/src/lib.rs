//! Diff engine for cachewatch.
//!
//! Computes deep differences between decoded records and walks two directory
//! trees side by side, persisting what was added, removed, or changed.
//!
//! # Key Types
//!
//! - [`DiffNode`] -- Sparse tree of differences between two JSON values
//! - [`BlobDiff`] -- Whole-blob equality result for opaque binary payloads
//! - [`unmatched_suffix`] / [`line_diff`] -- Free-text comparison helpers
//! - [`TreeWalker`] / [`WalkReport`] -- Side-by-side directory traversal
//! - [`ArtifactWriter`] / [`ArtifactKind`] -- Partitioned diff output

pub mod artifact;
pub mod blob_diff;
pub mod error;
pub mod structural;
pub mod text_diff;
pub mod tree_walk;

pub use artifact::{ArtifactKind, ArtifactWriter};
pub use blob_diff::{diff_blobs, BlobDiff};
pub use error::{DiffError, DiffResult};
pub use structural::{changed_common_keys, diff, DiffNode};
pub use text_diff::{line_diff, unmatched_suffix};
pub use tree_walk::{EntryKind, FsTreeSource, TreeEntry, TreeSource, TreeWalker, WalkReport};
