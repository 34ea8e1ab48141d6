//! Foundation types for cachewatch.
//!
//! Every record inside a game cache is addressed by a three-level identity:
//! an index (category), an archive inside that index (sub-category), and a
//! file inside that archive (leaf key). This crate provides that identity and
//! the per-side context carried through the diff and dispatch pipeline.
//!
//! # Key Types
//!
//! - [`IndexType`] -- Fixed enumeration of cache indices
//! - [`EntryIdentity`] -- `(index, archive, file)` address, stable across versions
//! - [`CacheRevision`] -- Revision metadata of the containing index for one side
//! - [`FileContext`] -- Identity + raw payload + revision for one side of a comparison
//! - [`ChangeEvent`] / [`ChangeKind`] -- An old/new pair of contexts

pub mod context;
pub mod error;
pub mod identity;

pub use context::{CacheRevision, ChangeEvent, ChangeKind, FileContext};
pub use error::TypeError;
pub use identity::{config_archive, ArchiveId, EntryIdentity, FileId, IndexType};
