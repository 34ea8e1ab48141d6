use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::EntryIdentity;

/// Revision metadata of the index containing an entry, for one cache side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheRevision {
    /// The cache version identifier the entry was read from.
    pub version: String,
    /// Revision number of the containing index.
    pub index_revision: u32,
}

impl CacheRevision {
    pub fn new(version: impl Into<String>, index_revision: u32) -> Self {
        Self {
            version: version.into(),
            index_revision,
        }
    }
}

/// One side (old or new) of a changed-entry comparison.
///
/// The payload is reference-counted so a context can be handed to many
/// concurrent listeners without copying the bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContext {
    pub identity: EntryIdentity,
    pub payload: Bytes,
    pub revision: CacheRevision,
}

impl FileContext {
    pub fn new(identity: EntryIdentity, payload: impl Into<Bytes>, revision: CacheRevision) -> Self {
        Self {
            identity,
            payload: payload.into(),
            revision,
        }
    }
}

/// What happened to an entry between two versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
            Self::Modified => f.write_str("modified"),
        }
    }
}

/// A changed-entry event: an optional old side and an optional new side.
///
/// At least one side is always present; [`ChangeEvent::new`] enforces this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    old: Option<FileContext>,
    new: Option<FileContext>,
}

impl ChangeEvent {
    /// Pair an old and a new context. Fails when both are absent.
    pub fn new(old: Option<FileContext>, new: Option<FileContext>) -> Result<Self, TypeError> {
        if old.is_none() && new.is_none() {
            return Err(TypeError::EmptyChange);
        }
        Ok(Self { old, new })
    }

    pub fn added(new: FileContext) -> Self {
        Self {
            old: None,
            new: Some(new),
        }
    }

    pub fn removed(old: FileContext) -> Self {
        Self {
            old: Some(old),
            new: None,
        }
    }

    pub fn modified(old: FileContext, new: FileContext) -> Self {
        Self {
            old: Some(old),
            new: Some(new),
        }
    }

    pub fn old_file(&self) -> Option<&FileContext> {
        self.old.as_ref()
    }

    pub fn new_file(&self) -> Option<&FileContext> {
        self.new.as_ref()
    }

    /// The entry's identity. Taken from the old side when present, otherwise
    /// from the new side; both sides describe the same slot.
    pub fn identity(&self) -> EntryIdentity {
        match (&self.old, &self.new) {
            (Some(old), _) => old.identity,
            (None, Some(new)) => new.identity,
            (None, None) => unreachable!("ChangeEvent is never constructed empty"),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match (&self.old, &self.new) {
            (Some(_), Some(_)) => ChangeKind::Modified,
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            (None, None) => unreachable!("ChangeEvent is never constructed empty"),
        }
    }
}
