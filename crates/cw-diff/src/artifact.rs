//! Partitioned output for diff artifacts.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{DiffError, DiffResult};

/// Which output partition an artifact belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Added,
    Removed,
    /// Structured diffs of entries present on both sides.
    Changed,
}

impl ArtifactKind {
    /// Directory name of this partition under the output root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "differences",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Writes artifacts to `<root>/<kind>/<relative path>`.
///
/// Parent directories are created on demand. Existing files are overwritten;
/// the last write wins.
#[derive(Clone, Debug)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination path for an artifact.
    pub fn path_for(&self, kind: ArtifactKind, relative: &Path) -> DiffResult<PathBuf> {
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(DiffError::InvalidPath(relative.to_path_buf()));
        }
        Ok(self.root.join(kind.dir_name()).join(relative))
    }

    /// Write `payload` to the partition for `kind`.
    pub async fn write(&self, kind: ArtifactKind, relative: &Path, payload: &[u8]) -> DiffResult<PathBuf> {
        let dest = self.path_for(kind, relative)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, payload).await?;
        debug!(kind = %kind, path = %dest.display(), bytes = payload.len(), "wrote artifact");
        Ok(dest)
    }

    /// Write a JSON value, pretty-printed.
    pub async fn write_json<T: serde::Serialize>(
        &self,
        kind: ArtifactKind,
        relative: &Path,
        value: &T,
    ) -> DiffResult<PathBuf> {
        let text = serde_json::to_vec_pretty(value)?;
        self.write(kind, relative, &text).await
    }
}
