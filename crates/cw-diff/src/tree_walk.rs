//! Side-by-side walk of two directory trees.
//!
//! Entries are paired by name. Directories present on both sides are walked
//! recursively; entries present on one side only are copied whole into the
//! `added` or `removed` partition; files present on both sides are compared
//! by format (structured JSON gets a [`DiffNode`](crate::DiffNode), binary
//! files get whole-blob equality, everything else is skipped).
//!
//! # Concurrency
//!
//! Every entry of a directory is processed as its own task in a
//! [`JoinSet`], and each directory joins all of its children before
//! returning. [`TreeWalker::walk`] therefore only returns once every artifact
//! of the whole tree has been written. No ordering between siblings is
//! guaranteed.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::artifact::{ArtifactKind, ArtifactWriter};
use crate::blob_diff::{diff_blobs, BlobDiff};
use crate::error::{DiffError, DiffResult};
use crate::structural::diff;

const STRUCTURED_EXTENSIONS: &[&str] = &["json"];
const BINARY_EXTENSIONS: &[&str] = &["png", "gif", "jpg", "jpeg", "bmp", "webp", "dat"];

/// Whether a tree entry is a container or a terminal file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One named entry inside a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Read-only storage a tree walk runs over. Paths are relative to the root.
#[async_trait]
pub trait TreeSource: Send + Sync {
    /// Entries directly inside `relative`.
    async fn list(&self, relative: &Path) -> DiffResult<Vec<TreeEntry>>;

    /// Contents of the file at `relative`.
    async fn read(&self, relative: &Path) -> DiffResult<Bytes>;

    /// Every terminal file beneath `relative`, as paths relative to the root.
    async fn leaves(&self, relative: &Path) -> DiffResult<Vec<PathBuf>>;
}

/// [`TreeSource`] over a local directory.
#[derive(Clone, Debug)]
pub struct FsTreeSource {
    root: PathBuf,
}

impl FsTreeSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl TreeSource for FsTreeSource {
    async fn list(&self, relative: &Path) -> DiffResult<Vec<TreeEntry>> {
        let dir = self.root.join(relative);
        let enumeration = |source: std::io::Error| DiffError::Enumeration {
            path: dir.clone(),
            source,
        };

        let mut reader = tokio::fs::read_dir(&dir).await.map_err(enumeration)?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(enumeration)? {
            let file_type = entry.file_type().await.map_err(enumeration)?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };
            match entry.file_name().to_str() {
                Some(name) => entries.push(TreeEntry::new(name, kind)),
                None => warn!(path = %entry.path().display(), "entry name is not UTF-8; skipped"),
            }
        }
        Ok(entries)
    }

    async fn read(&self, relative: &Path) -> DiffResult<Bytes> {
        let path = self.root.join(relative);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(source) => Err(DiffError::Read { path, source }),
        }
    }

    async fn leaves(&self, relative: &Path) -> DiffResult<Vec<PathBuf>> {
        let root = self.root.clone();
        let start = root.join(relative);
        let walk_root = start.clone();

        let result = tokio::task::spawn_blocking(move || {
            let mut leaves = Vec::new();
            for entry in WalkDir::new(&walk_root) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    if let Ok(rel) = entry.path().strip_prefix(&root) {
                        leaves.push(rel.to_path_buf());
                    }
                }
            }
            leaves.sort();
            Ok::<_, walkdir::Error>(leaves)
        })
        .await;

        match result {
            Ok(Ok(leaves)) => Ok(leaves),
            Ok(Err(e)) => Err(DiffError::Enumeration {
                path: start,
                source: e.into(),
            }),
            Err(join) => Err(DiffError::Enumeration {
                path: start,
                source: std::io::Error::other(join.to_string()),
            }),
        }
    }
}

/// Outcome counts of a tree walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub unchanged: usize,
    /// Files present on both sides in a format with no diff support.
    pub skipped: usize,
    /// Entries that could not be enumerated, read, parsed or written.
    pub failed: usize,
}

impl WalkReport {
    fn failure() -> Self {
        Self {
            failed: 1,
            ..Self::default()
        }
    }

    /// Total number of entries that produced an artifact.
    pub fn artifacts(&self) -> usize {
        self.added + self.removed + self.changed
    }
}

impl AddAssign for WalkReport {
    fn add_assign(&mut self, rhs: Self) {
        self.added += rhs.added;
        self.removed += rhs.removed;
        self.changed += rhs.changed;
        self.unchanged += rhs.unchanged;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LeafFormat {
    Structured,
    Binary,
    Unsupported,
}

fn leaf_format(path: &Path) -> LeafFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if STRUCTURED_EXTENSIONS.contains(&ext.as_str()) {
        LeafFormat::Structured
    } else if BINARY_EXTENSIONS.contains(&ext.as_str()) {
        LeafFormat::Binary
    } else {
        LeafFormat::Unsupported
    }
}

#[derive(Clone, Copy, Debug)]
enum Side {
    Old,
    New,
}

type WalkFuture = Pin<Box<dyn Future<Output = WalkReport> + Send + 'static>>;

/// Walks an old and a new tree and writes the differences.
#[derive(Clone)]
pub struct TreeWalker {
    old: Arc<dyn TreeSource>,
    new: Arc<dyn TreeSource>,
    writer: ArtifactWriter,
}

impl TreeWalker {
    pub fn new(old: Arc<dyn TreeSource>, new: Arc<dyn TreeSource>, writer: ArtifactWriter) -> Self {
        Self { old, new, writer }
    }

    /// Walk both trees from their roots.
    ///
    /// Returns after every entry has been processed and every artifact
    /// written. Per-entry failures are logged and counted, never raised.
    pub async fn walk(&self) -> WalkReport {
        let report = self.walk_dir(PathBuf::new()).await;
        info!(
            added = report.added,
            removed = report.removed,
            changed = report.changed,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failed,
            "tree walk complete"
        );
        report
    }

    fn walk_dir(&self, relative: PathBuf) -> WalkFuture {
        let walker = self.clone();
        Box::pin(async move {
            let (old_list, new_list) =
                tokio::join!(walker.old.list(&relative), walker.new.list(&relative));
            let (old_entries, new_entries) = match (old_list, new_list) {
                (Ok(old), Ok(new)) => (old, new),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(path = %relative.display(), error = %e, "enumeration failed; skipping subtree");
                    return WalkReport::failure();
                }
            };

            let old_kinds: BTreeMap<String, EntryKind> =
                old_entries.into_iter().map(|e| (e.name, e.kind)).collect();
            let new_kinds: BTreeMap<String, EntryKind> =
                new_entries.into_iter().map(|e| (e.name, e.kind)).collect();
            let names: BTreeSet<&String> = old_kinds.keys().chain(new_kinds.keys()).collect();

            let mut tasks = JoinSet::new();
            for name in names {
                let child = relative.join(name);
                match (old_kinds.get(name).copied(), new_kinds.get(name).copied()) {
                    (Some(EntryKind::Directory), Some(EntryKind::Directory)) => {
                        tasks.spawn(walker.walk_dir(child));
                    }
                    (Some(EntryKind::File), Some(EntryKind::File)) => {
                        let w = walker.clone();
                        tasks.spawn(async move { w.compare_file(child).await });
                    }
                    (old_kind, new_kind) => {
                        if let Some(kind) = old_kind {
                            let w = walker.clone();
                            let path = child.clone();
                            tasks.spawn(async move { w.copy_side(Side::Old, path, kind).await });
                        }
                        if let Some(kind) = new_kind {
                            let w = walker.clone();
                            tasks.spawn(async move { w.copy_side(Side::New, child, kind).await });
                        }
                    }
                }
            }

            let mut report = WalkReport::default();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(child_report) => report += child_report,
                    Err(e) => {
                        error!(path = %relative.display(), error = %e, "walk task aborted");
                        report.failed += 1;
                    }
                }
            }
            report
        })
    }

    /// Copy every file beneath an entry that exists on one side only.
    async fn copy_side(&self, side: Side, relative: PathBuf, kind: EntryKind) -> WalkReport {
        let (source, artifact) = match side {
            Side::Old => (&self.old, ArtifactKind::Removed),
            Side::New => (&self.new, ArtifactKind::Added),
        };

        let leaves = match kind {
            EntryKind::File => vec![relative.clone()],
            EntryKind::Directory => match source.leaves(&relative).await {
                Ok(leaves) => leaves,
                Err(e) => {
                    warn!(path = %relative.display(), error = %e, "enumeration failed; skipping subtree");
                    return WalkReport::failure();
                }
            },
        };

        let mut report = WalkReport::default();
        for leaf in leaves {
            let written = match source.read(&leaf).await {
                Ok(data) => self.writer.write(artifact, &leaf, &data).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => match side {
                    Side::Old => report.removed += 1,
                    Side::New => report.added += 1,
                },
                Err(e) => {
                    warn!(path = %leaf.display(), kind = %artifact, error = %e, "failed to copy entry");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Compare one file present on both sides.
    async fn compare_file(&self, relative: PathBuf) -> WalkReport {
        let format = leaf_format(&relative);
        if format == LeafFormat::Unsupported {
            debug!(path = %relative.display(), "no diff support for format; skipped");
            return WalkReport {
                skipped: 1,
                ..WalkReport::default()
            };
        }

        match self.compare_supported(&relative, format).await {
            Ok(true) => WalkReport {
                changed: 1,
                ..WalkReport::default()
            },
            Ok(false) => WalkReport {
                unchanged: 1,
                ..WalkReport::default()
            },
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "diff skipped for entry");
                WalkReport::failure()
            }
        }
    }

    /// Returns whether an artifact was written.
    async fn compare_supported(&self, relative: &Path, format: LeafFormat) -> DiffResult<bool> {
        let (old, new) = tokio::join!(self.old.read(relative), self.new.read(relative));
        let (old, new) = (old?, new?);

        match format {
            LeafFormat::Structured => {
                let parse = |data: &[u8]| {
                    serde_json::from_slice::<serde_json::Value>(data).map_err(|source| {
                        DiffError::Parse {
                            path: relative.to_path_buf(),
                            source,
                        }
                    })
                };
                let result = diff(&parse(&old[..])?, &parse(&new[..])?);
                if result.is_empty() {
                    return Ok(false);
                }
                self.writer
                    .write_json(ArtifactKind::Changed, relative, &result)
                    .await?;
                Ok(true)
            }
            LeafFormat::Binary => match diff_blobs(&old, &new) {
                BlobDiff::Unchanged => Ok(false),
                BlobDiff::Changed { .. } => {
                    self.writer.write(ArtifactKind::Removed, relative, &old).await?;
                    self.writer.write(ArtifactKind::Added, relative, &new).await?;
                    Ok(true)
                }
            },
            LeafFormat::Unsupported => Ok(false),
        }
    }
}
