use std::collections::BTreeSet;
use std::future::Future;
use std::ops::AddAssign;
use std::sync::Arc;

use cw_cache::{CacheProvider, CacheResult};
use cw_dispatch::{ChangeDispatcher, DispatchReport};
use cw_types::{ChangeEvent, EntryIdentity, FileContext};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::filter::CategoryFilter;

/// Counts from one comparison run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
    /// Entries whose payload could not be read on either side.
    pub read_failures: usize,
    /// Indices or archives skipped because they could not be listed.
    pub enumeration_failures: usize,
    /// Entry comparisons that panicked.
    pub failed_comparisons: usize,
    pub dispatch: DispatchReport,
}

impl ComparisonReport {
    /// Entries that were dispatched.
    pub fn changed(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

impl AddAssign for ComparisonReport {
    fn add_assign(&mut self, rhs: Self) {
        self.added += rhs.added;
        self.removed += rhs.removed;
        self.modified += rhs.modified;
        self.unchanged += rhs.unchanged;
        self.read_failures += rhs.read_failures;
        self.enumeration_failures += rhs.enumeration_failures;
        self.failed_comparisons += rhs.failed_comparisons;
        self.dispatch += rhs.dispatch;
    }
}

/// Compares two cache versions entry by entry and dispatches every added,
/// removed or modified entry.
///
/// Entries are compared concurrently, bounded by `max_concurrency`. A failure
/// listing an index or archive skips that subtree; a failure reading an entry
/// skips that entry. Neither stops the run.
pub struct CacheComparator {
    old: Arc<dyn CacheProvider>,
    new: Arc<dyn CacheProvider>,
    dispatcher: Arc<ChangeDispatcher>,
    filter: CategoryFilter,
    max_concurrency: usize,
}

impl CacheComparator {
    pub fn new(
        old: Arc<dyn CacheProvider>,
        new: Arc<dyn CacheProvider>,
        dispatcher: Arc<ChangeDispatcher>,
    ) -> Self {
        Self {
            old,
            new,
            dispatcher,
            filter: CategoryFilter::all(),
            max_concurrency: 16,
        }
    }

    pub fn with_filter(mut self, filter: CategoryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Compare every allowed index and wait for all dispatches to finish.
    pub async fn run(&self) -> ComparisonReport {
        let mut report = ComparisonReport::default();
        info!(old = self.old.version(), new = self.new.version(), "comparing caches");

        let Some(indexes) = union(self.old.list_indexes(), self.new.list_indexes()).await else {
            warn!("failed to list indices; nothing compared");
            report.enumeration_failures += 1;
            return report;
        };

        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for index in indexes.into_iter().filter(|i| self.filter.allows(*i)) {
            let Some(archives) =
                union(self.old.list_archives(index), self.new.list_archives(index)).await
            else {
                warn!(%index, "failed to list archives; index skipped");
                report.enumeration_failures += 1;
                continue;
            };

            for archive in archives {
                let Some((old_files, new_files)) = listings(
                    self.old.list_files(index, archive),
                    self.new.list_files(index, archive),
                )
                .await
                else {
                    warn!(%index, archive, "failed to list files; archive skipped");
                    report.enumeration_failures += 1;
                    continue;
                };

                for file in old_files.union(&new_files).copied() {
                    let id = EntryIdentity::new(index, archive, file);
                    let presence = (old_files.contains(&file), new_files.contains(&file));
                    let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                        break;
                    };
                    let old = Arc::clone(&self.old);
                    let new = Arc::clone(&self.new);
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tasks.spawn(async move {
                        let outcome =
                            compare_entry(old.as_ref(), new.as_ref(), &dispatcher, id, presence).await;
                        drop(permit);
                        outcome
                    });
                    while let Some(joined) = tasks.try_join_next() {
                        absorb(&mut report, joined);
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            absorb(&mut report, joined);
        }

        info!(
            added = report.added,
            removed = report.removed,
            modified = report.modified,
            unchanged = report.unchanged,
            failed_listeners = report.dispatch.failed,
            failed_comparisons = report.failed_comparisons,
            "comparison finished"
        );
        report
    }
}

fn absorb(report: &mut ComparisonReport, joined: Result<ComparisonReport, JoinError>) {
    match joined {
        Ok(outcome) => *report += outcome,
        Err(e) => {
            warn!(error = %e, "entry comparison task failed");
            report.failed_comparisons += 1;
        }
    }
}

/// Both sides of a listing, or `None` if either side failed.
async fn listings<T: Ord>(
    old: impl Future<Output = CacheResult<Vec<T>>>,
    new: impl Future<Output = CacheResult<Vec<T>>>,
) -> Option<(BTreeSet<T>, BTreeSet<T>)> {
    let (old, new) = tokio::join!(old, new);
    match (old, new) {
        (Ok(old), Ok(new)) => Some((old.into_iter().collect(), new.into_iter().collect())),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "enumeration failed");
            None
        }
    }
}

/// Sorted union of two listings, or `None` if either side failed.
async fn union<T: Ord>(
    old: impl Future<Output = CacheResult<Vec<T>>>,
    new: impl Future<Output = CacheResult<Vec<T>>>,
) -> Option<BTreeSet<T>> {
    let (mut old, new) = listings(old, new).await?;
    old.extend(new);
    Some(old)
}

/// Read one side if the entry is present there.
async fn read_side(
    provider: &dyn CacheProvider,
    id: EntryIdentity,
    present: bool,
) -> CacheResult<Option<FileContext>> {
    if !present {
        return Ok(None);
    }
    provider.read_context(id).await.map(Some)
}

async fn compare_entry(
    old: &dyn CacheProvider,
    new: &dyn CacheProvider,
    dispatcher: &ChangeDispatcher,
    id: EntryIdentity,
    (in_old, in_new): (bool, bool),
) -> ComparisonReport {
    let mut report = ComparisonReport::default();
    let (old_side, new_side) = tokio::join!(read_side(old, id, in_old), read_side(new, id, in_new));
    let (old_side, new_side) = match (old_side, new_side) {
        (Ok(o), Ok(n)) => (o, n),
        (Err(e), _) | (_, Err(e)) => {
            warn!(entry = %id, error = %e, "failed to read entry; skipped");
            report.read_failures += 1;
            return report;
        }
    };

    let event = match (old_side, new_side) {
        (Some(o), Some(n)) if o.payload == n.payload => {
            report.unchanged += 1;
            return report;
        }
        (Some(o), Some(n)) => {
            report.modified += 1;
            ChangeEvent::modified(o, n)
        }
        (None, Some(n)) => {
            report.added += 1;
            ChangeEvent::added(n)
        }
        (Some(o), None) => {
            report.removed += 1;
            ChangeEvent::removed(o)
        }
        (None, None) => return report,
    };
    debug!(entry = %id, kind = %event.kind(), "entry changed");
    report.dispatch = dispatcher.dispatch_event(event).await;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use cw_cache::{CacheError, InMemoryCacheProvider};
    use cw_dispatch::{ChangeHandler, HandlerResult, ListenerRegistry, ListenerScope};
    use cw_types::{config_archive, ArchiveId, ChangeKind, FileId, IndexType};
    use std::sync::Mutex;

    /// In-memory cache that fails on selected archives and entries.
    struct FlakyCache {
        inner: InMemoryCacheProvider,
        unlistable: Option<(IndexType, ArchiveId)>,
        unreadable: Option<EntryIdentity>,
        panics_on: Option<EntryIdentity>,
    }

    impl FlakyCache {
        fn new(inner: InMemoryCacheProvider) -> Self {
            Self {
                inner,
                unlistable: None,
                unreadable: None,
                panics_on: None,
            }
        }
    }

    fn io_error(what: &str) -> CacheError {
        CacheError::Io(std::io::Error::other(what.to_string()))
    }

    #[async_trait]
    impl CacheProvider for FlakyCache {
        fn version(&self) -> &str {
            self.inner.version()
        }

        async fn list_indexes(&self) -> CacheResult<Vec<IndexType>> {
            self.inner.list_indexes().await
        }

        async fn list_archives(&self, index: IndexType) -> CacheResult<Vec<ArchiveId>> {
            self.inner.list_archives(index).await
        }

        async fn list_files(&self, index: IndexType, archive: ArchiveId) -> CacheResult<Vec<FileId>> {
            if self.unlistable == Some((index, archive)) {
                return Err(io_error("archive table truncated"));
            }
            self.inner.list_files(index, archive).await
        }

        async fn read_file(&self, id: EntryIdentity) -> CacheResult<Bytes> {
            if self.panics_on == Some(id) {
                panic!("corrupt container for {id}");
            }
            if self.unreadable == Some(id) {
                return Err(io_error("bad sector"));
            }
            self.inner.read_file(id).await
        }

        async fn index_revision(&self, index: IndexType) -> CacheResult<u32> {
            self.inner.index_revision(index).await
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(EntryIdentity, ChangeKind)>>,
    }

    #[async_trait]
    impl ChangeHandler for Recorder {
        async fn handle(&self, event: &ChangeEvent) -> HandlerResult {
            self.seen.lock().unwrap().push((event.identity(), event.kind()));
            Ok(())
        }
    }

    fn npc(file: u32) -> EntryIdentity {
        EntryIdentity::new(IndexType::Configs, config_archive::NPC, file)
    }

    fn item(file: u32) -> EntryIdentity {
        EntryIdentity::new(IndexType::Configs, config_archive::ITEM, file)
    }

    fn setup(scope: ListenerScope) -> (Arc<Recorder>, Arc<ChangeDispatcher>) {
        let recorder = Arc::new(Recorder::default());
        let mut registry = ListenerRegistry::new();
        registry.register("recorder", scope, recorder.clone());
        (recorder, Arc::new(ChangeDispatcher::new(Arc::new(registry))))
    }

    #[tokio::test]
    async fn classifies_entries() {
        let old = InMemoryCacheProvider::new("230")
            .with_file(npc(1), r#"{"name":"Goblin"}"#)
            .with_file(npc(2), r#"{"name":"Imp"}"#)
            .with_file(npc(3), r#"{"name":"Guard"}"#);
        let new = InMemoryCacheProvider::new("231")
            .with_file(npc(1), r#"{"name":"Goblin"}"#)
            .with_file(npc(3), r#"{"name":"Guard","combat_level":22}"#)
            .with_file(npc(1234), r#"{"name":"Goblin"}"#);
        let (recorder, dispatcher) = setup(ListenerScope::index(IndexType::Configs));

        let report = CacheComparator::new(Arc::new(old), Arc::new(new), dispatcher)
            .run()
            .await;

        assert_eq!(report.added, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.modified, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.dispatch.succeeded, 3);

        let mut seen = recorder.seen.lock().unwrap().clone();
        seen.sort_by_key(|(id, _)| *id);
        assert_eq!(
            seen,
            vec![
                (npc(2), ChangeKind::Removed),
                (npc(3), ChangeKind::Modified),
                (npc(1234), ChangeKind::Added),
            ]
        );
    }

    #[tokio::test]
    async fn scoped_listener_sees_only_its_archive() {
        let old = InMemoryCacheProvider::new("230");
        let new = InMemoryCacheProvider::new("231")
            .with_file(npc(1234), r#"{"name":"Goblin"}"#)
            .with_file(item(4151), r#"{"name":"Abyssal whip"}"#);
        let (recorder, dispatcher) =
            setup(ListenerScope::archive(IndexType::Configs, config_archive::ITEM));

        let report = CacheComparator::new(Arc::new(old), Arc::new(new), dispatcher)
            .run()
            .await;

        assert_eq!(report.added, 2);
        assert_eq!(report.dispatch.matched, 1);
        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            &[(item(4151), ChangeKind::Added)]
        );
    }

    #[tokio::test]
    async fn excluded_index_is_not_compared() {
        let sprite = EntryIdentity::new(IndexType::Sprites, 10, 0);
        let old = InMemoryCacheProvider::new("230");
        let new = InMemoryCacheProvider::new("231")
            .with_file(sprite, vec![1u8, 2, 3])
            .with_file(npc(1), "{}");
        let (recorder, dispatcher) = setup(ListenerScope::index(IndexType::Sprites));

        let report = CacheComparator::new(Arc::new(old), Arc::new(new), dispatcher)
            .with_filter(CategoryFilter::new([], [IndexType::Sprites]))
            .with_max_concurrency(1)
            .run()
            .await;

        assert_eq!(report.added, 1);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn identical_caches_dispatch_nothing() {
        let old = InMemoryCacheProvider::new("230").with_file(npc(1), "{}");
        let new = InMemoryCacheProvider::new("231").with_file(npc(1), "{}");
        let (recorder, dispatcher) = setup(ListenerScope::index(IndexType::Configs));

        let report = CacheComparator::new(Arc::new(old), Arc::new(new), dispatcher)
            .run()
            .await;

        assert_eq!(report.unchanged, 1);
        assert_eq!(report.changed(), 0);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    fn flaky_pair() -> (InMemoryCacheProvider, InMemoryCacheProvider) {
        let old = InMemoryCacheProvider::new("230")
            .with_file(npc(1), r#"{"name":"Goblin"}"#)
            .with_file(npc(2), r#"{"name":"Imp"}"#)
            .with_file(item(1), r#"{"name":"Sword"}"#);
        let new = InMemoryCacheProvider::new("231")
            .with_file(npc(1), r#"{"name":"Hobgoblin"}"#)
            .with_file(npc(2), r#"{"name":"Imps"}"#)
            .with_file(item(1), r#"{"name":"Longsword"}"#);
        (old, new)
    }

    #[tokio::test]
    async fn listing_and_read_failures_skip_only_their_entries() {
        let (old, new) = flaky_pair();
        let mut new = FlakyCache::new(new);
        new.unlistable = Some((IndexType::Configs, config_archive::ITEM));
        new.unreadable = Some(npc(2));
        let (recorder, dispatcher) = setup(ListenerScope::index(IndexType::Configs));

        let report = CacheComparator::new(Arc::new(old), Arc::new(new), dispatcher)
            .run()
            .await;

        assert_eq!(report.enumeration_failures, 1);
        assert_eq!(report.read_failures, 1);
        assert_eq!(report.modified, 1);
        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            &[(npc(1), ChangeKind::Modified)]
        );
    }

    #[tokio::test]
    async fn panicking_read_is_counted_and_contained() {
        let (old, new) = flaky_pair();
        let mut new = FlakyCache::new(new);
        new.panics_on = Some(npc(2));
        let (recorder, dispatcher) =
            setup(ListenerScope::archive(IndexType::Configs, config_archive::NPC));

        let report = CacheComparator::new(Arc::new(old), Arc::new(new), dispatcher)
            .run()
            .await;

        assert_eq!(report.failed_comparisons, 1);
        assert_eq!(report.modified, 2);
        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            &[(npc(1), ChangeKind::Modified)]
        );
    }

    #[tokio::test]
    async fn large_cache_with_low_concurrency_counts_every_entry() {
        let mut old = InMemoryCacheProvider::new("230");
        let mut new = InMemoryCacheProvider::new("231");
        for file in 0..500 {
            old = old.with_file(npc(file), format!("{{\"id\":{file}}}"));
            let payload = if file % 5 == 0 {
                format!("{{\"id\":{file},\"v\":2}}")
            } else {
                format!("{{\"id\":{file}}}")
            };
            new = new.with_file(npc(file), payload);
        }
        let (recorder, dispatcher) = setup(ListenerScope::index(IndexType::Configs));

        let report = CacheComparator::new(Arc::new(old), Arc::new(new), dispatcher)
            .with_max_concurrency(2)
            .run()
            .await;

        assert_eq!(report.modified, 100);
        assert_eq!(report.unchanged, 400);
        assert_eq!(report.failed_comparisons, 0);
        assert_eq!(recorder.seen.lock().unwrap().len(), 100);
    }
}
