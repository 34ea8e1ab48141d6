use std::collections::HashMap;
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;

use cw_types::{ChangeEvent, FileContext};
use serde::{Deserialize, Serialize};
use tokio::task::{self, JoinSet};
use tracing::{debug, error, warn};

use crate::error::HandlerError;
use crate::registry::{ListenerRegistry, ListenerScope};

/// Dispatcher settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Deadline for a single handler. `None` lets handlers run to completion.
    pub handler_timeout: Option<Duration>,
}

/// Outcome counts of one or more dispatch calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Handlers selected by scope.
    pub matched: usize,
    pub succeeded: usize,
    /// Handlers that returned an error, timed out, or panicked.
    pub failed: usize,
}

impl AddAssign for DispatchReport {
    fn add_assign(&mut self, rhs: Self) {
        self.matched += rhs.matched;
        self.succeeded += rhs.succeeded;
        self.failed += rhs.failed;
    }
}

/// Runs matching listeners for changed entries.
///
/// Every handler selected for one dispatch call runs as its own task; the
/// call returns only after all of them have finished. Failures are captured
/// per task, logged with the entry and listener, and never propagated.
#[derive(Clone, Debug)]
pub struct ChangeDispatcher {
    registry: Arc<ListenerRegistry>,
    config: DispatchConfig,
}

impl ChangeDispatcher {
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self::with_config(registry, DispatchConfig::default())
    }

    pub fn with_config(registry: Arc<ListenerRegistry>, config: DispatchConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// Dispatch a change given as its optional old and new sides.
    ///
    /// Calling this with both sides absent is a contract violation; it is
    /// logged and nothing runs.
    pub async fn dispatch(&self, old: Option<FileContext>, new: Option<FileContext>) -> DispatchReport {
        match ChangeEvent::new(old, new) {
            Ok(event) => self.dispatch_event(event).await,
            Err(e) => {
                warn!(error = %e, "dispatch called without an entry; ignored");
                DispatchReport::default()
            }
        }
    }

    /// Dispatch a change event to every matching listener and wait for all
    /// of them.
    pub async fn dispatch_event(&self, event: ChangeEvent) -> DispatchReport {
        let identity = event.identity();
        let selected = self.registry.matching(&identity);
        let mut report = DispatchReport {
            matched: selected.len(),
            ..DispatchReport::default()
        };
        if selected.is_empty() {
            return report;
        }
        debug!(entry = %identity, kind = %event.kind(), listeners = selected.len(), "dispatching change");

        let event = Arc::new(event);
        let mut tasks = JoinSet::new();
        let mut owners: HashMap<task::Id, (&str, ListenerScope)> = HashMap::new();
        for registration in selected {
            let handler = Arc::clone(registration.handler());
            let event = Arc::clone(&event);
            let timeout = self.config.handler_timeout;
            let spawned = tasks.spawn(async move {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, handler.handle(&event))
                        .await
                        .unwrap_or(Err(HandlerError::Timeout(limit))),
                    None => handler.handle(&event).await,
                }
            });
            owners.insert(spawned.id(), (registration.name(), *registration.scope()));
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, Ok(outcome)),
                Err(e) => (e.id(), Err(e)),
            };
            let (name, scope) = owners
                .get(&id)
                .copied()
                .unwrap_or(("<unknown>", ListenerScope::index(identity.index)));
            match outcome {
                Ok(Ok(())) => report.succeeded += 1,
                Ok(Err(e @ HandlerError::Decode(_))) => {
                    warn!(entry = %identity, listener = name, %scope, error = %e, "decode failed, diff skipped");
                    report.failed += 1;
                }
                Ok(Err(e)) => {
                    warn!(entry = %identity, listener = name, %scope, error = %e, "listener failed");
                    report.failed += 1;
                }
                Err(e) => {
                    error!(entry = %identity, listener = name, %scope, error = %e, "listener task panicked");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerResult;
    use crate::handler::ChangeHandler;
    use crate::registry::ListenerScope;
    use async_trait::async_trait;
    use bytes::Bytes;
    use cw_types::{config_archive, CacheRevision, ChangeKind, EntryIdentity, IndexType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
        seen: Mutex<Vec<(ChangeKind, bool, bool)>>,
    }

    #[async_trait]
    impl ChangeHandler for Recorder {
        async fn handle(&self, event: &ChangeEvent) -> HandlerResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((
                event.kind(),
                event.old_file().is_some(),
                event.new_file().is_some(),
            ));
            Ok(())
        }
    }

    struct Failing {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChangeHandler for Failing {
        async fn handle(&self, _event: &ChangeEvent) -> HandlerResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(HandlerError::Failed("boom".into()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl ChangeHandler for Panicking {
        async fn handle(&self, _event: &ChangeEvent) -> HandlerResult {
            panic!("listener bug");
        }
    }

    struct Slow;

    #[async_trait]
    impl ChangeHandler for Slow {
        async fn handle(&self, _event: &ChangeEvent) -> HandlerResult {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn npc_ctx(file: u32, name: &str) -> FileContext {
        FileContext::new(
            EntryIdentity::new(IndexType::Configs, config_archive::NPC, file),
            Bytes::from(format!(r#"{{"name":"{name}"}}"#)),
            CacheRevision::new("new", 1),
        )
    }

    #[tokio::test]
    async fn added_npc_reaches_only_npc_listener() {
        let npc = Arc::new(Recorder::default());
        let item = Arc::new(Recorder::default());
        let mut registry = ListenerRegistry::new();
        registry.register(
            "npc",
            ListenerScope::archive(IndexType::Configs, config_archive::NPC),
            npc.clone(),
        );
        registry.register(
            "item",
            ListenerScope::archive(IndexType::Configs, config_archive::ITEM),
            item.clone(),
        );
        let dispatcher = ChangeDispatcher::new(Arc::new(registry));

        let report = dispatcher.dispatch(None, Some(npc_ctx(1234, "Goblin"))).await;

        assert_eq!(report.matched, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(npc.calls.load(Ordering::SeqCst), 1);
        assert_eq!(item.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            npc.seen.lock().unwrap().as_slice(),
            &[(ChangeKind::Added, false, true)]
        );
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_sibling() {
        let ok = Arc::new(Recorder::default());
        let bad = Arc::new(Failing {
            calls: AtomicUsize::new(0),
        });
        let mut registry = ListenerRegistry::new();
        registry.register("bad", ListenerScope::index(IndexType::Configs), bad.clone());
        registry.register("ok", ListenerScope::index(IndexType::Configs), ok.clone());
        let dispatcher = ChangeDispatcher::new(Arc::new(registry));

        let report = dispatcher
            .dispatch(Some(npc_ctx(1, "Goblin")), Some(npc_ctx(1, "Hobgoblin")))
            .await;

        assert_eq!(bad.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            report,
            DispatchReport {
                matched: 2,
                succeeded: 1,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn panicking_handler_is_contained() {
        let ok = Arc::new(Recorder::default());
        let mut registry = ListenerRegistry::new();
        registry.register("panics", ListenerScope::index(IndexType::Configs), Arc::new(Panicking));
        registry.register("ok", ListenerScope::index(IndexType::Configs), ok.clone());
        let dispatcher = ChangeDispatcher::new(Arc::new(registry));

        let report = dispatcher.dispatch(Some(npc_ctx(1, "Goblin")), None).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn panic_log_names_listener_and_scope() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut registry = ListenerRegistry::new();
        registry.register(
            "exploding-npc-pages",
            ListenerScope::archive(IndexType::Configs, config_archive::NPC),
            Arc::new(Panicking),
        );
        let dispatcher = ChangeDispatcher::new(Arc::new(registry));

        let report = dispatcher.dispatch(None, Some(npc_ctx(7, "Guard"))).await;
        assert_eq!(report.failed, 1);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|l| l.contains("listener task panicked"))
            .expect("panic was logged");
        assert!(line.contains("exploding-npc-pages"), "{line}");
        assert!(line.contains("scope="), "{line}");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handler_times_out() {
        let mut registry = ListenerRegistry::new();
        registry.register("slow", ListenerScope::index(IndexType::Configs), Arc::new(Slow));
        let dispatcher = ChangeDispatcher::with_config(
            Arc::new(registry),
            DispatchConfig {
                handler_timeout: Some(Duration::from_secs(1)),
            },
        );

        let report = dispatcher.dispatch(None, Some(npc_ctx(1, "Goblin"))).await;
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn empty_event_runs_nothing() {
        let rec = Arc::new(Recorder::default());
        let mut registry = ListenerRegistry::new();
        registry.register("all", ListenerScope::index(IndexType::Configs), rec.clone());
        let dispatcher = ChangeDispatcher::new(Arc::new(registry));

        let report = dispatcher.dispatch(None, None).await;
        assert_eq!(report, DispatchReport::default());
        assert_eq!(rec.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_match_returns_immediately() {
        let dispatcher = ChangeDispatcher::new(Arc::new(ListenerRegistry::new()));
        let report = dispatcher.dispatch(None, Some(npc_ctx(1, "Goblin"))).await;
        assert_eq!(report.matched, 0);
    }
}
