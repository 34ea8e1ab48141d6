use std::fmt;
use std::sync::Arc;

use cw_types::{ArchiveId, EntryIdentity, FileId, IndexType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::handler::ChangeHandler;

/// Which entries a listener is interested in.
///
/// The index is required; an unset archive or file matches any value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerScope {
    pub index: IndexType,
    pub archive: Option<ArchiveId>,
    pub file: Option<FileId>,
}

impl ListenerScope {
    /// Every entry of `index`.
    pub fn index(index: IndexType) -> Self {
        Self {
            index,
            archive: None,
            file: None,
        }
    }

    /// Every entry of one archive.
    pub fn archive(index: IndexType, archive: ArchiveId) -> Self {
        Self::index(index).with_archive(archive)
    }

    pub fn with_archive(mut self, archive: ArchiveId) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_file(mut self, file: FileId) -> Self {
        self.file = Some(file);
        self
    }

    /// Returns `true` if an entry falls inside this scope.
    pub fn matches(&self, id: &EntryIdentity) -> bool {
        if self.index != id.index {
            return false;
        }
        if let Some(archive) = self.archive {
            if archive != id.archive {
                return false;
            }
        }
        if let Some(file) = self.file {
            if file != id.file {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for ListenerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)?;
        match self.archive {
            Some(archive) => write!(f, "/{archive}")?,
            None => f.write_str("/*")?,
        }
        match self.file {
            Some(file) => write!(f, "/{file}"),
            None => f.write_str("/*"),
        }
    }
}

/// A registered listener: a name for logs, a scope and a handler.
#[derive(Clone)]
pub struct Registration {
    name: String,
    scope: ListenerScope,
    handler: Arc<dyn ChangeHandler>,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &ListenerScope {
        &self.scope
    }

    pub fn handler(&self) -> &Arc<dyn ChangeHandler> {
        &self.handler
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Append-only collection of listeners.
///
/// Populated once at startup, then wrapped in an `Arc` and handed to the
/// [`ChangeDispatcher`](crate::ChangeDispatcher); it is never mutated while
/// dispatching.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    registrations: Vec<Registration>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every entry inside `scope`.
    pub fn register(&mut self, name: impl Into<String>, scope: ListenerScope, handler: Arc<dyn ChangeHandler>) {
        let name = name.into();
        debug!(listener = %name, %scope, "registered listener");
        self.registrations.push(Registration {
            name,
            scope,
            handler,
        });
    }

    /// Every registration whose scope matches `id`, in registration order.
    pub fn matching(&self, id: &EntryIdentity) -> Vec<&Registration> {
        self.registrations
            .iter()
            .filter(|r| r.scope.matches(id))
            .collect()
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
