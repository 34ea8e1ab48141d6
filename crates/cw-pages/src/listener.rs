//! Shared change handling for entity page listeners.

use std::fmt;
use std::fmt::Write as _;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use cw_decode::{DecodeResult, DecoderRegistry, EntityRecord};
use cw_diff::{diff, line_diff, unmatched_suffix, DiffNode};
use cw_dispatch::{ChangeHandler, HandlerError, HandlerResult};
use cw_types::{ChangeEvent, FileContext};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::builder::{slugify, DocumentBuilder, Page};

/// Collaborators shared by every page listener.
#[derive(Clone)]
pub struct PageContext {
    pub decoders: Arc<DecoderRegistry>,
    pub builder: Arc<dyn DocumentBuilder>,
}

impl PageContext {
    pub fn new(decoders: Arc<DecoderRegistry>, builder: Arc<dyn DocumentBuilder>) -> Self {
        Self { decoders, builder }
    }
}

impl fmt::Debug for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("decoders", &self.decoders)
            .finish_non_exhaustive()
    }
}

/// An entity type that gets its own section of pages.
pub(crate) trait PageSubject: Serialize + Sized + Send + Sync + 'static {
    const SECTION: &'static str;

    /// Convert a decoded record. `Ok(None)` means the record belongs to
    /// another listener sharing the same archive.
    fn from_record(record: EntityRecord) -> DecodeResult<Option<Self>>;

    fn id(&self) -> u32;

    fn title(&self) -> String;

    /// Text the page slug is built from. Must not include fields that
    /// change between versions, or a modified page lands in a new file.
    fn slug_name(&self) -> String {
        self.title()
    }
}

/// Decodes both sides of a change and writes a page describing it.
pub(crate) struct PageListener<T> {
    ctx: Arc<PageContext>,
    _subject: PhantomData<fn() -> T>,
}

impl<T: PageSubject> PageListener<T> {
    pub(crate) fn new(ctx: Arc<PageContext>) -> Self {
        Self {
            ctx,
            _subject: PhantomData,
        }
    }

    fn decode(&self, file: Option<&FileContext>) -> Result<Option<T>, HandlerError> {
        let Some(file) = file else {
            return Ok(None);
        };
        let record = self.ctx.decoders.decode(file)?;
        Ok(T::from_record(record)?)
    }
}

#[async_trait]
impl<T: PageSubject> ChangeHandler for PageListener<T> {
    async fn handle(&self, event: &ChangeEvent) -> HandlerResult {
        let old = self.decode(event.old_file())?;
        let new = self.decode(event.new_file())?;
        let version = event
            .new_file()
            .or(event.old_file())
            .map(|f| f.revision.version.as_str())
            .unwrap_or_default();

        let page = match (old, new) {
            (None, Some(new)) => added_page(&new, version),
            (Some(old), None) => removed_page(&old, version),
            (Some(old), Some(new)) => match changed_page(&old, &new, version) {
                Some(page) => page,
                None => {
                    debug!(entry = %event.identity(), "no decoded differences");
                    return Ok(());
                }
            },
            (None, None) => return Ok(()),
        };
        self.ctx
            .builder
            .write_page(&page)
            .await
            .map_err(|e| HandlerError::Document(e.to_string()))
    }
}

fn to_value<T: Serialize>(subject: &T) -> Value {
    serde_json::to_value(subject).unwrap_or(Value::Null)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn page_for<T: PageSubject>(subject: &T, body: String) -> Page {
    let slug = slugify(subject.id(), &subject.slug_name());
    Page::new(T::SECTION, slug, subject.title(), body)
}

fn added_page<T: PageSubject>(new: &T, version: &str) -> Page {
    let mut body = format!("Added in cache {version}.\n\n");
    let fields = diff(&Value::Object(Map::new()), &to_value(new));
    for (path, node) in fields.leaves() {
        match node {
            DiffNode::Added { new: Value::Null } => {}
            DiffNode::Added { new: Value::Array(items) } if items.is_empty() => {}
            DiffNode::Added { new: Value::Object(map) } if map.is_empty() => {}
            DiffNode::Added { new } => {
                let _ = writeln!(body, "{path}: {}", display(new));
            }
            _ => {}
        }
    }
    page_for(new, body)
}

fn removed_page<T: PageSubject>(old: &T, version: &str) -> Page {
    let body = format!("Removed in cache {version}.\n");
    page_for(old, body)
}

fn changed_page<T: PageSubject>(old: &T, new: &T, version: &str) -> Option<Page> {
    let changes = diff(&to_value(old), &to_value(new));
    if changes.is_empty() {
        return None;
    }
    let mut body = format!("Changed in cache {version}.\n\n");
    for (path, node) in changes.leaves() {
        render_leaf(&mut body, &path, node);
    }
    Some(page_for(new, body))
}

fn render_leaf(out: &mut String, path: &str, node: &DiffNode) {
    let _ = match node {
        DiffNode::Changed {
            old: Value::String(old),
            new: Value::String(new),
        } => render_text_change(out, path, old, new),
        DiffNode::Changed { old, new } => {
            writeln!(out, "{path}: {} -> {}", display(old), display(new))
        }
        DiffNode::Added { new } => writeln!(out, "{path}: added {}", display(new)),
        DiffNode::Removed { old } => writeln!(out, "{path}: removed {}", display(old)),
        DiffNode::Branch(_) | DiffNode::Sequence(_) => Ok(()),
    };
}

fn render_text_change(out: &mut String, path: &str, old: &str, new: &str) -> fmt::Result {
    if old.contains('\n') || new.contains('\n') {
        writeln!(out, "{path}:")?;
        return out.write_str(&line_diff(old, new));
    }
    if new.len() > old.len() && new.starts_with(old) {
        return writeln!(out, "{path}: appended \"{}\"", unmatched_suffix(old, new));
    }
    writeln!(out, "{path}: {old} -> {new}")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_text_shows_suffix() {
        let mut out = String::new();
        render_text_change(&mut out, "examine", "A sword.", "A sword. It is sharp.").unwrap();
        assert_eq!(out, "examine: appended \" It is sharp.\"\n");
    }

    #[test]
    fn replaced_text_shows_both_sides() {
        let mut out = String::new();
        render_text_change(&mut out, "name", "Goblin", "Hobgoblin").unwrap();
        assert_eq!(out, "name: Goblin -> Hobgoblin\n");
    }

    #[test]
    fn multi_line_text_uses_line_diff() {
        let mut out = String::new();
        render_text_change(&mut out, "hint", "a\nb\n", "a\nc\n").unwrap();
        assert_eq!(out, "hint:\n-b\n+c\n");
    }

    #[test]
    fn leaf_rendering() {
        let mut out = String::new();
        render_leaf(
            &mut out,
            "combat_level",
            &DiffNode::Changed {
                old: 2.into(),
                new: 5.into(),
            },
        );
        render_leaf(&mut out, "actions[1]", &DiffNode::Added { new: "Attack".into() });
        render_leaf(&mut out, "models[0]", &DiffNode::Removed { old: 12.into() });
        assert_eq!(
            out,
            "combat_level: 2 -> 5\nactions[1]: added Attack\nmodels[0]: removed 12\n"
        );
    }
}
