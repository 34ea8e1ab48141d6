use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::{DocumentError, DocumentResult};

/// One derived page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Grouping of the page, one per entity type (`npcs`, `items`, ...).
    pub section: String,
    /// File-safe page name, unique within its section.
    pub slug: String,
    pub title: String,
    pub body: String,
}

impl Page {
    pub fn new(
        section: impl Into<String>,
        slug: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            section: section.into(),
            slug: slug.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Turn a title into a lowercase, dash-separated page name prefixed with the
/// entity id: `slugify(4151, "Abyssal whip")` is `4151-abyssal-whip`.
pub fn slugify(id: u32, title: &str) -> String {
    let mut slug = id.to_string();
    let mut pending_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Sink for derived pages.
#[async_trait]
pub trait DocumentBuilder: Send + Sync {
    async fn write_page(&self, page: &Page) -> DocumentResult<()>;
}

/// Writes each page to `<root>/<section>/<slug>.txt`. Last write wins.
#[derive(Clone, Debug)]
pub struct DirectoryDocumentBuilder {
    root: PathBuf,
}

impl DirectoryDocumentBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, page: &Page) -> DocumentResult<PathBuf> {
        let valid = |part: &str| {
            !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\'])
        };
        if !valid(&page.section) || !valid(&page.slug) {
            return Err(DocumentError::InvalidLocation {
                section: page.section.clone(),
                slug: page.slug.clone(),
            });
        }
        Ok(self.root.join(&page.section).join(format!("{}.txt", page.slug)))
    }
}

#[async_trait]
impl DocumentBuilder for DirectoryDocumentBuilder {
    async fn write_page(&self, page: &Page) -> DocumentResult<()> {
        let path = self.path_for(page)?;
        let write_err = |source| DocumentError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let contents = format!("{}\n\n{}", page.title, page.body);
        tokio::fs::write(&path, contents).await.map_err(write_err)?;
        debug!(path = %path.display(), "wrote page");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slugify(4151, "Abyssal whip"), "4151-abyssal-whip");
        assert_eq!(slugify(1, "Cook's Assistant"), "1-cook-s-assistant");
        assert_eq!(slugify(7, "  --  "), "7");
        assert_eq!(slugify(7, ""), "7");
    }

    #[tokio::test]
    async fn writes_under_section() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DirectoryDocumentBuilder::new(dir.path());
        let page = Page::new("npcs", "1234-goblin", "Goblin", "Added in cache 231.");

        builder.write_page(&page).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("npcs/1234-goblin.txt")).unwrap();
        assert_eq!(written, "Goblin\n\nAdded in cache 231.");
    }

    #[tokio::test]
    async fn last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DirectoryDocumentBuilder::new(dir.path());
        builder.write_page(&Page::new("items", "1", "A", "first")).await.unwrap();
        builder.write_page(&Page::new("items", "1", "A", "second")).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("items/1.txt")).unwrap();
        assert!(written.ends_with("second"));
    }

    #[tokio::test]
    async fn rejects_escaping_slug() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DirectoryDocumentBuilder::new(dir.path());
        let err = builder
            .write_page(&Page::new("npcs", "../../etc", "x", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidLocation { .. }));
    }
}
