//! Derived page listeners for cachewatch.
//!
//! Each entity module registers exactly one listener with the
//! [`ListenerRegistry`]. When an entry of its archive changes, the listener
//! decodes both sides and hands a [`Page`] to the [`DocumentBuilder`]:
//!
//! - added entries get a page describing the new record
//! - removed entries get a removal notice
//! - modified entries get a page listing every changed field, or nothing
//!   when the decoded records are equal
//!
//! Music and quest listeners share the database row archive and ignore
//! rows of each other's tables.

pub mod area;
pub mod builder;
pub mod error;
pub mod item;
pub mod listener;
pub mod music;
pub mod npc;
pub mod object;
pub mod quest;

use std::sync::Arc;

use cw_dispatch::ListenerRegistry;

pub use builder::{slugify, DirectoryDocumentBuilder, DocumentBuilder, Page};
pub use error::{DocumentError, DocumentResult};
pub use listener::PageContext;

/// Register the listener of every entity module.
pub fn register_all(registry: &mut ListenerRegistry, ctx: Arc<PageContext>) {
    area::register(registry, Arc::clone(&ctx));
    item::register(registry, Arc::clone(&ctx));
    npc::register(registry, Arc::clone(&ctx));
    object::register(registry, Arc::clone(&ctx));
    music::register(registry, Arc::clone(&ctx));
    quest::register(registry, ctx);
}
