//! Cache provider boundary for cachewatch.
//!
//! The diff engine never decodes the cache container format itself. It talks
//! to a [`CacheProvider`], which enumerates indices, archives and files and
//! returns raw file payloads.
//!
//! # Providers
//!
//! - [`InMemoryCacheProvider`] -- `BTreeMap`-based provider for tests and embedding
//! - [`DiskCacheProvider`] -- reads an unpacked cache laid out as
//!   `<dir>/<index>/<archive>/<file>.dat`
//!
//! # Design Rules
//!
//! 1. Providers are read-only; nothing in cachewatch mutates cache storage.
//! 2. Enumeration never fails for "not found": a missing index or archive
//!    enumerates as empty.
//! 3. Individual read failures are surfaced as errors so callers can recover
//!    per entry.

pub mod disk;
pub mod error;
pub mod locator;
pub mod memory;
pub mod traits;

pub use disk::DiskCacheProvider;
pub use error::{CacheError, CacheResult};
pub use locator::{CacheLocator, LATEST};
pub use memory::InMemoryCacheProvider;
pub use traits::CacheProvider;
