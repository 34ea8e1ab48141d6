//! Cache comparison engine for cachewatch.
//!
//! [`CacheComparator`] enumerates two cache versions side by side and turns
//! every added, removed or modified entry into a change event for the
//! [`ChangeDispatcher`](cw_dispatch::ChangeDispatcher). Only setup failures
//! are returned as errors; everything below that is logged and counted in the
//! [`ComparisonReport`].

pub mod comparator;
pub mod config;
pub mod error;
pub mod filter;

pub use comparator::{CacheComparator, ComparisonReport};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use filter::CategoryFilter;
