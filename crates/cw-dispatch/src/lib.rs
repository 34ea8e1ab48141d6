//! Change dispatch for cachewatch.
//!
//! Listeners register a [`ListenerScope`] (a required index plus optional
//! archive and file refinements) and a [`ChangeHandler`]. The
//! [`ChangeDispatcher`] runs every handler whose scope matches a changed
//! entry, concurrently, and waits for all of them before returning.
//!
//! The [`ListenerRegistry`] is built once at startup and shared read-only
//! behind an `Arc` afterwards.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod registry;

pub use dispatcher::{ChangeDispatcher, DispatchConfig, DispatchReport};
pub use error::{HandlerError, HandlerResult};
pub use handler::ChangeHandler;
pub use registry::{ListenerRegistry, ListenerScope, Registration};
