use async_trait::async_trait;
use cw_types::ChangeEvent;

use crate::error::HandlerResult;

/// Reacts to one changed entry.
///
/// Handlers run concurrently with each other; a handler's failure is logged
/// by the dispatcher and never affects sibling handlers.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    async fn handle(&self, event: &ChangeEvent) -> HandlerResult;
}
