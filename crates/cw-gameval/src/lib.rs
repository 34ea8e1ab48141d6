//! GameVal id churn detection.
//!
//! The GameVals index names entities: each archive holds one classification
//! type (items, npcs, ...) and each file maps the file id to a name. Between
//! two cache versions a name is expected to keep its id; this crate finds the
//! names whose id changed.
//!
//! ```text
//! build_mapping(old) ─┐
//!                     ├─ compare ─> IdChanges ─> GameValReport (JSON + CSV)
//! build_mapping(new) ─┘
//! ```

pub mod compare;
pub mod error;
pub mod mapping;
pub mod report;
pub mod types;

pub use compare::{compare, IdChange, IdChanges};
pub use error::{GameValError, GameValResult};
pub use mapping::{build_mapping, NameIdMap};
pub use report::{GameValReport, ReportSummary, REPORT_FILE};
pub use types::GameValType;
