use std::collections::{BTreeMap, BTreeSet};

use cw_diff::changed_common_keys;
use serde::Serialize;

use crate::mapping::NameIdMap;
use crate::types::GameValType;

/// An id that moved between versions while its name stayed the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdChange {
    pub old_id: u32,
    pub new_id: u32,
}

/// Id changes keyed by type, then by name. Types without changes are absent.
pub type IdChanges = BTreeMap<GameValType, BTreeMap<String, IdChange>>;

/// Names present in both mappings whose id changed.
///
/// Names found on only one side are ignored: this detects id churn, not
/// additions or removals.
pub fn compare(old: &NameIdMap, new: &NameIdMap) -> IdChanges {
    let types: BTreeSet<GameValType> = old.types.keys().chain(new.types.keys()).copied().collect();
    let empty = BTreeMap::new();
    let mut changes = IdChanges::new();

    for ty in types {
        let old_names = old.get(ty).unwrap_or(&empty);
        let new_names = new.get(ty).unwrap_or(&empty);
        let changed: BTreeMap<String, IdChange> = changed_common_keys(old_names, new_names)
            .into_iter()
            .map(|(name, (old_id, new_id))| (name, IdChange { old_id, new_id }))
            .collect();
        if !changed.is_empty() {
            changes.insert(ty, changed);
        }
    }
    changes
}
