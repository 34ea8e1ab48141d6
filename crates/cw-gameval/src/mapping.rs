use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use cw_cache::CacheProvider;
use cw_types::{EntryIdentity, IndexType};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{GameValError, GameValResult};
use crate::types::GameValType;

/// Name to id mapping for one cache version, per GameVal type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameIdMap {
    pub types: BTreeMap<GameValType, BTreeMap<String, u32>>,
    /// Requested types that produced no mapping.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_types: Vec<GameValType>,
}

impl NameIdMap {
    pub fn get(&self, ty: GameValType) -> Option<&BTreeMap<String, u32>> {
        self.types.get(&ty)
    }

    /// Insert or replace the names of one type.
    pub fn insert(&mut self, ty: GameValType, names: BTreeMap<String, u32>) {
        self.types.insert(ty, names);
    }
}

/// Decode a GameVal payload: UTF-8 text with optional trailing NULs.
fn decode_name(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?;
    let name = text.trim_end_matches('\0').trim();
    (!name.is_empty()).then(|| name.to_string())
}

async fn load_type(provider: &dyn CacheProvider, ty: GameValType) -> GameValResult<BTreeMap<String, u32>> {
    let archive = ty.archive();
    let files = provider.list_files(IndexType::GameVals, archive).await?;
    let mut names = BTreeMap::new();

    for file in files {
        let id = EntryIdentity::new(IndexType::GameVals, archive, file);
        let payload = match provider.read_file(id).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(gameval_type = %ty, entry = %id, error = %e, "failed to read gameval entry");
                continue;
            }
        };
        let Some(name) = decode_name(&payload) else {
            warn!(gameval_type = %ty, entry = %id, "skipping gameval entry without a name");
            continue;
        };
        match names.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(file);
            }
            Entry::Occupied(slot) => {
                warn!(
                    gameval_type = %ty,
                    name = %slot.key(),
                    kept = *slot.get(),
                    ignored = file,
                    "duplicate gameval name"
                );
            }
        }
    }

    if names.is_empty() {
        return Err(GameValError::NoNames(ty));
    }
    Ok(names)
}

/// Build the name to id mapping of `types` from one cache.
///
/// Entries with a blank name are skipped with a warning. A type fails only
/// when it yields no names at all; it is then logged, left out of
/// [`NameIdMap::types`] and listed in [`NameIdMap::failed_types`].
pub async fn build_mapping(provider: &dyn CacheProvider, types: &[GameValType]) -> NameIdMap {
    let mut mapping = NameIdMap::default();
    for &ty in types {
        match load_type(provider, ty).await {
            Ok(names) => {
                debug!(version = provider.version(), gameval_type = %ty, names = names.len(), "loaded gameval names");
                mapping.insert(ty, names);
            }
            Err(e) => {
                warn!(version = provider.version(), gameval_type = %ty, error = %e, "gameval type failed");
                mapping.failed_types.push(ty);
            }
        }
    }
    mapping
}
