use std::collections::BTreeSet;

use cw_types::IndexType;
use serde::Serialize;

/// Allow/deny list of cache indices. The deny list wins; an empty allow list
/// allows everything not denied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CategoryFilter {
    include: BTreeSet<IndexType>,
    exclude: BTreeSet<IndexType>,
}

impl CategoryFilter {
    pub fn new(
        include: impl IntoIterator<Item = IndexType>,
        exclude: impl IntoIterator<Item = IndexType>,
    ) -> Self {
        Self {
            include: include.into_iter().collect(),
            exclude: exclude.into_iter().collect(),
        }
    }

    /// A filter that allows every index.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn allows(&self, index: IndexType) -> bool {
        if self.exclude.contains(&index) {
            return false;
        }
        self.include.is_empty() || self.include.contains(&index)
    }
}
