//! JSON and CSV reports of GameVal id churn.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::compare::{IdChange, IdChanges};
use crate::error::{GameValError, GameValResult};
use crate::mapping::NameIdMap;
use crate::types::GameValType;

/// File name of the JSON report.
pub const REPORT_FILE: &str = "gameval-changes.json";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub generated_at: DateTime<Utc>,
    pub old_version: String,
    pub new_version: String,
    pub types_compared: Vec<GameValType>,
    pub failed_types: Vec<GameValType>,
    pub total_changes: usize,
}

/// Everything written for one comparison.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameValReport {
    pub summary: ReportSummary,
    pub old_mapping: NameIdMap,
    pub new_mapping: NameIdMap,
    pub changes: IdChanges,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "OldId")]
    old_id: u32,
    #[serde(rename = "NewId")]
    new_id: u32,
}

impl GameValReport {
    pub fn new(
        old_version: impl Into<String>,
        new_version: impl Into<String>,
        old_mapping: NameIdMap,
        new_mapping: NameIdMap,
        changes: IdChanges,
    ) -> Self {
        let types_compared: Vec<GameValType> = old_mapping
            .types
            .keys()
            .filter(|ty| new_mapping.types.contains_key(ty))
            .copied()
            .collect();
        let mut failed_types: Vec<GameValType> = old_mapping
            .failed_types
            .iter()
            .chain(&new_mapping.failed_types)
            .copied()
            .collect();
        failed_types.sort();
        failed_types.dedup();

        let summary = ReportSummary {
            generated_at: Utc::now(),
            old_version: old_version.into(),
            new_version: new_version.into(),
            types_compared,
            failed_types,
            total_changes: changes.values().map(|names| names.len()).sum(),
        };
        Self {
            summary,
            old_mapping,
            new_mapping,
            changes,
        }
    }

    /// CSV text (`Name,OldId,NewId`) of one type's changes.
    pub fn csv_for(ty_changes: &BTreeMap<String, IdChange>) -> GameValResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for (name, change) in ty_changes {
            writer.serialize(CsvRow {
                name,
                old_id: change.old_id,
                new_id: change.new_id,
            })?;
        }
        writer
            .into_inner()
            .map_err(|e| GameValError::Csv(csv::Error::from(e.into_error())))
    }

    /// Write the JSON report and one CSV per type with changes into `dir`.
    /// Returns the written paths.
    pub async fn write_to(&self, dir: &Path) -> GameValResult<Vec<PathBuf>> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| GameValError::Write { path, source }
        };
        tokio::fs::create_dir_all(dir).await.map_err(write_err(dir))?;

        let mut written = Vec::new();
        let json_path = dir.join(REPORT_FILE);
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&json_path, json).await.map_err(write_err(&json_path))?;
        written.push(json_path);

        for (ty, names) in &self.changes {
            let csv_path = dir.join(format!("{ty}-changes.csv"));
            let csv = Self::csv_for(names)?;
            tokio::fs::write(&csv_path, csv).await.map_err(write_err(&csv_path))?;
            written.push(csv_path);
        }

        info!(
            dir = %dir.display(),
            changes = self.summary.total_changes,
            files = written.len(),
            "wrote gameval report"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;

    fn mapping(ty: GameValType, names: &[(&str, u32)]) -> NameIdMap {
        let mut map = NameIdMap::default();
        map.insert(ty, names.iter().map(|(n, id)| (n.to_string(), *id)).collect());
        map
    }

    fn report() -> GameValReport {
        let old = mapping(GameValType::Items, &[("Sword", 5), ("Shield", 2)]);
        let new = mapping(GameValType::Items, &[("Sword", 9), ("Shield", 2)]);
        let changes = compare(&old, &new);
        GameValReport::new("230", "231", old, new, changes)
    }

    #[test]
    fn summary_counts_changes() {
        let report = report();
        assert_eq!(report.summary.total_changes, 1);
        assert_eq!(report.summary.types_compared, vec![GameValType::Items]);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut names = BTreeMap::new();
        names.insert("Sword".to_string(), IdChange { old_id: 5, new_id: 9 });
        let csv = String::from_utf8(GameValReport::csv_for(&names).unwrap()).unwrap();
        assert_eq!(csv, "Name,OldId,NewId\nSword,5,9\n");
    }

    #[test]
    fn json_shape() {
        let value = serde_json::to_value(report()).unwrap();
        assert_eq!(value["changes"]["items"]["Sword"]["oldId"], 5);
        assert_eq!(value["changes"]["items"]["Sword"]["newId"], 9);
        assert_eq!(value["oldMapping"]["types"]["items"]["Shield"], 2);
        assert_eq!(value["summary"]["oldVersion"], "230");
    }

    #[tokio::test]
    async fn writes_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let written = report().write_to(dir.path()).await.unwrap();

        assert_eq!(written.len(), 2);
        assert!(dir.path().join(REPORT_FILE).exists());
        let csv = std::fs::read_to_string(dir.path().join("items-changes.csv")).unwrap();
        assert!(csv.contains("Sword,5,9"));
    }

    #[tokio::test]
    async fn no_changes_writes_json_only() {
        let dir = tempfile::tempdir().unwrap();
        let old = mapping(GameValType::Npcs, &[("Goblin", 1)]);
        let report = GameValReport::new("230", "231", old.clone(), old, IdChanges::new());

        let written = report.write_to(dir.path()).await.unwrap();
        assert_eq!(written, vec![dir.path().join(REPORT_FILE)]);
    }
}
