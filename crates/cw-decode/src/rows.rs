//! Typed views over database rows.

use serde::Serialize;

use crate::error::{DecodeError, DecodeResult};
use crate::records::{DbRowRecord, EntityRecord};

/// Table id of the music track table.
pub const MUSIC_TABLE: u32 = 44;

/// Table id of the quest table.
pub const QUEST_TABLE: u32 = 0;

mod music_column {
    pub const SORT_NAME: u32 = 0;
    pub const DISPLAY_NAME: u32 = 1;
    pub const UNLOCK_HINT: u32 = 2;
    pub const DURATION: u32 = 3;
    pub const MIDI: u32 = 4;
    pub const MEMBERS: u32 = 5;
}

mod quest_column {
    pub const SORT_NAME: u32 = 1;
    pub const DISPLAY_NAME: u32 = 2;
    pub const MEMBERS: u32 = 3;
    pub const DIFFICULTY: u32 = 4;
    pub const QUEST_POINTS: u32 = 5;
}

fn require_table(row: &DbRowRecord, expected: u32) -> DecodeResult<()> {
    if row.table_id != expected {
        return Err(DecodeError::WrongTable {
            row: row.id,
            expected,
            actual: row.table_id,
        });
    }
    Ok(())
}

fn as_row(record: &EntityRecord) -> DecodeResult<&DbRowRecord> {
    match record {
        EntityRecord::DbRow(row) => Ok(row),
        other => Err(DecodeError::UnexpectedRecord {
            expected: "db_row",
            actual: other.kind(),
        }),
    }
}

/// A row of the music table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MusicRow {
    pub id: u32,
    pub sort_name: Option<String>,
    pub display_name: String,
    pub unlock_hint: Option<String>,
    pub duration_secs: Option<i64>,
    pub midi_id: Option<i64>,
    pub members: bool,
}

impl MusicRow {
    pub fn from_row(row: &DbRowRecord) -> DecodeResult<Self> {
        require_table(row, MUSIC_TABLE)?;
        let display_name = row
            .column_str(music_column::DISPLAY_NAME)
            .ok_or(DecodeError::MissingColumn {
                row: row.id,
                column: music_column::DISPLAY_NAME,
            })?
            .to_string();
        Ok(Self {
            id: row.id,
            sort_name: row.column_str(music_column::SORT_NAME).map(str::to_string),
            display_name,
            unlock_hint: row.column_str(music_column::UNLOCK_HINT).map(str::to_string),
            duration_secs: row.column_int(music_column::DURATION),
            midi_id: row.column_int(music_column::MIDI),
            members: row.column_bool(music_column::MEMBERS).unwrap_or(false),
        })
    }

    pub fn from_entity(record: &EntityRecord) -> DecodeResult<Self> {
        Self::from_row(as_row(record)?)
    }
}

/// A row of the quest table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestRow {
    pub id: u32,
    pub sort_name: Option<String>,
    pub display_name: String,
    pub members: bool,
    pub difficulty: Option<i64>,
    pub quest_points: Option<i64>,
}

impl QuestRow {
    pub fn from_row(row: &DbRowRecord) -> DecodeResult<Self> {
        require_table(row, QUEST_TABLE)?;
        let display_name = row
            .column_str(quest_column::DISPLAY_NAME)
            .ok_or(DecodeError::MissingColumn {
                row: row.id,
                column: quest_column::DISPLAY_NAME,
            })?
            .to_string();
        Ok(Self {
            id: row.id,
            sort_name: row.column_str(quest_column::SORT_NAME).map(str::to_string),
            display_name,
            members: row.column_bool(quest_column::MEMBERS).unwrap_or(false),
            difficulty: row.column_int(quest_column::DIFFICULTY),
            quest_points: row.column_int(quest_column::QUEST_POINTS),
        })
    }

    pub fn from_entity(record: &EntityRecord) -> DecodeResult<Self> {
        Self::from_row(as_row(record)?)
    }
}
