use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A world map area definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaRecord {
    pub id: u32,
    pub name: Option<String>,
    pub sprite_id: i32,
    pub category: u16,
    pub options: Vec<Option<String>>,
}

/// An item definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRecord {
    pub id: u32,
    pub name: String,
    pub examine: Option<String>,
    pub members: bool,
    pub tradeable: bool,
    pub stackable: bool,
    pub cost: i32,
    pub weight: i32,
    pub inventory_actions: Vec<Option<String>>,
    pub ground_actions: Vec<Option<String>>,
    pub params: BTreeMap<u32, Value>,
}

/// An NPC definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcRecord {
    pub id: u32,
    pub name: String,
    pub combat_level: i32,
    pub size: u8,
    pub actions: Vec<Option<String>>,
    pub models: Vec<i32>,
    pub standing_animation: i32,
    pub walking_animation: i32,
    pub params: BTreeMap<u32, Value>,
}

/// A scenery object definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectRecord {
    pub id: u32,
    pub name: String,
    pub size_x: u8,
    pub size_y: u8,
    pub interact_type: i32,
    pub actions: Vec<Option<String>>,
    pub models: Vec<i32>,
    pub map_scene_id: i32,
    pub params: BTreeMap<u32, Value>,
}

/// A row of a database table. Column values are kept untyped; table-specific
/// views such as [`MusicRow`](crate::MusicRow) interpret them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbRowRecord {
    pub id: u32,
    pub table_id: u32,
    pub columns: BTreeMap<u32, Vec<Value>>,
}

impl DbRowRecord {
    /// First value of a column as a string.
    pub fn column_str(&self, column: u32) -> Option<&str> {
        self.columns.get(&column)?.first()?.as_str()
    }

    /// First value of a column as an integer.
    pub fn column_int(&self, column: u32) -> Option<i64> {
        self.columns.get(&column)?.first()?.as_i64()
    }

    /// First value of a column as a boolean. Integers are true when non-zero.
    pub fn column_bool(&self, column: u32) -> Option<bool> {
        match self.columns.get(&column)?.first()? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }
}

/// Any decoded record the engine knows about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityRecord {
    Area(AreaRecord),
    Item(ItemRecord),
    Npc(NpcRecord),
    Object(ObjectRecord),
    DbRow(DbRowRecord),
}

impl EntityRecord {
    /// Short type name used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Area(_) => AreaRecord::KIND,
            Self::Item(_) => ItemRecord::KIND,
            Self::Npc(_) => NpcRecord::KIND,
            Self::Object(_) => ObjectRecord::KIND,
            Self::DbRow(_) => DbRowRecord::KIND,
        }
    }

    /// The record as a JSON value, without the type tag, for structural
    /// comparison.
    pub fn to_value(&self) -> Value {
        let value = match self {
            Self::Area(r) => serde_json::to_value(r),
            Self::Item(r) => serde_json::to_value(r),
            Self::Npc(r) => serde_json::to_value(r),
            Self::Object(r) => serde_json::to_value(r),
            Self::DbRow(r) => serde_json::to_value(r),
        };
        // Records are plain data with string-convertible map keys.
        value.unwrap_or(Value::Null)
    }
}

/// A concrete record type that can be decoded on its own.
pub trait CacheRecord: DeserializeOwned + Send + Sync + 'static {
    /// Short type name used in logs and errors.
    const KIND: &'static str;

    /// Set the record id from the file id it was read from.
    fn set_id(&mut self, id: u32);

    /// Wrap into an [`EntityRecord`].
    fn into_entity(self) -> EntityRecord;
}

macro_rules! cache_record {
    ($ty:ident, $variant:ident, $kind:literal) => {
        impl CacheRecord for $ty {
            const KIND: &'static str = $kind;

            fn set_id(&mut self, id: u32) {
                self.id = id;
            }

            fn into_entity(self) -> EntityRecord {
                EntityRecord::$variant(self)
            }
        }
    };
}

cache_record!(AreaRecord, Area, "area");
cache_record!(ItemRecord, Item, "item");
cache_record!(NpcRecord, Npc, "npc");
cache_record!(ObjectRecord, Object, "object");
cache_record!(DbRowRecord, DbRow, "db_row");
