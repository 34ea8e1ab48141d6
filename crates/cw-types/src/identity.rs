use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Numeric id of an archive inside an index.
pub type ArchiveId = u32;

/// Numeric id of a file inside an archive.
pub type FileId = u32;

/// A top-level cache index.
///
/// Index ids are fixed by the cache format; the numeric value is what appears
/// on disk and in the reference table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Animations,
    Skeletons,
    Configs,
    Interfaces,
    SoundEffects,
    Maps,
    MusicTracks,
    Models,
    Sprites,
    Textures,
    Binary,
    MusicJingles,
    ClientScripts,
    Fonts,
    MusicSamples,
    MusicPatches,
    WorldMap,
    DbTableIndex,
    GameVals,
}

impl IndexType {
    /// Every known index, in id order.
    pub const ALL: [IndexType; 19] = [
        IndexType::Animations,
        IndexType::Skeletons,
        IndexType::Configs,
        IndexType::Interfaces,
        IndexType::SoundEffects,
        IndexType::Maps,
        IndexType::MusicTracks,
        IndexType::Models,
        IndexType::Sprites,
        IndexType::Textures,
        IndexType::Binary,
        IndexType::MusicJingles,
        IndexType::ClientScripts,
        IndexType::Fonts,
        IndexType::MusicSamples,
        IndexType::MusicPatches,
        IndexType::WorldMap,
        IndexType::DbTableIndex,
        IndexType::GameVals,
    ];

    /// The on-disk numeric id of this index.
    pub fn id(self) -> u8 {
        match self {
            Self::Animations => 0,
            Self::Skeletons => 1,
            Self::Configs => 2,
            Self::Interfaces => 3,
            Self::SoundEffects => 4,
            Self::Maps => 5,
            Self::MusicTracks => 6,
            Self::Models => 7,
            Self::Sprites => 8,
            Self::Textures => 9,
            Self::Binary => 10,
            Self::MusicJingles => 11,
            Self::ClientScripts => 12,
            Self::Fonts => 13,
            Self::MusicSamples => 14,
            Self::MusicPatches => 15,
            Self::WorldMap => 18,
            Self::DbTableIndex => 21,
            Self::GameVals => 24,
        }
    }

    /// Look up an index by its numeric id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|index| index.id() == id)
    }

    /// Lowercase name used in paths, CLI arguments and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Animations => "animations",
            Self::Skeletons => "skeletons",
            Self::Configs => "configs",
            Self::Interfaces => "interfaces",
            Self::SoundEffects => "sound_effects",
            Self::Maps => "maps",
            Self::MusicTracks => "music_tracks",
            Self::Models => "models",
            Self::Sprites => "sprites",
            Self::Textures => "textures",
            Self::Binary => "binary",
            Self::MusicJingles => "music_jingles",
            Self::ClientScripts => "client_scripts",
            Self::Fonts => "fonts",
            Self::MusicSamples => "music_samples",
            Self::MusicPatches => "music_patches",
            Self::WorldMap => "world_map",
            Self::DbTableIndex => "db_table_index",
            Self::GameVals => "game_vals",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexType {
    type Err = TypeError;

    /// Accepts either the lowercase name (`configs`, `sound-effects`) or the
    /// numeric id (`2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<u8>() {
            return Self::from_id(id).ok_or_else(|| TypeError::UnknownIndex(s.to_string()));
        }
        let normalized = trimmed.to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|index| index.name() == normalized)
            .ok_or_else(|| TypeError::UnknownIndex(s.to_string()))
    }
}

/// Archive ids inside [`IndexType::Configs`].
pub mod config_archive {
    use super::ArchiveId;

    pub const UNDERLAY: ArchiveId = 1;
    pub const IDENTIKIT: ArchiveId = 3;
    pub const OVERLAY: ArchiveId = 4;
    pub const INVENTORY: ArchiveId = 5;
    pub const OBJECT: ArchiveId = 6;
    pub const ENUM: ArchiveId = 8;
    pub const NPC: ArchiveId = 9;
    pub const ITEM: ArchiveId = 10;
    pub const PARAMS: ArchiveId = 11;
    pub const SEQUENCE: ArchiveId = 12;
    pub const SPOT_ANIM: ArchiveId = 13;
    pub const VARBIT: ArchiveId = 14;
    pub const AREA: ArchiveId = 35;
    pub const DB_ROW: ArchiveId = 38;
    pub const DB_TABLE: ArchiveId = 39;
}

/// The three-level address of one record inside a cache.
///
/// Identity is stable across cache versions and is the diff key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryIdentity {
    pub index: IndexType,
    pub archive: ArchiveId,
    pub file: FileId,
}

impl EntryIdentity {
    pub fn new(index: IndexType, archive: ArchiveId, file: FileId) -> Self {
        Self {
            index,
            archive,
            file,
        }
    }
}

impl fmt::Display for EntryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.index, self.archive, self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_lookup() {
        for index in IndexType::ALL {
            assert_eq!(IndexType::from_id(index.id()), Some(index));
        }
    }

    #[test]
    fn unknown_id_is_none() {
        assert_eq!(IndexType::from_id(16), None);
        assert_eq!(IndexType::from_id(200), None);
    }

    #[test]
    fn parse_by_name_and_id() {
        assert_eq!("configs".parse::<IndexType>().unwrap(), IndexType::Configs);
        assert_eq!("2".parse::<IndexType>().unwrap(), IndexType::Configs);
        assert_eq!(
            "Sound-Effects".parse::<IndexType>().unwrap(),
            IndexType::SoundEffects
        );
        assert_eq!("24".parse::<IndexType>().unwrap(), IndexType::GameVals);
    }

    #[test]
    fn parse_unknown_fails() {
        let err = "nonsense".parse::<IndexType>().unwrap_err();
        assert_eq!(err, TypeError::UnknownIndex("nonsense".into()));
        assert!("17".parse::<IndexType>().is_err());
    }

    #[test]
    fn identity_display() {
        let id = EntryIdentity::new(IndexType::Configs, config_archive::NPC, 1234);
        assert_eq!(id.to_string(), "configs/9/1234");
    }

    #[test]
    fn identity_serde() {
        let id = EntryIdentity::new(IndexType::Configs, 9, 1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#"{"index":"configs","archive":9,"file":1}"#);
        let back: EntryIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
