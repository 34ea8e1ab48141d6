use std::fmt;
use std::str::FromStr;

use cw_types::ArchiveId;
use serde::{Deserialize, Serialize};

use crate::error::GameValError;

/// A classification of named entities in the GameVals index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameValType {
    Items,
    Npcs,
    Inventories,
    VarPlayers,
    VarBits,
    Objects,
    Sequences,
    SpotAnims,
    DbTables,
    Interfaces,
}

impl GameValType {
    pub const ALL: [GameValType; 10] = [
        GameValType::Items,
        GameValType::Npcs,
        GameValType::Inventories,
        GameValType::VarPlayers,
        GameValType::VarBits,
        GameValType::Objects,
        GameValType::Sequences,
        GameValType::SpotAnims,
        GameValType::DbTables,
        GameValType::Interfaces,
    ];

    /// Archive of the GameVals index holding this type's names.
    pub fn archive(self) -> ArchiveId {
        match self {
            Self::Items => 0,
            Self::Npcs => 1,
            Self::Inventories => 2,
            Self::VarPlayers => 3,
            Self::VarBits => 4,
            Self::Objects => 6,
            Self::Sequences => 7,
            Self::SpotAnims => 8,
            Self::DbTables => 10,
            Self::Interfaces => 13,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Npcs => "npcs",
            Self::Inventories => "inventories",
            Self::VarPlayers => "var_players",
            Self::VarBits => "var_bits",
            Self::Objects => "objects",
            Self::Sequences => "sequences",
            Self::SpotAnims => "spot_anims",
            Self::DbTables => "db_tables",
            Self::Interfaces => "interfaces",
        }
    }
}

impl fmt::Display for GameValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameValType {
    type Err = GameValError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|ty| ty.name() == normalized)
            .ok_or_else(|| GameValError::UnknownType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names() {
        assert_eq!("npcs".parse::<GameValType>().unwrap(), GameValType::Npcs);
        assert_eq!("Spot-Anims".parse::<GameValType>().unwrap(), GameValType::SpotAnims);
        assert!("weapons".parse::<GameValType>().is_err());
    }

    #[test]
    fn archives_are_distinct() {
        let mut archives: Vec<_> = GameValType::ALL.iter().map(|t| t.archive()).collect();
        archives.dedup();
        assert_eq!(archives.len(), GameValType::ALL.len());
    }
}
