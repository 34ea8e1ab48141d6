//! Entity decoder boundary for cachewatch.
//!
//! The byte-level cache decoders live outside this workspace. The engine sees
//! them through [`EntityDecoder`], one per `(index, archive)` pair, collected
//! in a [`DecoderRegistry`] so adding an entity type never touches dispatch
//! code.
//!
//! # Key Types
//!
//! - [`EntityRecord`] -- Decoded record of any supported entity type
//! - [`EntityDecoder`] -- `bytes -> EntityRecord` for one archive
//! - [`DecoderRegistry`] -- Lookup of decoders by entry identity
//! - [`JsonRecordDecoder`] -- Decoder for caches exported as JSON records
//! - [`MusicRow`] / [`QuestRow`] -- Typed views over database rows

pub mod decoder;
pub mod error;
pub mod records;
pub mod rows;

pub use decoder::{DecoderRegistry, EntityDecoder, JsonRecordDecoder};
pub use error::{DecodeError, DecodeResult};
pub use records::{
    AreaRecord, CacheRecord, DbRowRecord, EntityRecord, ItemRecord, NpcRecord, ObjectRecord,
};
pub use rows::{MusicRow, QuestRow, MUSIC_TABLE, QUEST_TABLE};
