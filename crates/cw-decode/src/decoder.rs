use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use cw_types::{config_archive, ArchiveId, CacheRevision, FileContext, FileId, IndexType};
use tracing::debug;

use crate::error::{DecodeError, DecodeResult};
use crate::records::{
    AreaRecord, CacheRecord, DbRowRecord, EntityRecord, ItemRecord, NpcRecord, ObjectRecord,
};

/// Decodes the raw payload of one archive's files into typed records.
///
/// Decoders are pure: the same payload always yields the same record. They
/// are shared across concurrent listeners, hence `Send + Sync`.
pub trait EntityDecoder: Send + Sync {
    /// Human-readable decoder name for logs.
    fn name(&self) -> &str;

    /// Decode one file.
    fn decode(&self, payload: &[u8], file: FileId, revision: &CacheRevision) -> DecodeResult<EntityRecord>;
}

/// Decoder for caches whose records were exported as JSON objects.
///
/// The record id is always taken from the file id, whatever the payload says.
pub struct JsonRecordDecoder<T> {
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonRecordDecoder<T> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<T> Default for JsonRecordDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CacheRecord> EntityDecoder for JsonRecordDecoder<T> {
    fn name(&self) -> &str {
        T::KIND
    }

    fn decode(&self, payload: &[u8], file: FileId, _revision: &CacheRevision) -> DecodeResult<EntityRecord> {
        let mut record: T = serde_json::from_slice(payload).map_err(|e| DecodeError::Malformed {
            file,
            reason: e.to_string(),
        })?;
        record.set_id(file);
        Ok(record.into_entity())
    }
}

/// Decoders keyed by `(index, archive)`.
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<(IndexType, ArchiveId), Arc<dyn EntityDecoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with [`JsonRecordDecoder`]s for every entity archive the
    /// page listeners consume.
    pub fn with_json_decoders() -> Self {
        let mut registry = Self::new();
        registry.register(
            IndexType::Configs,
            config_archive::AREA,
            Arc::new(JsonRecordDecoder::<AreaRecord>::new()),
        );
        registry.register(
            IndexType::Configs,
            config_archive::ITEM,
            Arc::new(JsonRecordDecoder::<ItemRecord>::new()),
        );
        registry.register(
            IndexType::Configs,
            config_archive::NPC,
            Arc::new(JsonRecordDecoder::<NpcRecord>::new()),
        );
        registry.register(
            IndexType::Configs,
            config_archive::OBJECT,
            Arc::new(JsonRecordDecoder::<ObjectRecord>::new()),
        );
        registry.register(
            IndexType::Configs,
            config_archive::DB_ROW,
            Arc::new(JsonRecordDecoder::<DbRowRecord>::new()),
        );
        registry
    }

    /// Register (or replace) the decoder for an archive.
    pub fn register(&mut self, index: IndexType, archive: ArchiveId, decoder: Arc<dyn EntityDecoder>) {
        debug!(%index, archive, decoder = decoder.name(), "registered decoder");
        self.decoders.insert((index, archive), decoder);
    }

    /// The decoder for an archive, if any.
    pub fn get(&self, index: IndexType, archive: ArchiveId) -> Option<&Arc<dyn EntityDecoder>> {
        self.decoders.get(&(index, archive))
    }

    /// Number of registered decoders.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decode one side of a change with the decoder for its archive.
    pub fn decode(&self, ctx: &FileContext) -> DecodeResult<EntityRecord> {
        let id = ctx.identity;
        let decoder = self.get(id.index, id.archive).ok_or(DecodeError::NoDecoder {
            index: id.index,
            archive: id.archive,
        })?;
        decoder.decode(&ctx.payload, id.file, &ctx.revision)
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("decoder_count", &self.decoders.len())
            .finish()
    }
}
