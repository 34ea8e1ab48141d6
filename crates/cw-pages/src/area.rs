//! World map area pages.

use std::sync::Arc;

use cw_decode::{AreaRecord, DecodeError, DecodeResult, EntityRecord};
use cw_dispatch::{ListenerRegistry, ListenerScope};
use cw_types::{config_archive, IndexType};

use crate::listener::{PageContext, PageListener, PageSubject};

impl PageSubject for AreaRecord {
    const SECTION: &'static str = "areas";

    fn from_record(record: EntityRecord) -> DecodeResult<Option<Self>> {
        match record {
            EntityRecord::Area(area) => Ok(Some(area)),
            other => Err(DecodeError::UnexpectedRecord {
                expected: "area",
                actual: other.kind(),
            }),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn title(&self) -> String {
        // Many areas are unnamed map markers.
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("Area {}", self.id),
        }
    }
}

pub fn register(registry: &mut ListenerRegistry, ctx: Arc<PageContext>) {
    registry.register(
        "area-pages",
        ListenerScope::archive(IndexType::Configs, config_archive::AREA),
        Arc::new(PageListener::<AreaRecord>::new(ctx)),
    );
}
