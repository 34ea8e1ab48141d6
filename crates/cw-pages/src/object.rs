//! Scenery object pages.

use std::sync::Arc;

use cw_decode::{DecodeError, DecodeResult, EntityRecord, ObjectRecord};
use cw_dispatch::{ListenerRegistry, ListenerScope};
use cw_types::{config_archive, IndexType};

use crate::listener::{PageContext, PageListener, PageSubject};

impl PageSubject for ObjectRecord {
    const SECTION: &'static str = "objects";

    fn from_record(record: EntityRecord) -> DecodeResult<Option<Self>> {
        match record {
            EntityRecord::Object(object) => Ok(Some(object)),
            other => Err(DecodeError::UnexpectedRecord {
                expected: "object",
                actual: other.kind(),
            }),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn title(&self) -> String {
        if self.name.is_empty() || self.name == "null" {
            format!("Object {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

pub fn register(registry: &mut ListenerRegistry, ctx: Arc<PageContext>) {
    registry.register(
        "object-pages",
        ListenerScope::archive(IndexType::Configs, config_archive::OBJECT),
        Arc::new(PageListener::<ObjectRecord>::new(ctx)),
    );
}
