//! NPC pages.

use std::sync::Arc;

use cw_decode::{DecodeError, DecodeResult, EntityRecord, NpcRecord};
use cw_dispatch::{ListenerRegistry, ListenerScope};
use cw_types::{config_archive, IndexType};

use crate::listener::{PageContext, PageListener, PageSubject};

impl PageSubject for NpcRecord {
    const SECTION: &'static str = "npcs";

    fn from_record(record: EntityRecord) -> DecodeResult<Option<Self>> {
        match record {
            EntityRecord::Npc(npc) => Ok(Some(npc)),
            other => Err(DecodeError::UnexpectedRecord {
                expected: "npc",
                actual: other.kind(),
            }),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn title(&self) -> String {
        let name = self.slug_name();
        if self.combat_level > 0 {
            format!("{name} (level {})", self.combat_level)
        } else {
            name
        }
    }

    fn slug_name(&self) -> String {
        if self.name.is_empty() || self.name == "null" {
            format!("NPC {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

pub fn register(registry: &mut ListenerRegistry, ctx: Arc<PageContext>) {
    registry.register(
        "npc-pages",
        ListenerScope::archive(IndexType::Configs, config_archive::NPC),
        Arc::new(PageListener::<NpcRecord>::new(ctx)),
    );
}
