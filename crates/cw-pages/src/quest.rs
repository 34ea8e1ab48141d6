//! Quest pages, read from rows of the quest database table.

use std::sync::Arc;

use cw_decode::{DecodeError, DecodeResult, EntityRecord, QuestRow};
use cw_dispatch::{ListenerRegistry, ListenerScope};
use cw_types::{config_archive, IndexType};

use crate::listener::{PageContext, PageListener, PageSubject};

impl PageSubject for QuestRow {
    const SECTION: &'static str = "quests";

    fn from_record(record: EntityRecord) -> DecodeResult<Option<Self>> {
        match QuestRow::from_entity(&record) {
            Ok(row) => Ok(Some(row)),
            Err(DecodeError::WrongTable { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn title(&self) -> String {
        self.display_name.clone()
    }
}

pub fn register(registry: &mut ListenerRegistry, ctx: Arc<PageContext>) {
    registry.register(
        "quest-pages",
        ListenerScope::archive(IndexType::Configs, config_archive::DB_ROW),
        Arc::new(PageListener::<QuestRow>::new(ctx)),
    );
}
