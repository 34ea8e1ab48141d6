//! Music track pages, read from rows of the music database table.

use std::sync::Arc;

use cw_decode::{DecodeError, DecodeResult, EntityRecord, MusicRow};
use cw_dispatch::{ListenerRegistry, ListenerScope};
use cw_types::{config_archive, IndexType};

use crate::listener::{PageContext, PageListener, PageSubject};

impl PageSubject for MusicRow {
    const SECTION: &'static str = "music";

    fn from_record(record: EntityRecord) -> DecodeResult<Option<Self>> {
        match MusicRow::from_entity(&record) {
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
        "music-pages",
        ListenerScope::archive(IndexType::Configs, config_archive::DB_ROW),
        Arc::new(PageListener::<MusicRow>::new(ctx)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::testing::{context, file};
    use cw_dispatch::ChangeHandler;
    use cw_types::ChangeEvent;

    #[tokio::test]
    async fn unlock_hint_change_is_listed() {
        let (ctx, pages) = context();
        let listener = PageListener::<MusicRow>::new(ctx);
        let event = ChangeEvent::modified(
            file(
                config_archive::DB_ROW,
                90,
                "230",
                r#"{"table_id":44,"columns":{"1":["Harmony"],"2":["Lumbridge."]}}"#,
            ),
            file(
                config_archive::DB_ROW,
                90,
                "231",
                r#"{"table_id":44,"columns":{"1":["Harmony"],"2":["Lumbridge Castle."]}}"#,
            ),
        );

        listener.handle(&event).await.unwrap();

        let pages = pages.pages.lock().unwrap();
        assert_eq!(pages[0].section, "music");
        assert_eq!(pages[0].slug, "90-harmony");
        assert!(pages[0].body.contains("unlock_hint: Lumbridge. -> Lumbridge Castle."));
    }

    #[tokio::test]
    async fn rows_of_other_tables_are_ignored() {
        let (ctx, pages) = context();
        let listener = PageListener::<MusicRow>::new(ctx);
        let event = ChangeEvent::added(file(
            config_archive::DB_ROW,
            5,
            "231",
            r#"{"table_id":0,"columns":{"2":["Cook's Assistant"]}}"#,
        ));

        listener.handle(&event).await.unwrap();
        assert!(pages.pages.lock().unwrap().is_empty());
    }
}
