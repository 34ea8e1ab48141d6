//! Item pages.

use std::sync::Arc;

use cw_decode::{DecodeError, DecodeResult, EntityRecord, ItemRecord};
use cw_dispatch::{ListenerRegistry, ListenerScope};
use cw_types::{config_archive, IndexType};

use crate::listener::{PageContext, PageListener, PageSubject};

impl PageSubject for ItemRecord {
    const SECTION: &'static str = "items";

    fn from_record(record: EntityRecord) -> DecodeResult<Option<Self>> {
        match record {
            EntityRecord::Item(item) => Ok(Some(item)),
            other => Err(DecodeError::UnexpectedRecord {
                expected: "item",
                actual: other.kind(),
            }),
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn title(&self) -> String {
        if self.name.is_empty() || self.name == "null" {
            format!("Item {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

pub fn register(registry: &mut ListenerRegistry, ctx: Arc<PageContext>) {
    registry.register(
        "item-pages",
        ListenerScope::archive(IndexType::Configs, config_archive::ITEM),
        Arc::new(PageListener::<ItemRecord>::new(ctx)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::testing::{context, file};
    use cw_dispatch::ChangeHandler;
    use cw_types::ChangeEvent;

    #[tokio::test]
    async fn examine_extension_shows_appended_text() {
        let (ctx, pages) = context();
        let listener = PageListener::<ItemRecord>::new(ctx);
        let event = ChangeEvent::modified(
            file(config_archive::ITEM, 4151, "230", r#"{"name":"Abyssal whip","examine":"A weapon."}"#),
            file(
                config_archive::ITEM,
                4151,
                "231",
                r#"{"name":"Abyssal whip","examine":"A weapon. From the abyss."}"#,
            ),
        );

        listener.handle(&event).await.unwrap();

        let pages = pages.pages.lock().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].section, "items");
        assert_eq!(pages[0].slug, "4151-abyssal-whip");
        assert!(pages[0].body.starts_with("Changed in cache 231."));
        assert!(pages[0].body.contains("examine: appended \" From the abyss.\""));
    }

    #[tokio::test]
    async fn unchanged_decoded_record_writes_nothing() {
        let (ctx, pages) = context();
        let listener = PageListener::<ItemRecord>::new(ctx);
        // Byte-level difference only: key order and the ignored payload id.
        let event = ChangeEvent::modified(
            file(config_archive::ITEM, 1, "230", r#"{"name":"Bronze dagger","cost":10}"#),
            file(config_archive::ITEM, 1, "231", r#"{"id":1,"cost":10,"name":"Bronze dagger"}"#),
        );

        listener.handle(&event).await.unwrap();
        assert!(pages.pages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn decode_failure_is_reported() {
        let (ctx, pages) = context();
        let listener = PageListener::<ItemRecord>::new(ctx);
        let event = ChangeEvent::added(file(config_archive::ITEM, 1, "231", "not json"));

        let err = listener.handle(&event).await.unwrap_err();
        assert!(matches!(err, cw_dispatch::HandlerError::Decode(_)));
        assert!(pages.pages.lock().unwrap().is_empty());
    }
}
