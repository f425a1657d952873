use serde::Serialize;

use crate::models::stream_item::{
    DatedStreamItem, SourceRefs, StreamItemId, StreamItemKind, Timestamp,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendTimelineItem<'a> {
    id: &'a StreamItemId,
    #[serde(flatten)]
    data: FrontendTimelineItemData<'a>,
    timestamp: Option<Timestamp>,
    last_updated: Timestamp,
    /// Whether the item entered the timeline recently enough to be highlighted.
    just_arrived: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    tag = "kind",
    content = "data"
)]
pub enum FrontendTimelineItemData<'a> {
    Message(&'a SourceRefs),
    Association(&'a SourceRefs),
    /// A type this client can't render. Shown as a placeholder naming the type.
    Unknown {
        type_name: &'a str,
        refs: &'a SourceRefs,
    },
}

pub fn to_frontend_timeline_item(
    dated: &DatedStreamItem,
    now: Timestamp,
    fresh_item_window_ms: u64,
) -> FrontendTimelineItem<'_> {
    let item = dated.item();
    let refs = &item.source_refs;
    let data = match &item.kind {
        StreamItemKind::Message => FrontendTimelineItemData::Message(refs),
        StreamItemKind::Association => FrontendTimelineItemData::Association(refs),
        StreamItemKind::Unrecognized(type_name) => FrontendTimelineItemData::Unknown {
            type_name,
            refs,
        },
    };
    let age = now.get().saturating_sub(dated.last_updated().get());
    FrontendTimelineItem {
        id: &item.id,
        data,
        timestamp: item.timestamp,
        last_updated: dated.last_updated(),
        just_arrived: age < fresh_item_window_ms,
    }
}
