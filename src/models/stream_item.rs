use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// Milliseconds since the unix epoch.
///
/// Used both as the server-side ordering key of a [`StreamItem`] (the pagination cursor)
/// and as the client-side freshness stamp of a [`DatedStreamItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(millis)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Opaque identifier of a stream item, stable across fetches of the same item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamItemId(String);

impl StreamItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for StreamItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The kind of content distributed through a stream.
///
/// Types this client doesn't know about are kept with their raw name,
/// so that the frontend can still show a placeholder for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StreamItemKind {
    Message,
    Association,
    Unrecognized(String),
}

impl StreamItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            StreamItemKind::Message => "message",
            StreamItemKind::Association => "association",
            StreamItemKind::Unrecognized(name) => name,
        }
    }
}

impl From<String> for StreamItemKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "message" => StreamItemKind::Message,
            "association" => StreamItemKind::Association,
            _ => StreamItemKind::Unrecognized(value),
        }
    }
}

impl From<StreamItemKind> for String {
    fn from(kind: StreamItemKind) -> Self {
        match kind {
            StreamItemKind::Unrecognized(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

/// Identifiers of the content behind a stream item.
/// These are resolved lazily by resource lookups, never embedded in the item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRefs {
    /// The referenced message or association.
    #[serde(rename = "resourceID", default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// The stream this item was distributed through.
    #[serde(rename = "timelineID", default, skip_serializing_if = "Option::is_none")]
    pub timeline_id: Option<String>,
}

/// The unit distributed through a timeline, as returned by the stream service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamItem {
    pub id: StreamItemId,
    #[serde(rename = "type")]
    pub kind: StreamItemKind,
    /// The pagination cursor. Items without it can't anchor a backfill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(flatten)]
    pub source_refs: SourceRefs,
}

impl StreamItem {
    pub fn new(
        id: impl Into<StreamItemId>,
        kind: StreamItemKind,
        timestamp: Option<Timestamp>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            timestamp,
            source_refs: SourceRefs::default(),
        }
    }

    /// Stamps this item with the moment it entered the local store.
    pub fn dated(self, last_updated: Timestamp) -> DatedStreamItem {
        DatedStreamItem {
            item: self,
            last_updated,
        }
    }
}

/// A [`StreamItem`] along with the local time at which it entered the timeline.
///
/// `last_updated` is set once at insertion and is only meant for the frontend
/// to decide whether an item "just arrived". It plays no role in ordering or dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedStreamItem {
    #[serde(flatten)]
    item: StreamItem,
    last_updated: Timestamp,
}

impl DatedStreamItem {
    pub fn item(&self) -> &StreamItem {
        &self.item
    }

    pub fn id(&self) -> &StreamItemId {
        &self.item.id
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.item.timestamp
    }

    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }
}
