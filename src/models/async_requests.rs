use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    models::{
        events::{ListenEvent, TimelineSetSources},
        stream_item::Timestamp,
    },
    timeline::sources::SourceSet,
};

/// The requests the frontend can make to the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineRequest {
    /// Watch a new set of streams. Resets the timeline if the set actually changed.
    SetSources { sources: Vec<String> },
    /// Load older items, if there are any left.
    RequestMore,
    /// Drop everything and load a fresh snapshot for the current streams.
    Reload,
}

impl<'de> Deserialize<'de> for TimelineRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // First deserialize into a generic Value to inspect the structure
        let value = Value::deserialize(deserializer)?;

        let event = value
            .get("event")
            .and_then(|v| v.as_str())
            .ok_or_else(|| serde::de::Error::missing_field("event"))?;

        let payload = value.get("payload").cloned().unwrap_or(Value::Null);

        match ListenEvent::from_name(event) {
            Some(ListenEvent::TimelineSetSources) => {
                let data: TimelineSetSources =
                    serde_json::from_value(payload).map_err(serde::de::Error::custom)?;
                Ok(TimelineRequest::SetSources {
                    sources: data.sources,
                })
            }
            Some(ListenEvent::TimelineRequestMore) => Ok(TimelineRequest::RequestMore),
            Some(ListenEvent::TimelineReload) => Ok(TimelineRequest::Reload),
            None => Err(serde::de::Error::unknown_variant(
                event,
                &["setSources", "requestMore", "reload"],
            )),
        }
    }
}

/// The fetches the timeline asks the fetch worker to run.
///
/// Each one carries the generation that was current when it was issued,
/// which is echoed back in the matching `TimelineUpdate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Fetch the most recent window of items for the given streams.
    Snapshot { generation: u64, sources: SourceSet },
    /// Fetch the items strictly older than `cursor` for the given streams.
    Backfill {
        generation: u64,
        sources: SourceSet,
        cursor: Timestamp,
    },
}

/// Submits a fetch to the worker task that owns the stream API.
pub(crate) fn submit_fetch_request(sender: &UnboundedSender<FetchRequest>, req: FetchRequest) {
    if sender.send(req).is_err() {
        tracing::error!("BUG: fetch worker task receiver has died!");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_frontend_requests() {
        let req: TimelineRequest = serde_json::from_str(
            r#"{"event":"setSources","payload":{"sources":["t1","t2"]}}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            TimelineRequest::SetSources {
                sources: vec!["t1".to_owned(), "t2".to_owned()]
            }
        );

        let req: TimelineRequest = serde_json::from_str(r#"{"event":"requestMore"}"#).unwrap();
        assert_eq!(req, TimelineRequest::RequestMore);

        let req: TimelineRequest =
            serde_json::from_str(r#"{"event":"reload","payload":{}}"#).unwrap();
        assert_eq!(req, TimelineRequest::Reload);
    }

    #[test]
    fn rejects_unknown_events() {
        let res = serde_json::from_str::<TimelineRequest>(r#"{"event":"compose"}"#);
        assert!(res.is_err());

        let res = serde_json::from_str::<TimelineRequest>(r#"{"payload":{}}"#);
        assert!(res.is_err());
    }
}
