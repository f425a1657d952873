//! The remote stream service consumed by timelines.

pub mod http;

use async_trait::async_trait;

use crate::models::stream_item::{StreamItem, Timestamp};

/// Read access to the stream service.
///
/// Implementations own their transport concerns (timeouts, retries, encoding);
/// the timeline treats any error uniformly as a failed fetch.
#[async_trait]
pub trait StreamApi: std::fmt::Debug + Send + Sync {
    /// Fetches the most recent items across the given streams.
    async fn fetch_recent(&self, sources: &[String]) -> anyhow::Result<Vec<StreamItem>>;

    /// Fetches the items of the given streams strictly older than `cursor`.
    async fn fetch_before(
        &self,
        sources: &[String],
        cursor: Timestamp,
    ) -> anyhow::Result<Vec<StreamItem>>;
}

#[cfg(test)]
pub(crate) mod testing;
