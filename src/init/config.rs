use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Settings for the stream service and the timeline workers.
///
/// Only `host` is required when deserializing, every other field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineConfig {
    /// Base URL of the stream service. It may carry a path prefix.
    pub host: Url,
    /// Endpoint paths, appended to the path of `host`.
    #[serde(default = "default_recent_path")]
    pub recent_path: String,
    #[serde(default = "default_ranged_path")]
    pub ranged_path: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Minimum delay between two frontend refreshes triggered by background updates.
    #[serde(default = "default_refresh_debounce_ms")]
    pub refresh_debounce_ms: u64,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    /// How long an item is flagged as "just arrived" after entering the timeline.
    #[serde(default = "default_fresh_item_window_ms")]
    pub fresh_item_window_ms: u64,
}

fn default_recent_path() -> String {
    "/api/v1/timelines/recent".to_owned()
}

fn default_ranged_path() -> String {
    "/api/v1/timelines/range".to_owned()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_refresh_debounce_ms() -> u64 {
    200
}

fn default_event_channel_capacity() -> usize {
    100
}

fn default_fresh_item_window_ms() -> u64 {
    5_000
}

impl TimelineConfig {
    pub fn new(host: Url) -> Self {
        Self {
            host,
            recent_path: default_recent_path(),
            ranged_path: default_ranged_path(),
            request_timeout_ms: default_request_timeout_ms(),
            refresh_debounce_ms: default_refresh_debounce_ms(),
            event_channel_capacity: default_event_channel_capacity(),
            fresh_item_window_ms: default_fresh_item_window_ms(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_host_is_required() {
        let config: TimelineConfig =
            serde_json::from_str(r#"{"host":"https://stream.example.com"}"#).unwrap();
        assert_eq!(
            config,
            TimelineConfig::new(Url::parse("https://stream.example.com").unwrap())
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(10));

        let config: TimelineConfig = serde_json::from_str(
            r#"{"host":"https://stream.example.com","requestTimeoutMs":500,"freshItemWindowMs":0}"#,
        )
        .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_millis(500));
        assert_eq!(config.fresh_item_window_ms, 0);

        assert!(serde_json::from_str::<TimelineConfig>("{}").is_err());
    }
}
