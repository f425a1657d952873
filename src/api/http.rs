use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    api::StreamApi,
    init::config::TimelineConfig,
    models::stream_item::{StreamItem, Timestamp},
};

/// A [`StreamApi`] backed by the stream service's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpStreamApi {
    client: reqwest::Client,
    host: Url,
    recent_path: String,
    ranged_path: String,
}

/// The envelope the service wraps every response in.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    content: Option<Vec<StreamItem>>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpStreamApi {
    pub fn new(config: &TimelineConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            host: config.host.clone(),
            recent_path: config.recent_path.clone(),
            ranged_path: config.ranged_path.clone(),
        })
    }

    /// Appends `path` to the path of the host, so that a service mounted
    /// under a prefix keeps it.
    fn endpoint_url(&self, path: &str) -> crate::Result<Url> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be used as a base URL", self.host))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn recent_url(&self, sources: &[String]) -> crate::Result<Url> {
        let mut url = self.endpoint_url(&self.recent_path)?;
        url.query_pairs_mut()
            .append_pair("timelines", &sources.join(","));
        Ok(url)
    }

    fn ranged_url(&self, sources: &[String], cursor: Timestamp) -> crate::Result<Url> {
        let mut url = self.endpoint_url(&self.ranged_path)?;
        url.query_pairs_mut()
            .append_pair("timelines", &sources.join(","))
            .append_pair("until", &cursor.to_string());
        Ok(url)
    }

    async fn get_items(&self, url: Url) -> anyhow::Result<Vec<StreamItem>> {
        debug!("GET {url}");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            bail!("stream service answered {status} for {url}: {body}");
        }
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> anyhow::Result<Vec<StreamItem>> {
    let response: ApiResponse = serde_json::from_str(body)?;
    if response.status != "ok" {
        return Err(anyhow!(
            "stream service returned status {:?}: {}",
            response.status,
            response.error.unwrap_or_default()
        ));
    }
    Ok(response.content.unwrap_or_default())
}

#[async_trait]
impl StreamApi for HttpStreamApi {
    async fn fetch_recent(&self, sources: &[String]) -> anyhow::Result<Vec<StreamItem>> {
        let url = self.recent_url(sources)?;
        self.get_items(url).await
    }

    async fn fetch_before(
        &self,
        sources: &[String],
        cursor: Timestamp,
    ) -> anyhow::Result<Vec<StreamItem>> {
        let url = self.ranged_url(sources, cursor)?;
        self.get_items(url).await
    }
}
