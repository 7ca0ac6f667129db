use crate::config::Config;
use crate::core::PipguardResult;
use crate::services::http::{build_client, get_json};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Recent download counts for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DownloadStats {
    pub last_day: u64,
    pub last_week: u64,
    pub last_month: u64,
}

#[async_trait]
pub trait DownloadStatsApi: Send + Sync {
    /// Download statistics for a project, or `None` if unavailable
    async fn get_download_stats(&self, name: &str) -> Option<DownloadStats>;
}

#[derive(Deserialize)]
struct RecentDownloadsResponse {
    data: DownloadStats,
}

/// Client for the pypistats.org API
pub struct PypiStatsClient {
    client: Client,
    base_url: String,
}

impl PypiStatsClient {
    /// Create a new pypistats client from the configured base URL and timeouts
    pub fn new(config: &Config) -> PipguardResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.pypistats_url.trim_end_matches('/').to_string(),
        })
    }

    fn recent_url(&self, name: &str) -> String {
        // pypistats keys projects by their lowercase name
        format!(
            "{}/packages/{}/recent",
            self.base_url,
            urlencoding::encode(&name.to_lowercase())
        )
    }
}

#[async_trait]
impl DownloadStatsApi for PypiStatsClient {
    async fn get_download_stats(&self, name: &str) -> Option<DownloadStats> {
        let response: RecentDownloadsResponse =
            get_json(&self.client, &self.recent_url(name), &[]).await?;
        Some(response.data)
    }
}
