//! LRCLIB provider
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::time::Duration;

use super::provider::{LyricsProvider, ProviderSettings, absorb};

/// LRCLIB API response
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LrclibResponse {
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

impl LrclibResponse {
    fn synced(&self) -> Option<&str> {
        self.synced_lyrics.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn plain(&self) -> Option<&str> {
        self.plain_lyrics.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Synced lyrics if present, plain otherwise
    fn into_text(self) -> Option<String> {
        self.synced().or_else(|| self.plain()).map(str::to_string)
    }
}

/// LRCLIB lyrics provider
#[derive(Debug, Clone)]
pub struct LrclibProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibProvider {
    pub const NAME: &'static str = "lrclib";
    const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = "lyricsync/0.1.0";
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(settings: &ProviderSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: settings.http_client(Self::USER_AGENT, Self::TIMEOUT, HeaderMap::new())?,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the provider at another LRCLIB instance.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Exact lookup qualified by the track duration, without the search
    /// fallback.
    pub async fn get_by_duration(
        &self,
        track_name: &str,
        artist_name: &str,
        duration_secs: u32,
    ) -> Option<String> {
        let result = self
            .get_exact(track_name, artist_name, Some(duration_secs))
            .await
            .map(|r| r.and_then(LrclibResponse::into_text));
        absorb(Self::NAME, result)
    }

    /// Get lyrics by track info
    async fn lookup(&self, track_name: &str, artist_name: &str) -> anyhow::Result<Option<String>> {
        // First try the "get" endpoint with exact match; any failure is a miss
        let exact = match self.get_exact(track_name, artist_name, None).await {
            Ok(response) => response.and_then(LrclibResponse::into_text),
            Err(err) => {
                tracing::debug!(
                    provider = Self::NAME,
                    error = %format!("{err:#}"),
                    "exact lookup failed"
                );
                None
            }
        };
        if exact.is_some() {
            return Ok(exact);
        }

        // Fall back to search
        self.search(track_name, artist_name).await
    }

    /// Get lyrics with exact match
    async fn get_exact(
        &self,
        track_name: &str,
        artist_name: &str,
        duration_secs: Option<u32>,
    ) -> anyhow::Result<Option<LrclibResponse>> {
        let mut url = format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name)
        );

        if let Some(duration) = duration_secs {
            url.push_str(&format!("&duration={}", duration));
        }

        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            let lyrics: LrclibResponse = response.json().await?;
            Ok(Some(lyrics))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }

    /// Search for lyrics
    async fn search(&self, track_name: &str, artist_name: &str) -> anyhow::Result<Option<String>> {
        let query = format!("{} {}", artist_name, track_name);
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(&query));

        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            let results: Vec<LrclibResponse> = response.json().await?;
            Ok(pick_search_result(&results))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB search error: {}", response.status());
        }
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, track: &str, artist: &str) -> Option<String> {
        absorb(Self::NAME, self.lookup(track, artist).await)
    }
}

/// The first result that has synced lyrics, or the first result's plain
/// lyrics.
fn pick_search_result(results: &[LrclibResponse]) -> Option<String> {
    results
        .iter()
        .find_map(LrclibResponse::synced)
        .or_else(|| results.first().and_then(LrclibResponse::plain))
        .map(str::to_string)
}
