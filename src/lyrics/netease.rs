//! NetEase Cloud Music provider
//!
//! Search-then-fetch against the public music.163.com endpoints. Strong
//! coverage for Chinese, Japanese and Korean releases.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER};
use serde::Deserialize;
use std::time::Duration;

use super::provider::{LyricsProvider, ProviderSettings, absorb};

#[derive(Debug, Deserialize, Default)]
struct SearchResponse {
    #[serde(default)]
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize, Default)]
struct SearchResult {
    #[serde(default)]
    songs: Vec<Song>,
}

#[derive(Debug, Deserialize, Clone)]
struct Song {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
}

#[derive(Debug, Deserialize, Clone)]
struct Artist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct LyricResponse {
    lrc: Option<LyricBody>,
    klyric: Option<LyricBody>,
    tlyric: Option<LyricBody>,
}

#[derive(Debug, Deserialize, Default)]
struct LyricBody {
    lyric: Option<String>,
}

impl LyricBody {
    fn text(&self) -> Option<String> {
        self.lyric.clone().filter(|s| !s.trim().is_empty())
    }
}

impl LyricResponse {
    /// Line-synced lyrics first, karaoke lyrics as fallback
    fn lyrics(&self) -> Option<String> {
        self.lrc
            .as_ref()
            .and_then(LyricBody::text)
            .or_else(|| self.klyric.as_ref().and_then(LyricBody::text))
    }

    fn translation(&self) -> Option<String> {
        self.tlyric.as_ref().and_then(LyricBody::text)
    }
}

/// NetEase lyrics provider
#[derive(Debug, Clone)]
pub struct NeteaseProvider {
    client: reqwest::Client,
}

impl NeteaseProvider {
    pub const NAME: &'static str = "netease";
    const SEARCH_URL: &'static str = "https://music.163.com/api/search/get";
    const LYRICS_URL: &'static str = "https://music.163.com/api/song/lyric";
    const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(settings: &ProviderSettings) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://music.163.com"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            client: settings.http_client(Self::USER_AGENT, Self::TIMEOUT, headers)?,
        })
    }

    /// Translated lyrics for the best matching song, when NetEase has them.
    pub async fn get_translation(&self, track: &str, artist: &str) -> Option<String> {
        absorb(Self::NAME, self.translation(track, artist).await)
    }

    async fn translation(&self, track: &str, artist: &str) -> anyhow::Result<Option<String>> {
        let Some(id) = self.search_song(track, artist).await? else {
            return Ok(None);
        };
        let lyrics = self.lyrics_by_id(id, "1").await?;
        Ok(lyrics.translation())
    }

    async fn lookup(&self, track: &str, artist: &str) -> anyhow::Result<Option<String>> {
        let Some(id) = self.search_song(track, artist).await? else {
            return Ok(None);
        };
        let lyrics = self.lyrics_by_id(id, "-1").await?;
        Ok(lyrics.lyrics())
    }

    async fn search_song(&self, track: &str, artist: &str) -> anyhow::Result<Option<i64>> {
        let query = format!("{} {}", track, artist);
        // type=1 restricts results to songs
        let body = format!(
            "s={}&type=1&limit=10&offset=0",
            urlencoding::encode(&query)
        );

        let response = self
            .client
            .post(Self::SEARCH_URL)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .context("send netease search request")?
            .error_for_status()
            .context("netease search http status")?;

        let data: SearchResponse = response.json().await.context("parse netease search json")?;
        let songs = data.result.unwrap_or_default().songs;
        Ok(pick_song(&songs, track, artist))
    }

    async fn lyrics_by_id(&self, id: i64, translation: &str) -> anyhow::Result<LyricResponse> {
        let url = format!(
            "{}?id={}&lv=1&kv=1&tv={}",
            Self::LYRICS_URL,
            id,
            translation
        );
        self.client
            .get(&url)
            .send()
            .await
            .context("send netease lyric request")?
            .error_for_status()
            .context("netease lyric http status")?
            .json()
            .await
            .context("parse netease lyric json")
    }
}

#[async_trait]
impl LyricsProvider for NeteaseProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, track: &str, artist: &str) -> Option<String> {
        absorb(Self::NAME, self.lookup(track, artist).await)
    }
}

/// First song whose title and one of whose artists loosely match, otherwise
/// the top search hit.
fn pick_song(songs: &[Song], track: &str, artist: &str) -> Option<i64> {
    let track = track.to_lowercase();
    let artist = artist.to_lowercase();
    let overlaps = |a: &str, b: &str| a.contains(b) || b.contains(a);

    songs
        .iter()
        .find(|song| {
            let name = song.name.to_lowercase();
            overlaps(&name, &track)
                && song
                    .artists
                    .iter()
                    .any(|a| overlaps(&a.name.to_lowercase(), &artist))
        })
        .or_else(|| songs.first())
        .map(|song| song.id)
}
