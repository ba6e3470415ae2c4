//! Megalobiz provider
//!
//! HTML scraping fallback: search the site for an LRC page, then pull the
//! timestamped text out of it.

use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;

use super::provider::{LyricsProvider, ProviderSettings, absorb};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static LRC_MAKER_LINK: Lazy<Regex> = Lazy::new(|| re(r#"href="(/lrc/maker/[^"]+\.megalobiz)""#));
static LRC_ANY_LINK: Lazy<Regex> = Lazy::new(|| re(r#"href="(/lrc/[^"]+)""#));

static LYRICS_CONTAINERS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        re(r#"(?i)<div[^>]*id="lrc_\d+_lyrics"[^>]*>([\s\S]*?)</div>"#),
        re(r#"(?i)<pre[^>]*class="[^"]*lyrics[^"]*"[^>]*>([\s\S]*?)</pre>"#),
        re(r#"(?i)<div[^>]*class="[^"]*lrc-content[^"]*"[^>]*>([\s\S]*?)</div>"#),
    ]
});
static TIMESTAMPED_RUN: Lazy<Regex> = Lazy::new(|| re(r"(\[\d{2}:\d{2}[.:]\d{2,3}\][^\[]+)"));

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| re(r"(?i)<br\s*/?>"));
static TAG: Lazy<Regex> = Lazy::new(|| re(r"<[^>]+>"));

static BRACKETED: Lazy<Regex> = Lazy::new(|| re(r"\s*[(\[].*?[)\]]"));
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| re(r"[^\w\s]"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| re(r"\s+"));

/// Megalobiz lyrics provider
#[derive(Debug, Clone)]
pub struct MegalobizProvider {
    client: reqwest::Client,
}

impl MegalobizProvider {
    pub const NAME: &'static str = "megalobiz";
    const BASE_URL: &'static str = "https://www.megalobiz.com";
    const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
    const TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(settings: &ProviderSettings) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        Ok(Self {
            client: settings.http_client(Self::USER_AGENT, Self::TIMEOUT, headers)?,
        })
    }

    async fn lookup(&self, track: &str, artist: &str) -> anyhow::Result<Option<String>> {
        let Some(path) = self.search(track, artist).await? else {
            return Ok(None);
        };
        let page = self.get_page(&format!("{}{}", Self::BASE_URL, path)).await?;
        Ok(page.as_deref().and_then(extract_lrc))
    }

    async fn search(&self, track: &str, artist: &str) -> anyhow::Result<Option<String>> {
        let query = clean_query(&format!("{} {}", artist, track));
        let url = format!(
            "{}/search/all?qry={}&display=more",
            Self::BASE_URL,
            urlencoding::encode(&query)
        );
        let page = self.get_page(&url).await?;
        Ok(page.as_deref().and_then(find_lrc_path))
    }

    /// Page body, or `None` on a non-success status.
    async fn get_page(&self, url: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body = response.text().await.context("read megalobiz page")?;
        Ok(Some(body))
    }
}

#[async_trait]
impl LyricsProvider for MegalobizProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, track: &str, artist: &str) -> Option<String> {
        absorb(Self::NAME, self.lookup(track, artist).await)
    }
}

/// Path of the first LRC page linked from a search results page.
fn find_lrc_path(html: &str) -> Option<String> {
    LRC_MAKER_LINK
        .captures(html)
        .or_else(|| LRC_ANY_LINK.captures(html))
        .map(|c| c[1].to_string())
}

/// Timestamped lyrics from an LRC page.
fn extract_lrc(html: &str) -> Option<String> {
    for container in LYRICS_CONTAINERS.iter() {
        if let Some(c) = container.captures(html) {
            return Some(clean_lrc(&c[1]));
        }
    }

    let runs: Vec<&str> = TIMESTAMPED_RUN
        .find_iter(html)
        .map(|m| m.as_str())
        .collect();
    (!runs.is_empty()).then(|| clean_lrc(&runs.join("\n")))
}

/// Turn an HTML lyrics fragment into LRC text.
fn clean_lrc(fragment: &str) -> String {
    let text = LINE_BREAK.replace_all(fragment, "\n");
    let text = TAG.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip bracketed suffixes and punctuation from a search query.
fn clean_query(text: &str) -> String {
    let text = BRACKETED.replace_all(text, "");
    let text = PUNCTUATION.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}
