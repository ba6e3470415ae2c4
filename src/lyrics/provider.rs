//! Provider contract and registry.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::lrclib::LrclibProvider;
use super::megalobiz::MegalobizProvider;
use super::netease::NeteaseProvider;

/// A source of lyrics text for a (track, artist) pair.
///
/// `fetch` never fails: transport errors, unparseable responses and misses
/// are all reported as `None`.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Stable identifier, used as the `source` of resolved lyrics
    fn name(&self) -> &str;

    /// Fetch raw lyrics (LRC or plain text).
    async fn fetch(&self, track: &str, artist: &str) -> Option<String>;
}

/// Built-in providers, in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Lrclib,
    Netease,
    Megalobiz,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Lrclib, Self::Netease, Self::Megalobiz];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lrclib => "lrclib",
            Self::Netease => "netease",
            Self::Megalobiz => "megalobiz",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name.trim()))
    }

    pub fn build(self, settings: &ProviderSettings) -> anyhow::Result<Arc<dyn LyricsProvider>> {
        Ok(match self {
            Self::Lrclib => Arc::new(LrclibProvider::new(settings)?),
            Self::Netease => Arc::new(NeteaseProvider::new(settings)?),
            Self::Megalobiz => Arc::new(MegalobizProvider::new(settings)?),
        })
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of every built-in provider, in default order.
pub fn available_providers() -> Vec<&'static str> {
    ProviderKind::ALL.iter().map(|k| k.as_str()).collect()
}

/// Transport settings shared by the built-in providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// Overrides each provider's own request timeout.
    pub timeout: Option<Duration>,
    /// Overrides each provider's own User-Agent.
    pub user_agent: Option<String>,
}

impl ProviderSettings {
    pub(crate) fn http_client(
        &self,
        default_user_agent: &str,
        default_timeout: Duration,
        headers: HeaderMap,
    ) -> anyhow::Result<reqwest::Client> {
        let user_agent = self.user_agent.as_deref().unwrap_or(default_user_agent);
        reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(default_timeout))
            .build()
            .context("build reqwest client")
    }
}

/// Collapse a provider-internal lookup into the `fetch` contract.
pub(crate) fn absorb(provider: &str, result: anyhow::Result<Option<String>>) -> Option<String> {
    match result {
        Ok(Some(text)) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(provider, error = %format!("{err:#}"), "lyrics lookup failed");
            None
        }
    }
}
