use super::{Config, HttpConfig, LyricsConfig};
use crate::lyrics::available_providers;

/// Every built-in provider: lrclib, then netease, then megalobiz.
pub fn provider_order() -> Vec<String> {
    available_providers().into_iter().map(String::from).collect()
}

pub fn defaults() -> Config {
    Config {
        lyrics: LyricsConfig {
            providers: provider_order(),
            synced_only: true,
        },
        http: HttpConfig {
            timeout_secs: None,
            user_agent: None,
        },
    }
}
