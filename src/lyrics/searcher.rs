//! Ordered-fallback lyrics search across providers.

use futures_util::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use super::model::SyncedLyrics;
use super::parser;
use super::provider::{LyricsProvider, ProviderKind, ProviderSettings};

type ProviderList = Arc<[Arc<dyn LyricsProvider>]>;

/// Why a provider did not produce the returned result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The provider had nothing for this track
    NotFound,
    /// Plain-text lyrics while synced lyrics were required
    NotSynced,
    /// The provider panicked
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::NotSynced => f.write_str("not synced"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub provider: String,
    pub reason: SkipReason,
}

/// Outcome of one search with per-provider diagnostics.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub lyrics: Option<SyncedLyrics>,
    /// Providers consulted before the result, in order
    pub skipped: Vec<Skipped>,
}

/// Searches providers in priority order; the first acceptable result wins.
pub struct Searcher {
    providers: RwLock<ProviderList>,
    settings: ProviderSettings,
}

impl Searcher {
    /// Default order: lrclib -> netease -> megalobiz
    pub fn new(settings: ProviderSettings) -> Self {
        Self::from_names(&ProviderKind::ALL.map(ProviderKind::as_str), settings)
    }

    /// Built-in providers by name, in the given order. Unknown names are
    /// ignored.
    pub fn from_names<S: AsRef<str>>(names: &[S], settings: ProviderSettings) -> Self {
        let providers = build_providers(names, &settings);
        Self {
            providers: RwLock::new(providers),
            settings,
        }
    }

    /// Arbitrary provider instances, in the given order.
    pub fn with_providers(providers: Vec<Arc<dyn LyricsProvider>>) -> Self {
        Self {
            providers: RwLock::new(providers.into()),
            settings: ProviderSettings::default(),
        }
    }

    /// Replace the provider sequence with built-in providers by name.
    /// Unknown names are ignored.
    pub fn set_providers<S: AsRef<str>>(&self, names: &[S]) {
        self.swap(build_providers(names, &self.settings));
    }

    /// Replace the provider sequence wholesale.
    pub fn replace_providers(&self, providers: Vec<Arc<dyn LyricsProvider>>) {
        self.swap(providers.into());
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.snapshot().iter().map(|p| p.name().to_string()).collect()
    }

    /// First acceptable lyrics, or `None` once every provider is exhausted.
    ///
    /// Text that looks timestamped but yields no timed lines (`[00:01]text`)
    /// counts as plain, so `synced_only` skips it.
    pub async fn search(&self, track: &str, artist: &str, synced_only: bool) -> Option<SyncedLyrics> {
        self.search_with_report(track, artist, synced_only)
            .await
            .lyrics
    }

    /// Like [`Searcher::search`], also recording why each earlier provider
    /// was passed over.
    pub async fn search_with_report(
        &self,
        track: &str,
        artist: &str,
        synced_only: bool,
    ) -> SearchReport {
        let providers = self.snapshot();
        let mut report = SearchReport::default();

        for provider in providers.iter() {
            let name = provider.name();
            let reason = match fetch_isolated(provider.as_ref(), track, artist).await {
                Ok(Some(raw)) => {
                    let lyrics = assemble(track, artist, raw, name);
                    if !synced_only || lyrics.is_synced() {
                        tracing::info!(provider = name, synced = lyrics.is_synced(), "lyrics found");
                        report.lyrics = Some(lyrics);
                        return report;
                    }
                    SkipReason::NotSynced
                }
                Ok(None) => SkipReason::NotFound,
                Err(msg) => SkipReason::Failed(msg),
            };

            tracing::debug!(provider = name, %reason, "skipping provider");
            report.skipped.push(Skipped {
                provider: name.to_string(),
                reason,
            });
        }

        report
    }

    /// Every provider's lyrics, in provider order.
    pub async fn search_all(&self, track: &str, artist: &str) -> Vec<SyncedLyrics> {
        let providers = self.snapshot();
        let mut results = Vec::new();

        for provider in providers.iter() {
            let name = provider.name();
            match fetch_isolated(provider.as_ref(), track, artist).await {
                Ok(Some(raw)) => results.push(assemble(track, artist, raw, name)),
                Ok(None) => tracing::debug!(provider = name, "no lyrics"),
                Err(msg) => tracing::debug!(provider = name, error = %msg, "provider failed"),
            }
        }

        results
    }

    fn snapshot(&self) -> ProviderList {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn swap(&self, providers: ProviderList) {
        *self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner) = providers;
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(ProviderSettings::default())
    }
}

impl fmt::Debug for Searcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Searcher")
            .field("providers", &self.provider_names())
            .finish()
    }
}

fn build_providers<S: AsRef<str>>(names: &[S], settings: &ProviderSettings) -> ProviderList {
    names
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let Some(kind) = ProviderKind::from_name(name) else {
                tracing::warn!(provider = name, "unknown lyrics provider ignored");
                return None;
            };
            match kind.build(settings) {
                Ok(provider) => Some(provider),
                Err(err) => {
                    tracing::warn!(provider = name, error = %format!("{err:#}"), "provider unavailable");
                    None
                }
            }
        })
        .collect()
}

/// Run `fetch`, turning a panic into an error message.
async fn fetch_isolated(
    provider: &dyn LyricsProvider,
    track: &str,
    artist: &str,
) -> Result<Option<String>, String> {
    AssertUnwindSafe(provider.fetch(track, artist))
        .catch_unwind()
        .await
        .map(|raw| raw.filter(|s| !s.trim().is_empty()))
        .map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "provider panicked".to_string())
}

/// A payload counts as synced only if it both looks timestamped and yields
/// at least one timed line.
fn assemble(track: &str, artist: &str, raw: String, source: &str) -> SyncedLyrics {
    let lines = if parser::is_time_synced(&raw) {
        parser::parse(&raw)
    } else {
        Vec::new()
    };
    SyncedLyrics::new(track, artist, raw, lines, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    const SYNCED: &str = "[00:01.00]first\n[00:02.50]second";
    const PLAIN: &str = "first\nsecond";

    enum Reply {
        Absent,
        Text(&'static str),
        Panic,
    }

    struct Scripted {
        name: &'static str,
        reply: Reply,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LyricsProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _track: &str, _artist: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Absent => None,
                Reply::Text(text) => Some(text.to_string()),
                Reply::Panic => panic!("{} exploded", self.name),
            }
        }
    }

    /// Finds nothing, but only once released.
    #[derive(Default)]
    struct Gated {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl LyricsProvider for Gated {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch(&self, _track: &str, _artist: &str) -> Option<String> {
            self.started.notify_one();
            self.release.notified().await;
            None
        }
    }

    fn searcher(providers: &[Arc<Scripted>]) -> Searcher {
        Searcher::with_providers(
            providers
                .iter()
                .map(|p| p.clone() as Arc<dyn LyricsProvider>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_falls_back_to_next_provider() {
        let p1 = Scripted::new("p1", Reply::Absent);
        let p2 = Scripted::new("p2", Reply::Text(SYNCED));
        let s = searcher(&[p1.clone(), p2.clone()]);

        let lyrics = s.search("Song", "Artist", true).await.unwrap();
        assert_eq!(lyrics.source(), "p2");
        assert_eq!(lyrics.track(), "Song");
        assert_eq!(lyrics.artist(), "Artist");
        assert_eq!(lyrics.lines().len(), 2);
        assert_eq!(lyrics.lines()[1].offset_ms(), 2500);
        assert_eq!(p1.calls(), 1);
        assert_eq!(p2.calls(), 1);
    }

    #[tokio::test]
    async fn test_first_accepted_result_wins() {
        let p1 = Scripted::new("p1", Reply::Text(SYNCED));
        let p2 = Scripted::new("p2", Reply::Text(SYNCED));
        let s = searcher(&[p1.clone(), p2.clone()]);

        let lyrics = s.search("Song", "Artist", false).await.unwrap();
        assert_eq!(lyrics.source(), "p1");
        assert_eq!(p2.calls(), 0);
    }

    #[tokio::test]
    async fn test_synced_only_skips_plain_text() {
        let p1 = Scripted::new("p1", Reply::Text(PLAIN));
        let p2 = Scripted::new("p2", Reply::Text(SYNCED));
        let s = searcher(&[p1, p2]);

        let report = s.search_with_report("Song", "Artist", true).await;
        assert_eq!(report.lyrics.unwrap().source(), "p2");
        assert_eq!(
            report.skipped,
            [Skipped {
                provider: "p1".into(),
                reason: SkipReason::NotSynced
            }]
        );
    }

    #[tokio::test]
    async fn test_plain_text_accepted_when_not_synced_only() {
        let p1 = Scripted::new("p1", Reply::Text(PLAIN));
        let p2 = Scripted::new("p2", Reply::Text(SYNCED));
        let s = searcher(&[p1, p2]);

        let lyrics = s.search("Song", "Artist", false).await.unwrap();
        assert_eq!(lyrics.source(), "p1");
        assert!(!lyrics.is_synced());
        assert!(lyrics.lines().is_empty());
        assert_eq!(lyrics.to_lrc(), PLAIN);
    }

    #[tokio::test]
    async fn test_timestamp_looking_payload_without_lines_is_not_synced() {
        let p1 = Scripted::new("p1", Reply::Text("[00:01]no fraction"));
        let s = searcher(&[p1]);

        assert!(s.search("Song", "Artist", true).await.is_none());
        let lyrics = s.search("Song", "Artist", false).await.unwrap();
        assert!(!lyrics.is_synced());
    }

    #[tokio::test]
    async fn test_total_failure_returns_none() {
        let s = searcher(&[
            Scripted::new("p1", Reply::Absent),
            Scripted::new("p2", Reply::Text("   ")),
        ]);

        let report = s.search_with_report("Song", "Artist", false).await;
        assert!(report.lyrics.is_none());
        assert_eq!(report.skipped.len(), 2);
        assert!(
            report
                .skipped
                .iter()
                .all(|s| s.reason == SkipReason::NotFound)
        );
    }

    #[tokio::test]
    async fn test_no_providers() {
        let s = searcher(&[]);
        assert!(s.search("Song", "Artist", true).await.is_none());
        assert!(s.search_all("Song", "Artist").await.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_provider_is_isolated() {
        let p1 = Scripted::new("p1", Reply::Panic);
        let p2 = Scripted::new("p2", Reply::Text(SYNCED));
        let s = searcher(&[p1, p2.clone()]);

        let report = s.search_with_report("Song", "Artist", true).await;
        assert_eq!(report.lyrics.unwrap().source(), "p2");
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Failed("p1 exploded".into())
        );
        assert_eq!(p2.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_all_collects_every_result() {
        let s = searcher(&[
            Scripted::new("p1", Reply::Text(PLAIN)),
            Scripted::new("p2", Reply::Absent),
            Scripted::new("p3", Reply::Panic),
            Scripted::new("p4", Reply::Text(SYNCED)),
        ]);

        let all = s.search_all("Song", "Artist").await;
        let sources: Vec<_> = all.iter().map(SyncedLyrics::source).collect();
        assert_eq!(sources, ["p1", "p4"]);
        assert!(!all[0].is_synced());
        assert!(all[1].is_synced());
    }

    #[tokio::test]
    async fn test_replace_providers() {
        let s = searcher(&[Scripted::new("old", Reply::Text(SYNCED))]);
        assert_eq!(s.provider_names(), ["old"]);

        s.replace_providers(vec![Scripted::new("new", Reply::Text(SYNCED)) as Arc<dyn LyricsProvider>]);
        assert_eq!(s.provider_names(), ["new"]);
        assert_eq!(s.search("Song", "Artist", true).await.unwrap().source(), "new");
    }

    #[tokio::test]
    async fn test_replace_providers_during_search_keeps_old_list() {
        let gate = Arc::new(Gated::default());
        let p2 = Scripted::new("p2", Reply::Text(SYNCED));
        let fresh = Scripted::new("new", Reply::Text(SYNCED));
        let s = Arc::new(Searcher::with_providers(vec![
            gate.clone() as Arc<dyn LyricsProvider>,
            p2.clone() as Arc<dyn LyricsProvider>,
        ]));

        let pending = tokio::spawn({
            let s = s.clone();
            async move { s.search("Song", "Artist", true).await }
        });

        gate.started.notified().await;
        s.replace_providers(vec![fresh.clone() as Arc<dyn LyricsProvider>]);
        gate.release.notify_one();

        let found = pending.await.unwrap().unwrap();
        assert_eq!(found.source(), "p2");
        assert_eq!(p2.calls(), 1);
        assert_eq!(fresh.calls(), 0);

        // The next search sees only the new list
        assert_eq!(s.provider_names(), ["new"]);
        assert_eq!(s.search("Song", "Artist", true).await.unwrap().source(), "new");
        assert_eq!(p2.calls(), 1);
    }

    #[test]
    fn test_set_providers_ignores_unknown_names() {
        let s = Searcher::from_names(&["netease", "genius", "lrclib"], ProviderSettings::default());
        assert_eq!(s.provider_names(), ["netease", "lrclib"]);

        s.set_providers(&["megalobiz", "nope"]);
        assert_eq!(s.provider_names(), ["megalobiz"]);

        s.set_providers::<&str>(&[]);
        assert!(s.provider_names().is_empty());
    }

    #[test]
    fn test_default_order() {
        assert_eq!(
            Searcher::default().provider_names(),
            ["lrclib", "netease", "megalobiz"]
        );
    }
}
