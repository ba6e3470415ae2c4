//! Lyrics resolution
//!
//! This module provides:
//! - A provider contract with LRCLIB, NetEase and Megalobiz backends
//! - An ordered-fallback searcher across providers
//! - LRC format parser for synchronized lyrics
//! - Data structures for lyrics display

pub mod lrclib;
pub mod megalobiz;
pub mod model;
pub mod netease;
pub mod parser;
pub mod provider;
pub mod searcher;

pub use model::{LyricLine, SyncedLyrics};
pub use provider::{LyricsProvider, ProviderKind, ProviderSettings, available_providers};
pub use searcher::{SearchReport, Searcher, SkipReason, Skipped};

/// Get lyrics for a track.
///
/// `track` and `artist` are used as given; cleaning catalog titles is the
/// caller's job.
pub async fn resolve_lyrics(
    searcher: &Searcher,
    track: &str,
    artist: &str,
    synced_only: bool,
) -> Option<SyncedLyrics> {
    searcher.search(track, artist, synced_only).await
}

/// Get lyrics for a list of (track, artist) pairs, one entry per input in
/// input order.
pub async fn resolve_batch<T, A>(
    searcher: &Searcher,
    tracks: &[(T, A)],
    synced_only: bool,
) -> Vec<Option<SyncedLyrics>>
where
    T: AsRef<str>,
    A: AsRef<str>,
{
    let mut out = Vec::with_capacity(tracks.len());
    for (track, artist) in tracks {
        out.push(
            searcher
                .search(track.as_ref(), artist.as_ref(), synced_only)
                .await,
        );
    }
    out
}
