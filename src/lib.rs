//! Synced lyrics resolution across multiple lyrics providers.

pub mod config;
pub mod lyrics;

pub use lyrics::{
    LyricLine, LyricsProvider, Searcher, SyncedLyrics, resolve_batch, resolve_lyrics,
};
