//! Timeline model for resolved lyrics.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::fmt;

/// A single timed line of lyrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    offset_ms: u64,
    text: String,
}

impl LyricLine {
    pub fn new(offset_ms: u64, text: impl Into<String>) -> Self {
        Self {
            offset_ms,
            text: text.into(),
        }
    }

    /// Offset from the start of the track in milliseconds
    pub fn offset_ms(&self) -> u64 {
        self.offset_ms
    }

    /// The lyrics text, empty for an instrumental gap
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `mm:ss.cc` rendering of the offset (centisecond precision).
    pub fn display_timestamp(&self) -> String {
        let min = self.offset_ms / 60_000;
        let sec = (self.offset_ms % 60_000) / 1000;
        let cs = (self.offset_ms % 1000) / 10;
        format!("{:02}:{:02}.{:02}", min, sec, cs)
    }
}

impl fmt::Display for LyricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.display_timestamp(), self.text)
    }
}

impl Serialize for LyricLine {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("LyricLine", 3)?;
        s.serialize_field("offset_ms", &self.offset_ms)?;
        s.serialize_field("timestamp", &self.display_timestamp())?;
        s.serialize_field("text", &self.text)?;
        s.end()
    }
}

/// Lyrics resolved from one provider.
///
/// `lines` is empty when the payload was plain text, and sorted by offset
/// otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct SyncedLyrics {
    track: String,
    artist: String,
    raw_text: String,
    lines: Vec<LyricLine>,
    source: String,
}

impl SyncedLyrics {
    pub fn new(
        track: impl Into<String>,
        artist: impl Into<String>,
        raw_text: impl Into<String>,
        mut lines: Vec<LyricLine>,
        source: impl Into<String>,
    ) -> Self {
        // Stable, so equal offsets keep their input order.
        lines.sort_by_key(|l| l.offset_ms);
        Self {
            track: track.into(),
            artist: artist.into(),
            raw_text: raw_text.into(),
            lines,
            source: source.into(),
        }
    }

    pub fn track(&self) -> &str {
        &self.track
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Name of the provider that produced this result
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn is_synced(&self) -> bool {
        !self.lines.is_empty()
    }

    /// The provider payload, verbatim.
    pub fn to_lrc(&self) -> &str {
        &self.raw_text
    }

    /// Lyrics without timestamps; instrumental gaps are skipped.
    pub fn to_plain_text(&self) -> String {
        self.lines
            .iter()
            .filter(|l| !l.text.is_empty())
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The line being sung at `offset_ms`: the last line starting at or
    /// before it.
    pub fn line_at(&self, offset_ms: u64) -> Option<&LyricLine> {
        let idx = self.lines.partition_point(|l| l.offset_ms <= offset_ms);
        idx.checked_sub(1).map(|i| &self.lines[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lyrics(lines: Vec<LyricLine>) -> SyncedLyrics {
        SyncedLyrics::new("Test", "Artist", "", lines, "test")
    }

    #[test]
    fn test_display_timestamp() {
        assert_eq!(LyricLine::new(83_456, "x").display_timestamp(), "01:23.45");
        assert_eq!(LyricLine::new(0, "").display_timestamp(), "00:00.00");
        assert_eq!(LyricLine::new(1500, "A").to_string(), "[00:01.50] A");
    }

    #[test]
    fn test_to_plain_text() {
        let l = lyrics(vec![
            LyricLine::new(1000, "Line 1"),
            LyricLine::new(1500, ""),
            LyricLine::new(2000, "Line 2"),
        ]);
        assert_eq!(l.to_plain_text(), "Line 1\nLine 2");
        assert_eq!(lyrics(Vec::new()).to_plain_text(), "");
    }

    #[test]
    fn test_line_at() {
        let l = lyrics(vec![
            LyricLine::new(1000, "Line 1"),
            LyricLine::new(5000, "Line 2"),
        ]);
        assert_eq!(l.line_at(5000).map(LyricLine::text), Some("Line 2"));
        assert_eq!(l.line_at(7000).map(LyricLine::text), Some("Line 2"));
        assert_eq!(l.line_at(1000).map(LyricLine::text), Some("Line 1"));
        assert!(l.line_at(500).is_none());
        assert!(lyrics(Vec::new()).line_at(1000).is_none());
    }

    #[test]
    fn test_line_at_prefers_last_of_tied_lines() {
        let l = lyrics(vec![
            LyricLine::new(3000, "original"),
            LyricLine::new(3000, "translation"),
        ]);
        assert_eq!(l.line_at(3500).map(LyricLine::text), Some("translation"));
    }

    #[test]
    fn test_new_sorts_stably() {
        let l = lyrics(vec![
            LyricLine::new(2000, "b"),
            LyricLine::new(1000, "a1"),
            LyricLine::new(1000, "a2"),
        ]);
        let texts: Vec<_> = l.lines().iter().map(LyricLine::text).collect();
        assert_eq!(texts, ["a1", "a2", "b"]);
        assert!(l.is_synced());
    }

    #[test]
    fn test_serialize_line() {
        let v = serde_json::to_value(LyricLine::new(12_340, "Hello")).unwrap();
        assert_eq!(v["offset_ms"], 12_340);
        assert_eq!(v["timestamp"], "00:12.34");
        assert_eq!(v["text"], "Hello");
    }
}
