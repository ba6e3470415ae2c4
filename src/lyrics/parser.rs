//! LRC format parser
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:12.34] Hello world
//! [00:15:000] Another line
//!
//! Lines without a leading timestamp (metadata tags such as `[ar:Artist]`,
//! plain text, malformed stamps) are dropped rather than reported.

use super::model::LyricLine;

/// Parse LRC formatted lyrics into lines sorted by offset.
///
/// Lines sharing a timestamp keep their input order.
pub fn parse(content: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(parsed) = parse_timed_line(line) {
            lines.extend(parsed);
        }
    }

    lines.sort_by_key(|l| l.offset_ms());
    lines
}

/// Whether `content` carries at least one `[mm:ss` timestamp prefix.
///
/// Looser than [`parse`]: the fraction is not validated.
pub fn is_time_synced(content: &str) -> bool {
    content.as_bytes().windows(6).any(|w| {
        w[0] == b'['
            && w[1].is_ascii_digit()
            && w[2].is_ascii_digit()
            && w[3] == b':'
            && w[4].is_ascii_digit()
            && w[5].is_ascii_digit()
    })
}

/// Parse a timed line like [00:12.34]Lyrics or [00:12.34][00:15.00]Lyrics
fn parse_timed_line(line: &str) -> Option<Vec<LyricLine>> {
    let mut timestamps = Vec::new();
    let mut pos = 0;

    // Extract all timestamps at the beginning
    while line[pos..].starts_with('[') {
        let Some(end) = line[pos..].find(']') else {
            break;
        };
        match parse_timestamp(&line[pos + 1..pos + end]) {
            Some(ms) => {
                timestamps.push(ms);
                pos += end + 1;
            }
            None => break,
        }
    }

    if timestamps.is_empty() {
        return None;
    }

    let text = line[pos..].trim();
    Some(
        timestamps
            .into_iter()
            .map(|ts| LyricLine::new(ts, text))
            .collect(),
    )
}

/// Parse `mm:ss.f`, `mm:ss.ff`, `mm:ss.fff` (or `:` before the fraction)
/// to milliseconds.
fn parse_timestamp(s: &str) -> Option<u64> {
    let b = s.as_bytes();
    if !(7..=9).contains(&b.len()) {
        return None;
    }
    let two_digits = |hi: u8, lo: u8| -> Option<u64> {
        (hi.is_ascii_digit() && lo.is_ascii_digit())
            .then(|| u64::from(hi - b'0') * 10 + u64::from(lo - b'0'))
    };

    let min = two_digits(b[0], b[1])?;
    if b[2] != b':' {
        return None;
    }
    let sec = two_digits(b[3], b[4])?;
    if b[5] != b'.' && b[5] != b':' {
        return None;
    }

    let fraction = &s[6..];
    if !fraction.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // "5" -> 500, "45" -> 450, "456" -> 456
    let ms: u64 = format!("{:0<3}", fraction).parse().ok()?;

    Some(min * 60_000 + sec * 1000 + ms)
}
