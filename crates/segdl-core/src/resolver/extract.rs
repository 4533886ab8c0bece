//! Candidate media URL extraction from page markup.

use regex::Regex;
use std::sync::LazyLock;

/// Replacement for `master.m3u8`: the numbered segment naming used by the CDN.
pub const SEGMENT_TEMPLATE: &str = "seg-{seg}-v1-a1.ts";

const MASTER_PLAYLIST: &str = "master.m3u8";

/// Substrings marking thumbnails, sprites and similar non-video matches.
const JUNK_MARKERS: [&str; 3] = ["gif", ",.", "jpg"];

static PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        // Quoted string containing ".mp4".
        Regex::new(r#"["|']([^\s'"]+\.mp4.*?)["|']"#).expect("valid quoted mp4 pattern"),
        // JSON player config.
        Regex::new(r#"videoUrl":"(.*?)""#).expect("valid videoUrl pattern"),
    ]
});

/// One cleaned candidate URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    /// True when this candidate was a master playlist rewritten into a segment template.
    pub chunked: bool,
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

/// Every raw capture, before filtering. Used for `--show`.
pub(super) fn raw_matches(html: &str) -> Vec<String> {
    PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(html))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Scrape, filter, and normalize candidate media URLs, unique and in discovery order.
pub fn extract_candidates(html: &str) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::new();
    for raw in raw_matches(html) {
        if JUNK_MARKERS.iter().any(|junk| raw.contains(junk)) {
            continue;
        }
        let chunked = raw.contains(MASTER_PLAYLIST);
        let mut url = if chunked {
            raw.replace(MASTER_PLAYLIST, SEGMENT_TEMPLATE)
        } else {
            raw
        };
        url.retain(|c| c != '\\');
        if !out.iter().any(|c| c.url == url) {
            out.push(Candidate { url, chunked });
        }
    }
    out
}
