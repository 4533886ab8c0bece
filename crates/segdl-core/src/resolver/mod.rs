//! Resolver: turn a watch page into a media URL the core can consume.
//!
//! The page is fetched once, candidate URLs are scraped out of it, the best
//! quality tier is chosen and relative URLs are made absolute. An HLS master
//! playlist is rewritten into a numbered-segment template, which makes the
//! result chunked. The downloader only depends on [`ResolvedMedia`].

mod extract;
mod quality;

pub use extract::{extract_candidates, Candidate, SEGMENT_TEMPLATE};
pub use quality::best_quality;

use crate::transport::Transport;
use crate::url_model::DEFAULT_PLACEHOLDER;
use anyhow::{bail, Context, Result};

/// What the resolver hands to the downloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub url: String,
    /// True when `url` is a segment template rather than a direct file.
    pub chunked: bool,
}

impl ResolvedMedia {
    /// A user-supplied segment template, bypassing page resolution.
    pub fn segment_template(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            chunked: true,
        }
    }
}

/// Pick the media URL out of an already fetched page.
///
/// Returns `None` when the page has no usable candidate.
pub fn find_media_url(page_url: &str, html: &str) -> Option<ResolvedMedia> {
    let candidates = extract_candidates(html);
    let best = best_quality(&candidates)?;
    Some(ResolvedMedia {
        url: absolutize(page_url, &best.url),
        chunked: best.chunked,
    })
}

/// Fetch `page_url` and resolve its media URL. When `show_all` is set every
/// raw pattern match is printed.
pub async fn resolve_page<T: Transport>(
    transport: &T,
    page_url: &str,
    show_all: bool,
) -> Result<ResolvedMedia> {
    let response = transport
        .get(page_url)
        .await
        .with_context(|| format!("failed to fetch page {page_url}"))?;
    tracing::debug!(status = response.status, len = response.body.len(), "fetched page");
    let html = response.text();

    if show_all {
        for m in extract::raw_matches(&html) {
            println!("{m}");
        }
    }

    match find_media_url(page_url, &html) {
        Some(media) => Ok(media),
        None => bail!("no direct media url found on {page_url}"),
    }
}

/// Resolve a host-less candidate against the page URL.
///
/// Root-relative candidates are appended to the page origin as-is. Other
/// relative forms go through `Url::join`, which percent-encodes the segment
/// placeholder braces; those are restored afterwards.
fn absolutize(page_url: &str, candidate: &str) -> String {
    if url::Url::parse(candidate).is_ok_and(|u| u.has_host()) {
        return candidate.to_string();
    }
    let Ok(base) = url::Url::parse(page_url) else {
        return candidate.to_string();
    };
    if let Some(rest) = candidate.strip_prefix("//") {
        return format!("{}://{}", base.scheme(), rest);
    }
    let origin = base.origin();
    if candidate.starts_with('/') && origin.is_tuple() {
        return format!("{}{}", origin.ascii_serialization(), candidate);
    }
    match base.join(candidate) {
        Ok(joined) => joined
            .as_str()
            .replace(ENCODED_PLACEHOLDER, DEFAULT_PLACEHOLDER),
        Err(_) => candidate.to_string(),
    }
}

/// `{seg}` as `Url::join` serializes it.
const ENCODED_PLACEHOLDER: &str = "%7Bseg%7D";
