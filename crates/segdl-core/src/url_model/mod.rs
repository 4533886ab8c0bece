//! URL modeling: segment URL templates and output file naming.
//!
//! Output names are derived from the last path component before the `.mp4`
//! marker, sanitized for Linux, with a random stem when nothing usable is left.

mod sanitize;
mod template;

pub use sanitize::sanitize_filename_for_linux;
pub use template::{SegmentUrl, TemplateError, DEFAULT_PLACEHOLDER};

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Extension marker stripped from the URL and appended to the output name.
const MEDIA_EXTENSION: &str = ".mp4";

/// Length of the random stem used when the URL yields no name.
const RANDOM_STEM_LEN: usize = 6;

/// Derives the output file name for a media or segment-template URL.
///
/// # Examples
///
/// - `output_file_name("https://cdn.example.com/v/clip42.mp4/seg-{seg}-v1-a1.ts")` → `"clip42.mp4"`
/// - `output_file_name("https://example.com/files/movie.mp4?t=1")` → `"movie.mp4"`
pub fn output_file_name(url: &str) -> String {
    let stem = stem_from_url(url)
        .map(|s| sanitize_filename_for_linux(&s))
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(random_stem);
    format!("{}{}", stem, MEDIA_EXTENSION)
}

fn stem_from_url(url: &str) -> Option<String> {
    let before_ext = url.split(MEDIA_EXTENSION).next().unwrap_or(url);
    let mut parts = before_ext.rsplit('/');
    let last = parts.next()?;
    // A bare word with no path separator is not a URL path.
    parts.next()?;
    let last = last.split(['?', '#']).next().unwrap_or(last);
    if last.is_empty() {
        return None;
    }
    Some(last.to_string())
}

fn random_stem() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_STEM_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_from_playlist_directory() {
        assert_eq!(
            output_file_name("https://cdn.example.com/v/clip42.mp4/seg-{seg}-v1-a1.ts"),
            "clip42.mp4"
        );
    }

    #[test]
    fn name_from_direct_file() {
        assert_eq!(
            output_file_name("https://example.com/files/movie.mp4?t=1"),
            "movie.mp4"
        );
    }

    #[test]
    fn name_from_template_without_marker() {
        assert_eq!(
            output_file_name("https://example.com/video650-{seg}-1.ts?x=1"),
            "video650-_seg_-1.ts.mp4"
        );
    }

    #[test]
    fn random_fallback() {
        let name = output_file_name("no-slashes-here");
        assert_eq!(name.len(), RANDOM_STEM_LEN + MEDIA_EXTENSION.len());
        assert!(name.ends_with(".mp4"));
        assert!(name[..RANDOM_STEM_LEN]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));

        let trailing = output_file_name("https://example.com/");
        assert_eq!(trailing.len(), RANDOM_STEM_LEN + MEDIA_EXTENSION.len());
    }

    #[test]
    fn reserved_names_fall_back() {
        let name = output_file_name("https://example.com/..");
        assert_ne!(name, "...mp4");
        assert_eq!(name.len(), RANDOM_STEM_LEN + MEDIA_EXTENSION.len());
    }
}
