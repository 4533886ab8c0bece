//! Linux-safe file name sanitization.

/// Linux NAME_MAX, in bytes.
const NAME_MAX: usize = 255;

/// Characters that are legal on Linux but awkward in a media file name:
/// template braces and shell-hostile punctuation.
const REPLACED: &[char] = &['/', '\\', '{', '}', '"', '\'', '|', '*', '<', '>', ':'];

/// Sanitizes a candidate name for use as a file on Linux.
///
/// Unsafe characters, whitespace and control characters become a single `_`;
/// leading/trailing dots and underscores are trimmed; the result is capped at
/// 255 bytes on a char boundary. May return an empty string.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let unsafe_char = c.is_control() || c.is_whitespace() || REPLACED.contains(&c);
        if !unsafe_char {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_separators_and_braces() {
        assert_eq!(sanitize_filename_for_linux("a/b\\c.ts"), "a_b_c.ts");
        assert_eq!(
            sanitize_filename_for_linux("video650-{seg}-1.ts"),
            "video650-_seg_-1.ts"
        );
    }

    #[test]
    fn trims_dots_and_collapses() {
        assert_eq!(sanitize_filename_for_linux(" ..clip  name.. "), "clip_name");
        assert_eq!(sanitize_filename_for_linux("x\u{0}\u{1}y"), "x_y");
        assert_eq!(sanitize_filename_for_linux(".."), "");
    }

    #[test]
    fn caps_length_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename_for_linux(&long);
        assert!(out.len() <= NAME_MAX);
        assert_eq!(out.len() % 2, 0);
    }
}
