//! Classify segment responses into fetcher verdicts.

use crate::retry::policy::ErrorKind;
use crate::transport::HttpResponse;

const NOT_FOUND_MARKER: &[u8] = b"not found";

/// Why a fetcher concluded there are no more segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfStream {
    /// The body carried a "not found" marker (any status).
    NotFound { status: u32 },
    /// A 200 whose body is smaller than the minimum segment size.
    Undersized { len: usize },
}

/// Outcome of a single response.
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    /// A complete segment body.
    Segment(Vec<u8>),
    /// No more segments exist at or beyond this id.
    EndOfStream(EndOfStream),
    /// Retry the same id according to the policy.
    Retry(ErrorKind),
}

/// True if `body` contains "not found", ASCII case-insensitive.
pub fn body_says_not_found(body: &[u8]) -> bool {
    body.windows(NOT_FOUND_MARKER.len())
        .any(|w| w.eq_ignore_ascii_case(NOT_FOUND_MARKER))
}

/// Classify a response. The body marker is checked before the status so that a
/// "not found" page served with 200 still ends the stream.
pub fn classify_response(response: HttpResponse, min_body_len: usize) -> Verdict {
    let HttpResponse { status, body } = response;
    if body_says_not_found(&body) {
        return Verdict::EndOfStream(EndOfStream::NotFound { status });
    }
    match status {
        429 => Verdict::Retry(ErrorKind::Throttled),
        200 if body.len() < min_body_len => {
            Verdict::EndOfStream(EndOfStream::Undersized { len: body.len() })
        }
        200 => Verdict::Segment(body),
        other => Verdict::Retry(ErrorKind::UnexpectedStatus(other)),
    }
}
