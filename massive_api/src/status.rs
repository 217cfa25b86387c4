//! HTTP status classification shared by every endpoint.

/// How a response status should be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 2xx: parse the body.
    Success,
    /// Rate limited or edge outage: back off and try again.
    Retryable,
    /// Anything else: give up immediately.
    Fatal,
}

/// Classify an HTTP status code.
///
/// 429 and the 502/503/504 gateway family are retryable; every other
/// non-2xx status is fatal.
pub fn classify(status: u16) -> Classification {
    match status {
        200..=299 => Classification::Success,
        429 | 502 | 503 | 504 => Classification::Retryable,
        _ => Classification::Fatal,
    }
}
