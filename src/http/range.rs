//! HTTP Range request parsing module
//!
//! Parses `Range: bytes=...` headers into resolved byte intervals, following RFC 9110.
//! Every range-spec in the set is resolved against the concrete file length; whether
//! more than one range can actually be served is decided by the installed extractors.

use thiserror::Error;

/// The only range unit this parser understands
pub const BYTES_UNIT: &str = "bytes";

/// A resolved, inclusive byte interval `[start, end]` within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte position
    pub start: u64,
    /// Last byte position (inclusive), always `< length`
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A resolved range always covers at least one byte
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Why a Range header could not be turned into byte intervals
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// Header does not follow the `bytes=<range-spec>(,<range-spec>)*` grammar
    #[error("malformed range header: {0}")]
    Malformed(String),
    /// Syntactically valid but no byte of the file can satisfy it
    #[error("range not satisfiable for length {length}")]
    Unsatisfiable { length: u64 },
}

/// Parse an HTTP Range header value against a file of `length` bytes
///
/// Supported range-spec formats:
/// - `start-end` - Specific range (end clamped to the last byte)
/// - `start-` - From start to end of file
/// - `-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use fileman::http::range::{parse_range_header, ByteRange, RangeError};
///
/// let ranges = parse_range_header("bytes=0-99", 1000).unwrap();
/// assert_eq!(ranges, vec![ByteRange { start: 0, end: 99 }]);
///
/// let err = parse_range_header("bytes=5-2", 1000).unwrap_err();
/// assert_eq!(err, RangeError::Unsatisfiable { length: 1000 });
/// ```
pub fn parse_range_header(header: &str, length: u64) -> Result<Vec<ByteRange>, RangeError> {
    let malformed = || RangeError::Malformed(header.to_string());

    let (unit, set) = header.trim().split_once('=').ok_or_else(malformed)?;
    if !unit.trim().eq_ignore_ascii_case(BYTES_UNIT) {
        return Err(malformed());
    }

    let mut ranges = Vec::new();
    let mut specs = 0;
    // Empty list elements are tolerated ("bytes=0-1, ,4-5")
    for spec in set.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        specs += 1;
        let (start_str, end_str) = spec.split_once('-').ok_or_else(malformed)?;
        let (start_str, end_str) = (start_str.trim(), end_str.trim());

        let range = if start_str.is_empty() {
            let suffix = parse_position(end_str).ok_or_else(malformed)?;
            resolve_suffix_range(suffix, length)
        } else {
            let start = parse_position(start_str).ok_or_else(malformed)?;
            let end = if end_str.is_empty() {
                None
            } else {
                Some(parse_position(end_str).ok_or_else(malformed)?)
            };
            resolve_standard_range(start, end, length)
        };

        // An unsatisfiable member is dropped; the set fails only if nothing is left
        if let Ok(range) = range {
            ranges.push(range);
        }
    }

    if specs == 0 {
        return Err(malformed());
    }
    if ranges.is_empty() {
        return Err(RangeError::Unsatisfiable { length });
    }
    Ok(ranges)
}

/// Parse a `1*DIGIT` position; signs and whitespace inside are rejected
fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Number of range-specs the header names, satisfiable or not
///
/// ```
/// use fileman::http::range::count_range_specs;
///
/// assert_eq!(count_range_specs("bytes=0-1, ,100-200"), 2);
/// assert_eq!(count_range_specs("bytes=-5"), 1);
/// ```
pub fn count_range_specs(header: &str) -> usize {
    header
        .split_once('=')
        .map_or(0, |(_, set)| set.split(',').filter(|s| !s.trim().is_empty()).count())
}

/// Resolve suffix range (e.g., "-500")
fn resolve_suffix_range(suffix: u64, length: u64) -> Result<ByteRange, RangeError> {
    if suffix == 0 || length == 0 {
        return Err(RangeError::Unsatisfiable { length });
    }

    // Suffix larger than the file selects the whole file
    Ok(ByteRange {
        start: length.saturating_sub(suffix),
        end: length - 1,
    })
}

/// Resolve standard range (e.g., "0-99" or "100-")
fn resolve_standard_range(
    start: u64,
    end: Option<u64>,
    length: u64,
) -> Result<ByteRange, RangeError> {
    if end.is_some_and(|e| start > e) || start >= length {
        return Err(RangeError::Unsatisfiable { length });
    }

    let last = length - 1;
    Ok(ByteRange {
        start,
        end: end.map_or(last, |e| e.min(last)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(header: &str, length: u64) -> ByteRange {
        match parse_range_header(header, length) {
            Ok(ranges) if ranges.len() == 1 => ranges[0],
            other => panic!("Expected a single range for {header}, got {other:?}"),
        }
    }

    #[test]
    fn test_standard_range() {
        let r = single("bytes=0-9", 100);
        assert_eq!(r, ByteRange { start: 0, end: 9 });
        assert_eq!(r.len(), 10);
    }

    #[test]
    fn test_open_range() {
        let r = single("bytes=50-", 100);
        assert_eq!(r, ByteRange { start: 50, end: 99 });
        assert_eq!(r.len(), 50);
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(single("bytes=-20", 100), ByteRange { start: 80, end: 99 });
    }

    #[test]
    fn test_suffix_longer_than_file_selects_whole_file() {
        assert_eq!(single("bytes=-500", 100), ByteRange { start: 0, end: 99 });
        assert_eq!(single("bytes=-100", 100), ByteRange { start: 0, end: 99 });
    }

    #[test]
    fn test_end_clamped_to_last_byte() {
        assert_eq!(single("bytes=10-999", 50), ByteRange { start: 10, end: 49 });
    }

    #[test]
    fn test_start_after_end_not_satisfiable() {
        assert_eq!(
            parse_range_header("bytes=5-2", 100),
            Err(RangeError::Unsatisfiable { length: 100 })
        );
    }

    #[test]
    fn test_start_beyond_length_not_satisfiable() {
        assert_eq!(
            parse_range_header("bytes=100-200", 50),
            Err(RangeError::Unsatisfiable { length: 50 })
        );
        assert_eq!(
            parse_range_header("bytes=50-", 50),
            Err(RangeError::Unsatisfiable { length: 50 })
        );
    }

    #[test]
    fn test_empty_file_not_satisfiable() {
        assert_eq!(
            parse_range_header("bytes=-10", 0),
            Err(RangeError::Unsatisfiable { length: 0 })
        );
        assert_eq!(
            parse_range_header("bytes=0-", 0),
            Err(RangeError::Unsatisfiable { length: 0 })
        );
    }

    #[test]
    fn test_zero_suffix_not_satisfiable() {
        assert_eq!(
            parse_range_header("bytes=-0", 100),
            Err(RangeError::Unsatisfiable { length: 100 })
        );
    }

    #[test]
    fn test_invalid_format() {
        for header in [
            "bytes=a-b",
            "bytes=10",
            "bytes=",
            "bytes=-",
            "bytes=+1-5",
            "bytes=1-5-7",
            "items=0-9",
            "0-9",
        ] {
            assert!(
                matches!(parse_range_header(header, 100), Err(RangeError::Malformed(_))),
                "{header} should be malformed"
            );
        }
    }

    #[test]
    fn test_multiple_ranges_are_resolved() {
        let ranges = parse_range_header("bytes=0-9, 20-29,-5", 100).unwrap();
        assert_eq!(
            ranges,
            vec![
                ByteRange { start: 0, end: 9 },
                ByteRange { start: 20, end: 29 },
                ByteRange { start: 95, end: 99 },
            ]
        );
    }

    #[test]
    fn test_unsatisfiable_member_is_dropped_from_set() {
        assert_eq!(
            parse_range_header("bytes=0-1,100-200", 50).unwrap(),
            vec![ByteRange { start: 0, end: 1 }]
        );
        assert_eq!(
            parse_range_header("bytes=0-1,100-200,-5", 50).unwrap(),
            vec![ByteRange { start: 0, end: 1 }, ByteRange { start: 45, end: 49 }]
        );
        assert_eq!(
            parse_range_header("bytes=60-70,100-200", 50),
            Err(RangeError::Unsatisfiable { length: 50 })
        );
    }

    #[test]
    fn test_unit_is_case_insensitive() {
        assert_eq!(single("Bytes=1-2", 10), ByteRange { start: 1, end: 2 });
    }
}
