//! HTTP Range request parsing module
//!
//! Single `bytes=<start>-<end>?` ranges only. Suffix ranges (`bytes=-500`)
//! do not match the grammar and are reported as malformed, leaving the
//! fallback decision to the caller. Of a multi-range header only the first
//! range is honoured.

/// Satisfiable byte range, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a file of `file_size` bytes
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Range lies within the file
    Valid(ByteRange),
    /// Range parsed but falls outside the file - respond 416
    NotSatisfiable,
    /// Header does not match `bytes=<start>-<end>?`
    Malformed,
}

/// Split `value` after its leading ASCII digits
fn split_digits(value: &str) -> (&str, &str) {
    let len = value.bytes().take_while(u8::is_ascii_digit).count();
    value.split_at(len)
}

/// Locate the first `bytes=<digits>-<digits>?` in `header`
///
/// Returns the start digits and, when present, the end digits.
fn find_range(header: &str) -> Option<(&str, Option<&str>)> {
    header.match_indices("bytes=").find_map(|(at, unit)| {
        let (start, rest) = split_digits(&header[at + unit.len()..]);
        if start.is_empty() {
            return None;
        }
        let (end, _) = split_digits(rest.strip_prefix('-')?);
        Some((start, (!end.is_empty()).then_some(end)))
    })
}

/// Parse a `Range` header value against a file of `file_size` bytes
///
/// An absent end means "to the end of the file". Ranges whose end precedes
/// the start or reaches past the last byte are not satisfiable; nothing is
/// clamped.
///
/// # Examples
/// ```
/// use switchyard::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header("bytes=10-19", 100);
/// assert_eq!(result, RangeParseResult::Valid(ByteRange { start: 10, end: 19 }));
///
/// assert_eq!(parse_range_header("bytes=200-210", 100), RangeParseResult::NotSatisfiable);
/// assert_eq!(parse_range_header("items=0-1", 100), RangeParseResult::Malformed);
/// ```
pub fn parse_range_header(header: &str, file_size: u64) -> RangeParseResult {
    let Some((start, end)) = find_range(header) else {
        return RangeParseResult::Malformed;
    };

    // Digits that overflow u64 can never address a real file
    let Ok(start) = start.parse::<u64>() else {
        return RangeParseResult::NotSatisfiable;
    };

    let end = match end {
        Some(digits) => match digits.parse::<u64>() {
            Ok(end) => end,
            Err(_) => return RangeParseResult::NotSatisfiable,
        },
        None => match file_size.checked_sub(1) {
            Some(last) => last,
            None => return RangeParseResult::NotSatisfiable,
        },
    };

    if end < start || end >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange { start, end })
}
