//! Partition key extraction from request URIs.

use std::num::IntErrorKind;

use regex::Regex;

use crate::error::{PartitionError, Result};

/// Pulls a numeric partition key out of a URI with a configured pattern.
///
/// The pattern must contain at least one capture group; the first group of
/// the first match is the key. The pattern is applied to the whole URI text,
/// so it can target either the path or the query string.
///
/// # Example
///
/// ```rust
/// use corelib::partition::KeyExtractor;
///
/// let extractor = KeyExtractor::new(r"\bid\b=(\d+)").unwrap();
/// assert_eq!(extractor.extract("/profiles?wid=99&id=176").unwrap(), 176);
/// ```
#[derive(Clone, Debug)]
pub struct KeyExtractor {
    pattern: Regex,
}

impl KeyExtractor {
    /// Compile the pattern, failing if it is invalid or captures nothing.
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|err| PartitionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;
        // captures_len counts the implicit whole-match group.
        if compiled.captures_len() < 2 {
            return Err(PartitionError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern has no capture group".to_string(),
            });
        }
        Ok(Self { pattern: compiled })
    }

    /// The source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Extract the non-negative key from `uri`.
    ///
    /// # Errors
    ///
    /// - `KeyNotFound` if the pattern does not match (or its group is empty)
    /// - `KeyOutOfRange` if the digits overflow a 64-bit key
    /// - `MalformedKey` if the captured text is not a non-negative integer
    pub fn extract(&self, uri: &str) -> Result<i64> {
        let not_found = || PartitionError::KeyNotFound { uri: uri.to_string() };
        let captures = self.pattern.captures(uri).ok_or_else(not_found)?;
        let text = captures.get(1).map(|m| m.as_str()).ok_or_else(not_found)?;

        let key = parse_key(text)?;
        if key < 0 {
            return Err(PartitionError::MalformedKey { text: text.to_string() });
        }
        Ok(key)
    }
}

/// Parse a decimal key. Overflow is reported, never wrapped or truncated.
pub fn parse_key(text: &str) -> Result<i64> {
    text.trim().parse::<i64>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => PartitionError::KeyOutOfRange { text: text.to_string() },
        _ => PartitionError::MalformedKey { text: text.to_string() },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID_PATTERN: &str = r"\bid\b=(\d+)";

    #[test]
    fn test_extract_first_match() {
        let extractor = KeyExtractor::new(ID_PATTERN).unwrap();
        assert_eq!(extractor.extract("/profiles?field=position&id=100").unwrap(), 100);
        assert_eq!(extractor.extract("/profiles?wid=99&id=176&randid=301").unwrap(), 176);
    }

    #[test]
    fn test_extract_no_match() {
        let extractor = KeyExtractor::new(ID_PATTERN).unwrap();
        assert_eq!(
            extractor.extract("/profiles?wid=99"),
            Err(PartitionError::KeyNotFound { uri: "/profiles?wid=99".to_string() })
        );
    }

    #[test]
    fn test_extract_overflow_is_an_error() {
        let extractor = KeyExtractor::new(ID_PATTERN).unwrap();
        let uri = "/profiles?id=1000000000000000000000000000000000000000000000111111111";
        assert!(matches!(extractor.extract(uri), Err(PartitionError::KeyOutOfRange { .. })));
    }

    #[test]
    fn test_extract_negative_key_rejected() {
        let extractor = KeyExtractor::new(r"id=(-?\d+)").unwrap();
        assert!(matches!(extractor.extract("/p?id=-5"), Err(PartitionError::MalformedKey { .. })));
    }

    #[test]
    fn test_pattern_without_group_rejected() {
        assert!(matches!(KeyExtractor::new(r"id=\d+"), Err(PartitionError::InvalidPattern { .. })));
        assert!(matches!(KeyExtractor::new(r"id=(\d+"), Err(PartitionError::InvalidPattern { .. })));
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("833").unwrap(), 833);
        assert_eq!(parse_key("-1").unwrap(), -1);
        assert!(matches!(parse_key("12a"), Err(PartitionError::MalformedKey { .. })));
        assert!(matches!(parse_key(""), Err(PartitionError::MalformedKey { .. })));
        assert!(matches!(parse_key("99999999999999999999"), Err(PartitionError::KeyOutOfRange { .. })));
    }
}
