//! Stop identifier type.

use std::fmt;

/// Maximum accepted length of a stop identifier.
const MAX_LEN: usize = 64;

/// Error returned when parsing an invalid stop identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// Identifier of a single boarding point.
///
/// Stop ids are opaque to us, but they end up in upstream URLs and cache
/// keys, so only a conservative character set is accepted: ASCII letters,
/// digits and `-`, `_`, `.`, `:`.
///
/// # Examples
///
/// ```
/// use kiosk_server::domain::StopId;
///
/// let stop = StopId::parse("1234").unwrap();
/// assert_eq!(stop.as_str(), "1234");
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("12 34").is_err());
/// assert!(StopId::parse("../etc").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        if s.is_empty() {
            return Err(InvalidStopId {
                reason: "must not be empty",
            });
        }

        if s.len() > MAX_LEN {
            return Err(InvalidStopId {
                reason: "must be at most 64 characters",
            });
        }

        if !s.bytes().all(is_stop_id_byte) {
            return Err(InvalidStopId {
                reason: "must contain only ASCII letters, digits, '-', '_', '.', ':'",
            });
        }

        // A bare dot sequence would be a path component, not an id.
        if s.bytes().all(|b| b == b'.') {
            return Err(InvalidStopId {
                reason: "must not consist only of dots",
            });
        }

        Ok(StopId(s.to_string()))
    }

    /// Returns the stop id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_stop_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':')
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Roundtrip: parse then as_str returns the original
        #[test]
        fn roundtrip(s in "[A-Za-z0-9_:-][A-Za-z0-9_.:-]{0,63}") {
            let stop = StopId::parse(&s).unwrap();
            prop_assert_eq!(stop.as_str(), s.as_str());
        }

        /// Whitespace anywhere is rejected
        #[test]
        fn whitespace_rejected(a in "[a-z0-9]{0,10}", b in "[a-z0-9]{0,10}") {
            let s = format!("{a} {b}");
            prop_assert!(StopId::parse(&s).is_err());
        }
    }
}
