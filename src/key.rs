//! Path segment validation

use crate::error::Error;

/// Separates segments of a dependency path
pub const DELIMITER: char = '.';

/// Segments that can not be used as a dependency or namespace name
pub const RESERVED: &[&str] = &["self", "super"];

/// Validates single path segments and dotted paths.
///
/// A valid segment is a non-empty ASCII string made of letters, digits,
/// `_` and `-` that is not one of the [`RESERVED`] tokens.
pub struct KeyGuard;

impl KeyGuard {
    /// Validates a single path segment
    pub fn validate(segment: &str) -> Result<&str, Error> {
        if segment.is_empty() {
            return Err(Self::invalid(segment, "key can not be empty"));
        }
        if segment.contains(DELIMITER) {
            return Err(Self::invalid(segment, "key can not contain the path delimiter"));
        }
        if !segment.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
            return Err(Self::invalid(segment, "only ASCII letters, digits, '_' and '-' are allowed"));
        }
        if RESERVED.contains(&segment) {
            return Err(Self::invalid(segment, "key is reserved"));
        }
        Ok(segment)
    }

    /// Splits a dotted path into validated segments
    pub fn split(path: &str) -> Result<Vec<&str>, Error> {
        if path.is_empty() {
            return Err(Self::invalid(path, "path can not be empty"));
        }
        path.split(DELIMITER)
            .map(|segment| Self::validate(segment).map_err(|err| match err {
                Error::InvalidKey { reason, .. } => Self::invalid(path, reason),
                other => other,
            }))
            .collect()
    }

    #[inline]
    fn invalid(key: &str, reason: &'static str) -> Error {
        Error::InvalidKey { key: key.into(), reason }
    }
}

/// Joins a namespace path and a child name
#[inline]
pub(crate) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}{DELIMITER}{name}")
    }
}
