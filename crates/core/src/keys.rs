//! Storage key resolution for per-user namespaces.
//!
//! Every object lives at `{user_id}/{file_name}`. Neither segment may contain
//! the separator, be a relative path segment, or start or end with whitespace.
//! The backend trims whitespace around paths, so padded segments would alias
//! another user's objects. Each key has exactly two segments and user
//! prefixes never overlap.

use std::fmt;

use thiserror::Error;

/// Separator between the user namespace and the file name.
pub const SEPARATOR: char = '/';

/// Key validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// A required segment was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending input.
        field: &'static str,
    },

    /// A segment contained the namespace separator.
    #[error("{field} must not contain '/': {value}")]
    ContainsSeparator {
        /// Name of the offending input.
        field: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A segment started or ended with whitespace.
    #[error("{field} must not start or end with whitespace: {value:?}")]
    SurroundingWhitespace {
        /// Name of the offending input.
        field: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A precomposed key had an empty segment (leading, trailing or doubled `/`).
    #[error("key must not contain empty segments: {value}")]
    EmptySegment {
        /// Rejected value.
        value: String,
    },

    /// A segment was `.` or `..`.
    #[error("{field} must not be a relative path segment: {value}")]
    RelativeSegment {
        /// Name of the offending input.
        field: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Fully composed object key, `{user_id}/{file_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    /// Wraps a key produced by the backend or supplied by a caller as-is.
    #[must_use]
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the owned key string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the part after the last separator.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit_once(SEPARATOR)
            .map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}

/// Resolve the storage key for a user's file.
///
/// The result is exactly `user_id + "/" + file_name`.
pub fn resolve_key(user_id: &str, file_name: &str) -> Result<StorageKey, KeyError> {
    validate_segment("user id", user_id)?;
    validate_segment("file name", file_name)?;
    Ok(StorageKey(format!("{user_id}{SEPARATOR}{file_name}")))
}

/// Resolve the namespace prefix for a user, `user_id + "/"`.
pub fn resolve_prefix(user_id: &str) -> Result<String, KeyError> {
    validate_segment("user id", user_id)?;
    Ok(format!("{user_id}{SEPARATOR}"))
}

fn validate_segment(field: &'static str, value: &str) -> Result<(), KeyError> {
    if value.is_empty() {
        return Err(KeyError::Empty { field });
    }
    if value.contains(SEPARATOR) {
        return Err(KeyError::ContainsSeparator {
            field,
            value: value.to_string(),
        });
    }
    if value.trim() != value {
        return Err(KeyError::SurroundingWhitespace {
            field,
            value: value.to_string(),
        });
    }
    if value == "." || value == ".." {
        return Err(KeyError::RelativeSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Check that a precomposed key reaches exactly the object it names.
///
/// Rejects keys the backend would rewrite: a leading separator, empty
/// segments, or whitespace around the whole key.
pub fn validate_raw_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty { field: "key" });
    }
    if key.trim() != key {
        return Err(KeyError::SurroundingWhitespace {
            field: "key",
            value: key.to_string(),
        });
    }
    if key.split(SEPARATOR).any(str::is_empty) {
        return Err(KeyError::EmptySegment {
            value: key.to_string(),
        });
    }
    Ok(())
}
