//! Error types for strata-state operations.

use thiserror::Error;

/// Result type alias for strata-state operations.
pub type PathResult<T> = Result<T, PathError>;

/// Errors raised while parsing a field path or writing through one.
///
/// Reads never produce these: a path that cannot be resolved simply yields
/// `None`. Writers return them so the caller can decide whether to log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string (or key list) was empty.
    #[error("path cannot be empty")]
    Empty,

    /// A dot-delimited piece has no property name before its indices.
    #[error("invalid path segment {segment:?}: missing key")]
    EmptyKey {
        /// The offending segment.
        segment: String,
    },

    /// An index token is not a base-10 non-negative integer.
    #[error("invalid array index {token:?} in segment {segment:?}")]
    InvalidIndex {
        /// The offending segment.
        segment: String,
        /// The text found between the brackets.
        token: String,
    },

    /// An index token is a negative integer.
    #[error("negative array index {token} in segment {segment:?}")]
    NegativeIndex {
        /// The offending segment.
        segment: String,
        /// The text found between the brackets.
        token: String,
    },

    /// Brackets are unbalanced or followed by stray text.
    #[error("malformed brackets in segment {segment:?}")]
    MalformedBrackets {
        /// The offending segment.
        segment: String,
    },

    /// The root handed to a writer is not a container.
    #[error("target must be an object or array, found {found}")]
    InvalidTarget {
        /// Type name of the value that was found.
        found: &'static str,
    },

    /// A write addresses an array slot beyond [`MAX_INDEX`](crate::MAX_INDEX).
    #[error("array index {index} exceeds the maximum of {max}")]
    IndexTooLarge {
        /// The requested index.
        index: usize,
        /// The largest index a write may address.
        max: usize,
    },

    /// The live root is frozen and cannot absorb the update.
    #[error("cannot assign {path:?} into a frozen object")]
    FrozenTarget {
        /// The path that was being written.
        path: String,
    },
}

impl PathError {
    #[inline]
    pub(crate) fn empty_key(segment: &str) -> Self {
        PathError::EmptyKey {
            segment: segment.to_owned(),
        }
    }

    #[inline]
    pub(crate) fn invalid_index(segment: &str, token: &str) -> Self {
        PathError::InvalidIndex {
            segment: segment.to_owned(),
            token: token.to_owned(),
        }
    }

    #[inline]
    pub(crate) fn negative_index(segment: &str, token: &str) -> Self {
        PathError::NegativeIndex {
            segment: segment.to_owned(),
            token: token.to_owned(),
        }
    }

    #[inline]
    pub(crate) fn malformed_brackets(segment: &str) -> Self {
        PathError::MalformedBrackets {
            segment: segment.to_owned(),
        }
    }

    #[inline]
    pub(crate) fn invalid_target(found: &'static str) -> Self {
        PathError::InvalidTarget { found }
    }

    #[inline]
    pub(crate) fn index_too_large(index: usize) -> Self {
        PathError::IndexTooLarge {
            index,
            max: crate::MAX_INDEX,
        }
    }

    /// Returns true if the error comes from the path text itself rather than
    /// from the value being written.
    pub fn is_syntax_error(&self) -> bool {
        !matches!(
            self,
            PathError::InvalidTarget { .. }
                | PathError::IndexTooLarge { .. }
                | PathError::FrozenTarget { .. }
        )
    }
}
