//! Error types for strata-form.

use strata_state::PathError;
use thiserror::Error;

/// Boxed error returned by schema engines and submit handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for validation operations.
pub type FormResult<T> = Result<T, FormError>;

/// Errors raised while running a validation pass.
///
/// The form engine never surfaces these to its callers: a failed pass is
/// logged and committed as an empty error set.
#[derive(Debug, Error)]
pub enum FormError {
    /// No adapter is registered for the schema's kind.
    #[error("no validator registered for kind {kind:?}")]
    UnknownValidator {
        /// The schema kind that was looked up.
        kind: String,
    },

    /// An adapter was handed a schema of a different kind.
    #[error("validator {adapter:?} cannot handle a {found:?} schema")]
    SchemaMismatch {
        /// Kind the adapter handles.
        adapter: &'static str,
        /// Kind of the schema it received.
        found: String,
    },

    /// The schema engine itself failed (as opposed to reporting issues).
    #[error("schema engine failed: {0}")]
    Schema(#[source] BoxError),

    /// An adapter or user rule panicked.
    #[error("validator panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },

    /// A path produced during normalization could not be written.
    #[error(transparent)]
    Path(#[from] PathError),
}

impl FormError {
    #[inline]
    pub(crate) fn mismatch(adapter: &'static str, found: &str) -> Self {
        FormError::SchemaMismatch {
            adapter,
            found: found.to_owned(),
        }
    }

    #[inline]
    pub(crate) fn schema(err: impl Into<BoxError>) -> Self {
        FormError::Schema(err.into())
    }

    pub(crate) fn panicked(payload: Box<dyn std::any::Any + Send>) -> Self {
        FormError::Panicked {
            message: panic_message(payload.as_ref()),
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Misuse of the field-array helper. Each variant is also logged as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldArrayError {
    /// The field does not hold an array.
    #[error("Field \"{field}\" is not an array")]
    NotAnArray {
        /// Field path as given by the caller.
        field: String,
    },

    /// The index is outside the accepted range for the operation.
    #[error("Index {index} out of bounds for field \"{field}\"")]
    OutOfBounds {
        /// Field path as given by the caller.
        field: String,
        /// The rejected index, verbatim.
        index: i64,
    },

    /// `pop` was called on an empty array.
    #[error("Field \"{field}\" is an empty array")]
    Empty {
        /// Field path as given by the caller.
        field: String,
    },
}
