//! Adapter for assertion-based structural engines.

use super::{record_error_at, Schema, ValidatorAdapter};
use crate::error::{BoxError, FormError, FormResult};
use async_trait::async_trait;
use strata_state::{FormValue, PathKey};

pub trait AssertSchema: Send + Sync {
    fn assert(&self, values: &FormValue) -> Result<(), AssertError>;
}

#[derive(Debug)]
pub enum AssertError {
    /// Structural failures, one per offending location.
    Failures(Vec<StructFailure>),
    /// Any other error raised by the assertion. Not treated as a validation
    /// result.
    Other(BoxError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructFailure {
    pub path: Vec<PathKey>,
    pub message: String,
}

impl StructFailure {
    pub fn new(path: Vec<PathKey>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Default adapter registered as `"assert"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssertAdapter;

#[async_trait]
impl ValidatorAdapter for AssertAdapter {
    async fn validate(&self, values: &FormValue, schema: &Schema) -> FormResult<FormValue> {
        let Schema::Assert(engine) = schema else {
            return Err(FormError::mismatch("assert", schema.kind()));
        };
        let mut errors = FormValue::object();
        match engine.assert(values) {
            Ok(()) => {}
            Err(AssertError::Failures(failures)) => {
                for failure in failures {
                    record_error_at(&mut errors, &failure.path, FormValue::String(failure.message));
                }
            }
            Err(AssertError::Other(e)) => {
                tracing::debug!(error = %e, "ignoring non-structural assertion error");
            }
        }
        Ok(errors)
    }
}
