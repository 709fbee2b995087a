//! Adapter for engines reporting label/message detail lists.

use super::{record_error, Schema, ValidatorAdapter};
use crate::error::{FormError, FormResult};
use async_trait::async_trait;
use strata_state::FormValue;

/// A synchronous engine validating with early abort disabled.
pub trait DetailSchema: Send + Sync {
    fn validate(&self, values: &FormValue) -> Result<(), DetailError>;
}

/// Failure details; `label` is the dotted path of the failing field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailError {
    pub details: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetail {
    pub label: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
        }
    }
}

/// Default adapter registered as `"detail"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailAdapter;

#[async_trait]
impl ValidatorAdapter for DetailAdapter {
    async fn validate(&self, values: &FormValue, schema: &Schema) -> FormResult<FormValue> {
        let Schema::Detail(engine) = schema else {
            return Err(FormError::mismatch("detail", schema.kind()));
        };
        let mut errors = FormValue::object();
        if let Err(failure) = engine.validate(values) {
            for detail in failure.details {
                record_error(&mut errors, &detail.label, FormValue::String(detail.message));
            }
        }
        Ok(errors)
    }
}
