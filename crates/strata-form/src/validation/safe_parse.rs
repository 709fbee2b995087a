//! Adapter for engines with a non-throwing parse.

use super::{record_error_at, Schema, ValidatorAdapter};
use crate::error::{FormError, FormResult};
use async_trait::async_trait;
use strata_state::{FormValue, PathKey};

pub trait SafeParseSchema: Send + Sync {
    fn safe_parse(&self, values: &FormValue) -> ParseOutcome;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Success,
    Failure(Vec<ParseIssue>),
}

/// A parse issue located by a key list such as `["contacts", 0, "code"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseIssue {
    pub path: Vec<PathKey>,
    pub message: String,
}

impl ParseIssue {
    pub fn new(path: Vec<PathKey>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Default adapter registered as `"safe_parse"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeParseAdapter;

#[async_trait]
impl ValidatorAdapter for SafeParseAdapter {
    async fn validate(&self, values: &FormValue, schema: &Schema) -> FormResult<FormValue> {
        let Schema::SafeParse(engine) = schema else {
            return Err(FormError::mismatch("safe_parse", schema.kind()));
        };
        let mut errors = FormValue::object();
        if let ParseOutcome::Failure(issues) = engine.safe_parse(values) {
            for issue in issues {
                record_error_at(&mut errors, &issue.path, FormValue::String(issue.message));
            }
        }
        Ok(errors)
    }
}
