//! Adapter for async engines that collect every failure in one pass.

use super::{record_error, Schema, ValidatorAdapter};
use crate::error::{BoxError, FormError, FormResult};
use async_trait::async_trait;
use strata_state::FormValue;

/// An engine that validates the whole form without stopping at the first
/// failure.
#[async_trait]
pub trait CollectSchema: Send + Sync {
    async fn validate_all(&self, values: &FormValue) -> Result<(), CollectError>;
}

/// Why a collect pass did not succeed.
#[derive(Debug)]
pub enum CollectError {
    /// The values were rejected; one entry per failing field.
    Rejected(Vec<CollectIssue>),
    /// The engine failed for reasons unrelated to the values.
    Fault(BoxError),
}

/// One failing field, addressed by a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectIssue {
    pub path: String,
    pub message: Message,
}

impl CollectIssue {
    pub fn new(path: impl Into<String>, message: impl Into<Message>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A single message, or one per array item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::One(s.to_owned())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::One(s)
    }
}

impl From<Vec<String>> for Message {
    fn from(v: Vec<String>) -> Self {
        Message::Many(v)
    }
}

impl From<Message> for FormValue {
    fn from(message: Message) -> Self {
        match message {
            Message::One(s) => FormValue::String(s),
            Message::Many(v) => FormValue::from(v.into_iter().map(FormValue::String).collect::<Vec<_>>()),
        }
    }
}

/// Default adapter registered as `"collect"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectAdapter;

#[async_trait]
impl ValidatorAdapter for CollectAdapter {
    async fn validate(&self, values: &FormValue, schema: &Schema) -> FormResult<FormValue> {
        let Schema::Collect(engine) = schema else {
            return Err(FormError::mismatch("collect", schema.kind()));
        };
        let mut errors = FormValue::object();
        match engine.validate_all(values).await {
            Ok(()) => {}
            Err(CollectError::Rejected(issues)) => {
                for issue in issues {
                    record_error(&mut errors, &issue.path, issue.message.into());
                }
            }
            Err(CollectError::Fault(e)) => return Err(FormError::schema(e)),
        }
        Ok(errors)
    }
}
