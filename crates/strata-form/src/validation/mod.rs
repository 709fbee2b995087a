//! Schema validation.
//!
//! A [`Schema`] names which engine validates the form; a
//! [`ValidatorAdapter`] registered under the schema's kind runs it and
//! normalizes the engine's failures into a nested error object shaped like the
//! form values. Adapters never decide *whether* to run; the form does.

mod assert;
mod collect;
mod custom;
mod detail;
mod registry;
mod safe_parse;

pub use assert::{AssertAdapter, AssertError, AssertSchema, StructFailure};
pub use collect::{CollectAdapter, CollectError, CollectIssue, CollectSchema, Message};
pub use custom::{CustomAdapter, CustomSchema, FormRule, Rule, RuleEntry, RuleMap};
pub use detail::{DetailAdapter, DetailError, DetailSchema, ErrorDetail};
pub use registry::ValidatorRegistry;
pub use safe_parse::{ParseIssue, ParseOutcome, SafeParseAdapter, SafeParseSchema};

use crate::error::FormResult;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use strata_state::{assign, FieldPath, FormValue, PathKey, PathResult};

/// Normalizes one engine's failures into the nested error shape.
#[async_trait]
pub trait ValidatorAdapter: Send + Sync {
    /// Validate `values` against `schema`, returning an error object (`{}`
    /// when valid).
    async fn validate(&self, values: &FormValue, schema: &Schema) -> FormResult<FormValue>;
}

/// A schema source, tagged by the engine that understands it.
#[derive(Clone)]
pub enum Schema {
    /// Async "collect every error" engine.
    Collect(Arc<dyn CollectSchema>),
    /// Engine reporting label/message details.
    Detail(Arc<dyn DetailSchema>),
    /// Engine with a non-throwing parse returning issues.
    SafeParse(Arc<dyn SafeParseSchema>),
    /// Assertion-based structural engine.
    Assert(Arc<dyn AssertSchema>),
    /// Whole-form function or per-field rule map.
    Custom(CustomSchema),
    /// User-defined engine, dispatched to the adapter registered as `kind`.
    Extension {
        kind: String,
        schema: Arc<dyn Any + Send + Sync>,
    },
}

impl Schema {
    pub fn collect(schema: impl CollectSchema + 'static) -> Self {
        Schema::Collect(Arc::new(schema))
    }

    pub fn detail(schema: impl DetailSchema + 'static) -> Self {
        Schema::Detail(Arc::new(schema))
    }

    pub fn safe_parse(schema: impl SafeParseSchema + 'static) -> Self {
        Schema::SafeParse(Arc::new(schema))
    }

    pub fn assert(schema: impl AssertSchema + 'static) -> Self {
        Schema::Assert(Arc::new(schema))
    }

    pub fn extension(kind: impl Into<String>, schema: impl Any + Send + Sync) -> Self {
        Schema::Extension {
            kind: kind.into(),
            schema: Arc::new(schema),
        }
    }

    /// Registry name of the adapter that handles this schema.
    pub fn kind(&self) -> &str {
        match self {
            Schema::Collect(_) => "collect",
            Schema::Detail(_) => "detail",
            Schema::SafeParse(_) => "safe_parse",
            Schema::Assert(_) => "assert",
            Schema::Custom(_) => "custom",
            Schema::Extension { kind, .. } => kind,
        }
    }

    /// Borrow an extension schema as its concrete type.
    pub fn downcast_extension<T: Any>(&self) -> Option<&T> {
        match self {
            Schema::Extension { schema, .. } => schema.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<CustomSchema> for Schema {
    fn from(schema: CustomSchema) -> Self {
        Schema::Custom(schema)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("kind", &self.kind()).finish()
    }
}

/// Write one normalized issue into `errors`, skipping (with a warning) issues
/// whose path cannot be addressed.
pub(crate) fn record_error(errors: &mut FormValue, path: &str, message: FormValue) {
    record(errors, FieldPath::parse(path), path, message);
}

/// Same as [`record_error`] for engines that report paths as key lists.
pub(crate) fn record_error_at(errors: &mut FormValue, keys: &[PathKey], message: FormValue) {
    let display = strata_state::construct_path(keys);
    record(errors, FieldPath::from_keys(keys), &display, message);
}

fn record(errors: &mut FormValue, path: PathResult<FieldPath>, raw: &str, message: FormValue) {
    let written = path.and_then(|p| assign(errors, &p, message));
    if let Err(e) = written {
        tracing::warn!(path = raw, error = %e, "skipping validation issue");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_state::field_path;

    #[test]
    fn test_record_error_nests() {
        let mut errors = FormValue::object();
        record_error(&mut errors, "address.city", "Required".into());
        record_error_at(&mut errors, &field_path!("contacts", 1, "code"), "Bad".into());
        assert_eq!(
            errors,
            json!({"address": {"city": "Required"}, "contacts": [null, {"code": "Bad"}]})
        );
    }

    #[test]
    fn test_record_error_skips_bad_paths() {
        let mut errors = FormValue::object();
        record_error(&mut errors, "", "root".into());
        record_error(&mut errors, "a[-1]", "neg".into());
        record_error_at(&mut errors, &[], "empty".into());
        assert_eq!(errors, json!({}));
    }

    #[test]
    fn test_schema_kind() {
        assert_eq!(Schema::from(CustomSchema::rules(RuleMap::new())).kind(), "custom");
        let ext = Schema::extension("regex", String::from("^a"));
        assert_eq!(ext.kind(), "regex");
        assert_eq!(ext.downcast_extension::<String>().map(String::as_str), Some("^a"));
        assert!(ext.downcast_extension::<u32>().is_none());
    }
}
