//! Behavioral configuration and construction options.

use crate::form::SubmitHandler;
use crate::validation::{
    AssertSchema, CollectSchema, CustomSchema, DetailSchema, SafeParseSchema, Schema,
    ValidatorRegistry,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use strata_state::FormValue;

/// When validation runs and how submit events are treated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Validate once when the form is created.
    pub validate_on_mount: bool,
    /// Validate after every values mutation.
    pub validate_on_change: bool,
    /// Validate when a field loses focus.
    pub validate_on_blur: bool,
    /// Coalesce change-triggered validation within this window. `0` disables.
    pub validation_debounce_ms: u64,
    /// Call `prevent_default` on submit events.
    pub prevent_default: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            validate_on_mount: true,
            validate_on_change: true,
            validate_on_blur: true,
            validation_debounce_ms: 0,
            prevent_default: true,
        }
    }
}

impl FormConfig {
    /// Debounce window as a `Duration`.
    pub fn validation_debounce(&self) -> Duration {
        Duration::from_millis(self.validation_debounce_ms)
    }
}

/// Everything needed to create a [`Form`](crate::Form).
///
/// When several schema sources are set, the first of collect, detail,
/// safe-parse, assert, custom and extension wins.
#[derive(Clone, Default)]
pub struct FormOptions {
    pub initial_values: FormValue,
    pub initial_errors: FormValue,
    pub initial_touched: FormValue,
    pub collect_schema: Option<Arc<dyn CollectSchema>>,
    pub detail_schema: Option<Arc<dyn DetailSchema>>,
    pub safe_parse_schema: Option<Arc<dyn SafeParseSchema>>,
    pub assert_schema: Option<Arc<dyn AssertSchema>>,
    pub validation_schema: Option<CustomSchema>,
    pub extension_schema: Option<(String, Arc<dyn Any + Send + Sync>)>,
    pub on_submit: Option<SubmitHandler>,
    /// Adapter registry. Defaults to [`ValidatorRegistry::with_defaults`].
    pub registry: Option<Arc<ValidatorRegistry>>,
    pub config: FormConfig,
}

impl std::fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormOptions")
            .field("initial_values", &self.initial_values)
            .field("schema", &self.resolve_schema().map(|s| s.kind().to_owned()))
            .field("has_on_submit", &self.on_submit.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FormOptions {
    /// Options with the given initial values and default configuration.
    pub fn new(initial_values: impl Into<FormValue>) -> Self {
        Self {
            initial_values: initial_values.into(),
            ..Default::default()
        }
    }

    /// Set a schema source, routed to the matching field by variant.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        match schema {
            Schema::Collect(s) => self.collect_schema = Some(s),
            Schema::Detail(s) => self.detail_schema = Some(s),
            Schema::SafeParse(s) => self.safe_parse_schema = Some(s),
            Schema::Assert(s) => self.assert_schema = Some(s),
            Schema::Custom(s) => self.validation_schema = Some(s),
            Schema::Extension { kind, schema } => self.extension_schema = Some((kind, schema)),
        }
        self
    }

    #[must_use]
    pub fn with_validation_schema(mut self, schema: CustomSchema) -> Self {
        self.validation_schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_on_submit(mut self, handler: SubmitHandler) -> Self {
        self.on_submit = Some(handler);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ValidatorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_initial_errors(mut self, errors: impl Into<FormValue>) -> Self {
        self.initial_errors = errors.into();
        self
    }

    #[must_use]
    pub fn with_initial_touched(mut self, touched: impl Into<FormValue>) -> Self {
        self.initial_touched = touched.into();
        self
    }

    #[must_use]
    pub fn with_validate_on_mount(mut self, enabled: bool) -> Self {
        self.config.validate_on_mount = enabled;
        self
    }

    #[must_use]
    pub fn with_validate_on_change(mut self, enabled: bool) -> Self {
        self.config.validate_on_change = enabled;
        self
    }

    #[must_use]
    pub fn with_validate_on_blur(mut self, enabled: bool) -> Self {
        self.config.validate_on_blur = enabled;
        self
    }

    #[must_use]
    pub fn with_validation_debounce(mut self, debounce: Duration) -> Self {
        self.config.validation_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_prevent_default(mut self, enabled: bool) -> Self {
        self.config.prevent_default = enabled;
        self
    }

    /// The active schema source, by precedence.
    pub fn resolve_schema(&self) -> Option<Schema> {
        if let Some(s) = &self.collect_schema {
            return Some(Schema::Collect(Arc::clone(s)));
        }
        if let Some(s) = &self.detail_schema {
            return Some(Schema::Detail(Arc::clone(s)));
        }
        if let Some(s) = &self.safe_parse_schema {
            return Some(Schema::SafeParse(Arc::clone(s)));
        }
        if let Some(s) = &self.assert_schema {
            return Some(Schema::Assert(Arc::clone(s)));
        }
        if let Some(s) = &self.validation_schema {
            return Some(Schema::Custom(s.clone()));
        }
        self.extension_schema
            .as_ref()
            .map(|(kind, schema)| Schema::Extension {
                kind: kind.clone(),
                schema: Arc::clone(schema),
            })
    }
}
