//! Named validator adapters.

use super::{
    AssertAdapter, CollectAdapter, CustomAdapter, DetailAdapter, SafeParseAdapter, Schema,
    ValidatorAdapter,
};
use crate::error::{FormError, FormResult};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use strata_state::FormValue;

const DEFAULT_VALIDATORS: [&str; 5] = ["collect", "detail", "safe_parse", "assert", "custom"];

/// Map from schema kind to the adapter that validates it.
///
/// Each form owns (or shares through `Arc`) its own registry; there is no
/// global instance.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn ValidatorAdapter>>,
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl ValidatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the five default adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("collect", CollectAdapter);
        registry.register("detail", DetailAdapter);
        registry.register("safe_parse", SafeParseAdapter);
        registry.register("assert", AssertAdapter);
        registry.register("custom", CustomAdapter);
        registry
    }

    /// Register `adapter` under `name`, replacing any previous adapter.
    pub fn register(&mut self, name: impl Into<String>, adapter: impl ValidatorAdapter + 'static) {
        self.register_arc(name, Arc::new(adapter));
    }

    pub fn register_arc(&mut self, name: impl Into<String>, adapter: Arc<dyn ValidatorAdapter>) {
        let name = name.into();
        if self.validators.insert(name.clone(), adapter).is_some() {
            tracing::debug!(validator = %name, "replaced validator");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ValidatorAdapter>> {
        self.validators.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn ValidatorAdapter>> {
        self.validators.remove(name)
    }

    pub fn clear(&mut self) {
        self.validators.clear();
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.validators.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `name` is one of the built-in adapter names.
    pub fn is_default(name: &str) -> bool {
        DEFAULT_VALIDATORS.contains(&name)
    }

    /// Run the adapter registered for `schema.kind()`.
    ///
    /// Panics raised by the adapter or by user rules are caught and returned
    /// as [`FormError::Panicked`].
    pub async fn run(&self, values: &FormValue, schema: &Schema) -> FormResult<FormValue> {
        let kind = schema.kind();
        let adapter = self.get(kind).ok_or_else(|| FormError::UnknownValidator {
            kind: kind.to_owned(),
        })?;
        AssertUnwindSafe(adapter.validate(values, schema))
            .catch_unwind()
            .await
            .map_err(FormError::panicked)?
    }
}
