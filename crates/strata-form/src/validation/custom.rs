//! Free-form validation: a whole-form function or a map of per-field rules.

use super::{record_error, Schema, ValidatorAdapter};
use crate::error::{FormError, FormResult};
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use strata_state::{get_str, FormValue};

type RuleFn = dyn Fn(&FormValue, &FormValue) -> BoxFuture<'static, Option<FormValue>> + Send + Sync;
type FormRuleFn = dyn Fn(&FormValue) -> BoxFuture<'static, FormValue> + Send + Sync;

/// A per-field rule: `(field value, all values) -> error`.
///
/// `None`, null and undefined mean the field is valid; anything else is stored
/// as the field's error.
#[derive(Clone)]
pub struct Rule(Arc<RuleFn>);

impl Rule {
    /// A synchronous rule.
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(&FormValue, &FormValue) -> Option<FormValue> + Send + Sync + 'static,
    {
        let f: Arc<RuleFn> = Arc::new(
            move |value: &FormValue, values: &FormValue| -> BoxFuture<'static, Option<FormValue>> {
                future::ready(rule(value, values)).boxed()
            },
        );
        Self(f)
    }

    /// An asynchronous rule. Receives owned snapshots.
    pub fn future<F, Fut>(rule: F) -> Self
    where
        F: Fn(FormValue, FormValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<FormValue>> + Send + 'static,
    {
        let f: Arc<RuleFn> = Arc::new(
            move |value: &FormValue, values: &FormValue| -> BoxFuture<'static, Option<FormValue>> {
                rule(value.clone(), values.clone()).boxed()
            },
        );
        Self(f)
    }

    /// Evaluate the rule.
    pub async fn check(&self, value: &FormValue, values: &FormValue) -> Option<FormValue> {
        (self.0)(value, values).await
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule")
    }
}

/// A rule or a nested rule map.
#[derive(Clone, Debug)]
pub enum RuleEntry {
    Rule(Rule),
    Nested(RuleMap),
}

/// Ordered map from field keys to rules. Keys may be dotted paths; nested maps
/// extend their parent's key.
///
/// ```
/// use strata_form::{Rule, RuleMap};
///
/// let rules = RuleMap::new()
///     .rule("name", Rule::new(|v, _| v.as_str().filter(|s| s.is_empty()).map(|_| "Required".into())))
///     .nested("address", RuleMap::new().rule("city", Rule::new(|_, _| None)));
/// assert_eq!(rules.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RuleMap {
    entries: Vec<(String, RuleEntry)>,
}

impl RuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule (builder pattern).
    #[must_use]
    pub fn rule(mut self, key: impl Into<String>, rule: Rule) -> Self {
        self.entries.push((key.into(), RuleEntry::Rule(rule)));
        self
    }

    /// Add a nested rule map (builder pattern).
    #[must_use]
    pub fn nested(mut self, key: impl Into<String>, rules: RuleMap) -> Self {
        self.entries.push((key.into(), RuleEntry::Nested(rules)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Every rule paired with its full dotted key, depth-first in insertion
    /// order.
    pub fn flatten(&self) -> Vec<(String, Rule)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, base: &str, out: &mut Vec<(String, Rule)>) {
        for (key, entry) in &self.entries {
            let full = if base.is_empty() {
                key.clone()
            } else {
                format!("{base}.{key}")
            };
            match entry {
                RuleEntry::Rule(rule) => out.push((full, rule.clone())),
                RuleEntry::Nested(map) => map.flatten_into(&full, out),
            }
        }
    }
}

/// A whole-form validation function: `values -> errors`.
#[derive(Clone)]
pub struct FormRule(Arc<FormRuleFn>);

impl FormRule {
    pub async fn check(&self, values: &FormValue) -> FormValue {
        (self.0)(values).await
    }
}

impl fmt::Debug for FormRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FormRule")
    }
}

/// Custom schema source.
#[derive(Clone, Debug)]
pub enum CustomSchema {
    Function(FormRule),
    Rules(RuleMap),
}

impl CustomSchema {
    /// A synchronous whole-form function.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&FormValue) -> FormValue + Send + Sync + 'static,
    {
        let rule: Arc<FormRuleFn> = Arc::new(move |values: &FormValue| -> BoxFuture<'static, FormValue> {
            future::ready(f(values)).boxed()
        });
        CustomSchema::Function(FormRule(rule))
    }

    /// An asynchronous whole-form function. Receives an owned snapshot.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(FormValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FormValue> + Send + 'static,
    {
        let rule: Arc<FormRuleFn> = Arc::new(move |values: &FormValue| -> BoxFuture<'static, FormValue> {
            f(values.clone()).boxed()
        });
        CustomSchema::Function(FormRule(rule))
    }

    pub fn rules(rules: RuleMap) -> Self {
        CustomSchema::Rules(rules)
    }
}

impl From<RuleMap> for CustomSchema {
    fn from(rules: RuleMap) -> Self {
        CustomSchema::Rules(rules)
    }
}

/// Default adapter registered as `"custom"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomAdapter;

#[async_trait]
impl ValidatorAdapter for CustomAdapter {
    async fn validate(&self, values: &FormValue, schema: &Schema) -> FormResult<FormValue> {
        let Schema::Custom(custom) = schema else {
            return Err(FormError::mismatch("custom", schema.kind()));
        };
        match custom {
            CustomSchema::Function(rule) => {
                let errors = rule.check(values).await;
                Ok(if errors.is_nullish() {
                    FormValue::object()
                } else {
                    errors
                })
            }
            CustomSchema::Rules(rules) => {
                let mut errors = FormValue::object();
                for (key, rule) in rules.flatten() {
                    let value = get_str(values, &key).cloned().unwrap_or_default();
                    if let Some(error) = rule.check(&value, values).await {
                        if !error.is_nullish() {
                            record_error(&mut errors, &key, error);
                        }
                    }
                }
                Ok(errors)
            }
        }
    }
}
