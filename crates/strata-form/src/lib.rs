//! Form state management with pluggable schema validation.
//!
//! `strata-form` tracks a form's values, errors and touched flags, addresses
//! fields by dot/bracket paths, and validates through named adapters:
//!
//! - **Form**: the engine. Observable containers, mutators, field events,
//!   submit and reset, with race-guarded and optionally debounced validation
//! - **ValidatorRegistry**: adapters for collect, detail, safe-parse and
//!   assert style engines plus free-form custom rules
//! - **FieldArray**: insert/remove helpers for array-valued fields
//!
//! # Quick Start
//!
//! ```
//! use strata_form::{CustomSchema, Form, FormOptions, FormValue, Rule, RuleMap};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let rules = RuleMap::new().rule(
//!     "name",
//!     Rule::new(|value, _| (!value.is_truthy()).then(|| "Name is required".into())),
//! );
//! let form = Form::new(
//!     FormOptions::new(FormValue::from(json!({"name": ""})))
//!         .with_validation_schema(CustomSchema::rules(rules)),
//! );
//!
//! let errors = form.validate().await;
//! assert_eq!(errors, json!({"name": "Name is required"}));
//!
//! form.set_field_value("name", "Kiran");
//! assert!(form.validate().await.as_object().is_some_and(|e| e.is_empty()));
//! # }
//! ```

mod config;
mod error;
mod field_array;
mod form;
pub mod validation;

pub use config::{FormConfig, FormOptions};
pub use error::{BoxError, FieldArrayError, FormError, FormResult};
pub use field_array::FieldArray;
pub use form::{
    FieldEvent, FieldInput, Form, FormHelpers, FormStatus, ResetOptions, SetValuesOptions,
    SubmitEvent, SubmitHandler, SubmitOutcome,
};
pub use validation::{
    CustomSchema, Rule, RuleMap, Schema, ValidatorAdapter, ValidatorRegistry,
};

pub use strata_state::{FieldPath, FormValue, PathKey};
