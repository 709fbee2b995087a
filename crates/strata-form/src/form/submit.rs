//! Submit handling.

use super::events::SubmitEvent;
use super::{Form, ResetOptions, SetValuesOptions};
use crate::error::{panic_message, BoxError};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use strata_state::FormValue;

type SubmitFn =
    dyn Fn(FormValue, FormHelpers) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync;

/// User callback invoked with a values snapshot once validation passes.
#[derive(Clone)]
pub struct SubmitHandler(Arc<SubmitFn>);

impl SubmitHandler {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(FormValue, FormHelpers) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let f: Arc<SubmitFn> = Arc::new(
            move |values: FormValue, helpers: FormHelpers| -> BoxFuture<'static, Result<(), BoxError>> {
                handler(values, helpers).boxed()
            },
        );
        Self(f)
    }

    fn call(&self, values: FormValue, helpers: FormHelpers) -> BoxFuture<'static, Result<(), BoxError>> {
        (self.0)(values, helpers)
    }
}

impl fmt::Debug for SubmitHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubmitHandler")
    }
}

/// The subset of the form API handed to a submit handler.
#[derive(Clone, Debug)]
pub struct FormHelpers {
    form: Form,
}

impl FormHelpers {
    pub fn reset(&self, options: ResetOptions) {
        self.form.reset(options);
    }

    pub fn set_values(&self, values: impl Into<FormValue>, options: SetValuesOptions) {
        self.form.set_values(values, options);
    }

    pub fn set_errors(&self, errors: impl Into<FormValue>) {
        self.form.set_errors(errors);
    }

    pub fn set_touched(&self, touched: impl Into<FormValue>) {
        self.form.set_touched(touched);
    }

    pub fn set_field_value(&self, field: &str, value: impl Into<FormValue>) {
        self.form.set_field_value(field, value);
    }

    pub fn set_field_touched(&self, field: &str, touched: Option<bool>) {
        self.form.set_field_touched(field, touched);
    }

    pub fn set_submitting(&self, submitting: bool) {
        self.form.set_submitting(submitting);
    }

    /// Current values.
    pub fn values(&self) -> FormValue {
        self.form.values()
    }
}

/// What [`Form::handle_submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation passed and the handler returned `Ok`.
    Submitted,
    /// Validation produced errors; the handler was not called.
    Invalid(FormValue),
    /// The handler returned an error or panicked.
    Failed(String),
    /// No submit handler is configured.
    Skipped,
}

impl Form {
    /// Validate and, when there are no errors, call the submit handler.
    ///
    /// Without a handler this returns [`SubmitOutcome::Skipped`] and touches
    /// nothing. Otherwise the submit count is incremented and
    /// `is_submitting` is held for the duration. The flag is cleared when the
    /// call finishes or its future is dropped. Handler errors and panics are
    /// logged, not propagated.
    pub async fn handle_submit(&self, event: Option<&dyn SubmitEvent>) -> SubmitOutcome {
        let Some(handler) = self.inner.on_submit.clone() else {
            return SubmitOutcome::Skipped;
        };
        if self.inner.config.prevent_default {
            if let Some(event) = event {
                event.prevent_default();
            }
        }
        self.inner.status.send_modify(|status| {
            status.submit_count += 1;
            status.is_submitting = true;
        });
        let _submitting = SubmittingGuard(self);

        let errors = self.validate().await;
        let outcome = if has_keys(&errors) {
            tracing::debug!("submit blocked by validation errors");
            SubmitOutcome::Invalid(errors)
        } else {
            let helpers = FormHelpers { form: self.clone() };
            let call = AssertUnwindSafe(handler.call(self.values(), helpers));
            match call.catch_unwind().await {
                Ok(Ok(())) => SubmitOutcome::Submitted,
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "form submission failed");
                    SubmitOutcome::Failed(e.to_string())
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(error = %message, "form submission panicked");
                    SubmitOutcome::Failed(message)
                }
            }
        };

        outcome
    }
}

/// Clears `is_submitting` when dropped, so a cancelled submit never leaves the
/// flag set.
struct SubmittingGuard<'a>(&'a Form);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.set_submitting(false);
    }
}

fn has_keys(errors: &FormValue) -> bool {
    match errors {
        FormValue::Object(record) => !record.is_empty(),
        FormValue::Array(items) => !items.is_empty(),
        _ => false,
    }
}

pub(super) fn is_empty_errors(errors: &FormValue) -> bool {
    !has_keys(errors)
}
