//! The form engine.
//!
//! A [`Form`] owns three observable containers (values, errors and touched
//! flags) plus a status record. Every container is a `tokio::sync::watch`
//! channel: getters return snapshots and `subscribe_*` hands out receivers
//! that are notified on each mutation.
//!
//! # Validation scheduling
//!
//! Validation runs on mount, after values change, and on blur, each behind its
//! own flag in [`FormConfig`]. Every run takes a number from a monotonic
//! counter and a snapshot of the values when it is triggered. Only the run
//! holding the latest number when it completes may write `errors` or clear
//! `is_validating`; earlier runs finish and are discarded.
//!
//! With a debounce window, change-triggered runs wait on a timer that is
//! restarted by every change. Blur-triggered runs start immediately and leave
//! a pending timer alone. Aborting a timer never aborts a run already in
//! flight.

mod events;
mod submit;

pub use events::{FieldEvent, FieldInput, SubmitEvent};
pub use submit::{FormHelpers, SubmitHandler, SubmitOutcome};

use crate::config::{FormConfig, FormOptions};
use crate::validation::{Schema, ValidatorRegistry};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strata_state::{
    apply_state, assign, clear_in_place, deep_clone, deep_equal, get, ApplyOptions, ClearOptions,
    FieldPath, FormValue,
};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Submission and validation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FormStatus {
    pub is_submitting: bool,
    pub is_validating: bool,
    pub submit_count: u32,
}

/// Options for [`Form::set_values`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SetValuesOptions {
    /// Clear the current values before merging.
    pub replace: bool,
}

/// Options for [`Form::reset`].
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// New baseline and values. When `None`, values revert to the baseline.
    pub values: Option<FormValue>,
    /// Keep touched flags instead of clearing them.
    pub keep_touched: bool,
}

impl ResetOptions {
    pub fn with_values(values: impl Into<FormValue>) -> Self {
        Self {
            values: Some(values.into()),
            keep_touched: false,
        }
    }

    #[must_use]
    pub fn keep_touched(mut self) -> Self {
        self.keep_touched = true;
        self
    }
}

struct FormInner {
    config: FormConfig,
    schema: Option<Schema>,
    registry: Arc<ValidatorRegistry>,
    on_submit: Option<SubmitHandler>,
    baseline: Mutex<FormValue>,
    values: watch::Sender<FormValue>,
    errors: watch::Sender<FormValue>,
    touched: watch::Sender<FormValue>,
    status: watch::Sender<FormStatus>,
    run_id: AtomicU64,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Form state handle. Cloning is cheap and every clone drives the same form.
///
/// Creating a form with `validate_on_mount` (the default) and every
/// validating mutation spawn work onto the current Tokio runtime; outside a
/// runtime the validation is skipped with a warning.
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("values", &*self.inner.values.borrow())
            .field("errors", &*self.inner.errors.borrow())
            .field("status", &*self.inner.status.borrow())
            .field("schema", &self.inner.schema)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn container_or_empty(value: &FormValue, what: &'static str) -> FormValue {
    if value.is_container() {
        deep_clone(value)
    } else {
        if !value.is_undefined() {
            tracing::warn!(found = value.type_name(), "initial {what} must be an object; using {{}}");
        }
        FormValue::object()
    }
}

fn parse_field(field: &str) -> Option<FieldPath> {
    match FieldPath::parse(field) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(field, error = %e, "ignoring malformed field path");
            None
        }
    }
}

impl Form {
    /// Create a form. Starts mount validation when configured.
    pub fn new(options: FormOptions) -> Self {
        let schema = options.resolve_schema();
        let registry = options
            .registry
            .clone()
            .unwrap_or_else(|| Arc::new(ValidatorRegistry::with_defaults()));
        let values = container_or_empty(&options.initial_values, "values");
        let baseline = deep_clone(&values);

        let inner = FormInner {
            schema,
            registry,
            on_submit: options.on_submit,
            baseline: Mutex::new(baseline),
            values: watch::channel(values).0,
            errors: watch::channel(container_or_empty(&options.initial_errors, "errors")).0,
            touched: watch::channel(container_or_empty(&options.initial_touched, "touched")).0,
            status: watch::channel(FormStatus::default()).0,
            run_id: AtomicU64::new(0),
            pending: Mutex::new(None),
            config: options.config,
        };
        let form = Self {
            inner: Arc::new(inner),
        };
        if form.inner.config.validate_on_mount {
            form.spawn_validation();
        }
        form
    }

    pub fn config(&self) -> &FormConfig {
        &self.inner.config
    }

    // ========================================================================
    // Snapshots and subscriptions
    // ========================================================================

    pub fn values(&self) -> FormValue {
        self.inner.values.borrow().clone()
    }

    pub fn errors(&self) -> FormValue {
        self.inner.errors.borrow().clone()
    }

    pub fn touched(&self) -> FormValue {
        self.inner.touched.borrow().clone()
    }

    pub fn status(&self) -> FormStatus {
        *self.inner.status.borrow()
    }

    /// Values captured at construction or at the last reset with new values.
    pub fn baseline(&self) -> FormValue {
        lock(&self.inner.baseline).clone()
    }

    pub fn subscribe_values(&self) -> watch::Receiver<FormValue> {
        self.inner.values.subscribe()
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<FormValue> {
        self.inner.errors.subscribe()
    }

    pub fn subscribe_touched(&self) -> watch::Receiver<FormValue> {
        self.inner.touched.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<FormStatus> {
        self.inner.status.subscribe()
    }

    /// True when `errors` has no top-level keys.
    ///
    /// This is a shallow check: `{"address": {}}` counts as invalid.
    pub fn is_valid(&self) -> bool {
        submit::is_empty_errors(&self.inner.errors.borrow())
    }

    /// True when the values differ structurally from the baseline.
    pub fn is_dirty(&self) -> bool {
        let baseline = lock(&self.inner.baseline);
        !deep_equal(&self.inner.values.borrow(), &baseline)
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.status.borrow().is_submitting
    }

    pub fn is_validating(&self) -> bool {
        self.inner.status.borrow().is_validating
    }

    pub fn submit_count(&self) -> u32 {
        self.inner.status.borrow().submit_count
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Merge `values` into the current values (or replace them).
    pub fn set_values(&self, values: impl Into<FormValue>, options: SetValuesOptions) {
        let source = values.into();
        self.inner.values.send_modify(|current| {
            apply_state(current, &source, ApplyOptions { replace: options.replace });
        });
        self.values_changed();
    }

    /// Replace the errors.
    pub fn set_errors(&self, errors: impl Into<FormValue>) {
        let source = errors.into();
        self.inner
            .errors
            .send_modify(|current| apply_state(current, &source, ApplyOptions { replace: true }));
    }

    /// Replace the touched flags.
    pub fn set_touched(&self, touched: impl Into<FormValue>) {
        let source = touched.into();
        self.inner
            .touched
            .send_modify(|current| apply_state(current, &source, ApplyOptions { replace: true }));
    }

    /// Write one field. A malformed path is logged and ignored.
    pub fn set_field_value(&self, field: &str, value: impl Into<FormValue>) {
        let Some(path) = parse_field(field) else {
            return;
        };
        if write_path(&self.inner.values, &path, value.into()) {
            self.values_changed();
        }
    }

    /// Mark one field touched, untouched, or (with `None`) unset.
    pub fn set_field_touched(&self, field: &str, touched: Option<bool>) {
        let Some(path) = parse_field(field) else {
            return;
        };
        write_path(&self.inner.touched, &path, FormValue::from(touched));
    }

    pub fn set_submitting(&self, submitting: bool) {
        self.inner.status.send_if_modified(|status| {
            let changed = status.is_submitting != submitting;
            status.is_submitting = submitting;
            changed
        });
    }

    /// Restore the baseline, or install new values as both baseline and
    /// current values.
    ///
    /// Touched flags are cleared unless `keep_touched`; the submit count
    /// returns to zero. Errors are left for the next validation.
    pub fn reset(&self, options: ResetOptions) {
        let baseline = {
            let mut baseline = lock(&self.inner.baseline);
            if let Some(values) = &options.values {
                apply_state(&mut baseline, values, ApplyOptions { replace: true });
            }
            baseline.clone()
        };
        self.inner.values.send_modify(|current| {
            apply_state(current, &baseline, ApplyOptions { replace: true });
        });
        if !options.keep_touched {
            self.inner
                .touched
                .send_modify(|touched| clear_in_place(touched, &ClearOptions::default()));
        }
        self.inner.status.send_modify(|status| status.submit_count = 0);
        self.values_changed();
    }

    // ========================================================================
    // Field events and getters
    // ========================================================================

    /// Write the event's value and mark the field touched. Unnamed events are
    /// ignored.
    pub fn handle_field_change(&self, event: &FieldEvent) {
        if event.name.is_empty() {
            return;
        }
        let value = event.input.clone().map_or(FormValue::Undefined, FormValue::from);
        self.set_field_value(&event.name, value);
        self.set_field_touched(&event.name, Some(true));
    }

    /// Mark the field touched and validate immediately when `validate_on_blur`.
    pub fn handle_field_blur(&self, event: &FieldEvent) {
        if !event.name.is_empty() {
            self.set_field_touched(&event.name, Some(true));
        }
        if self.inner.config.validate_on_blur {
            self.spawn_validation();
        }
    }

    pub fn get_field_value(&self, field: &str) -> Option<FormValue> {
        read_path(&self.inner.values, field)
    }

    pub fn get_field_touched(&self, field: &str) -> Option<FormValue> {
        read_path(&self.inner.touched, field)
    }

    /// True when the field has an error and has been touched.
    pub fn has_field_error(&self, field: &str) -> bool {
        let error = read_path(&self.inner.errors, field).is_some_and(|e| e.is_truthy());
        error && read_path(&self.inner.touched, field).is_some_and(|t| t.is_truthy())
    }

    /// The field's error when [`has_field_error`](Self::has_field_error),
    /// otherwise an empty string.
    pub fn get_field_error(&self, field: &str) -> FormValue {
        if self.has_field_error(field) {
            read_path(&self.inner.errors, field).unwrap_or_default()
        } else {
            FormValue::from("")
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Run one validation pass now and return its errors.
    ///
    /// The errors are committed only if no newer pass started meanwhile; the
    /// computed errors are returned either way.
    pub async fn validate(&self) -> FormValue {
        let (run, values) = self.begin_run();
        self.finish_run(run, values).await
    }

    fn values_changed(&self) {
        if !self.inner.config.validate_on_change {
            return;
        }
        let delay = self.inner.config.validation_debounce();
        if delay.is_zero() {
            self.spawn_validation();
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!("no async runtime; skipping debounced validation");
            return;
        };
        let form = self.clone();
        let timer = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            form.spawn_validation();
        });
        if let Some(previous) = lock(&self.inner.pending).replace(timer) {
            previous.abort();
        }
    }

    fn spawn_validation(&self) {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!("no async runtime; skipping validation");
            return;
        };
        let (run, values) = self.begin_run();
        let form = self.clone();
        handle.spawn(async move {
            form.finish_run(run, values).await;
        });
    }

    fn begin_run(&self) -> (RunGuard, FormValue) {
        let run = self.inner.run_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.status.send_if_modified(|status| {
            let changed = !status.is_validating;
            status.is_validating = true;
            changed
        });
        let guard = RunGuard {
            form: self.clone(),
            run,
        };
        (guard, self.values())
    }

    async fn finish_run(&self, run: RunGuard, values: FormValue) -> FormValue {
        let result = match &self.inner.schema {
            Some(schema) => self.inner.registry.run(&values, schema).await,
            None => Ok(FormValue::object()),
        };
        let errors = result.unwrap_or_else(|e| {
            tracing::error!(run = run.run, error = %e, "validation failed");
            FormValue::object()
        });

        if run.is_latest() {
            self.inner.errors.send_replace(errors.clone());
        } else {
            tracing::trace!(run = run.run, "discarding stale validation result");
        }
        errors
    }

    fn is_latest_run(&self, run: u64) -> bool {
        self.inner.run_id.load(Ordering::SeqCst) == run
    }
}

/// One validation pass in flight. Dropping it clears `is_validating` if no
/// newer pass has started, including when the pass is cancelled mid-await.
struct RunGuard {
    form: Form,
    run: u64,
}

impl RunGuard {
    fn is_latest(&self) -> bool {
        self.form.is_latest_run(self.run)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.is_latest() {
            return;
        }
        self.form.inner.status.send_if_modified(|status| {
            let changed = status.is_validating;
            status.is_validating = false;
            changed
        });
    }
}

fn write_path(channel: &watch::Sender<FormValue>, path: &FieldPath, value: FormValue) -> bool {
    let mut outcome = Ok(());
    channel.send_if_modified(|current| {
        outcome = assign(current, path, value);
        outcome.is_ok()
    });
    if let Err(e) = &outcome {
        tracing::warn!(path = %path, error = %e, "cannot write field");
    }
    outcome.is_ok()
}

fn read_path(channel: &watch::Sender<FormValue>, field: &str) -> Option<FormValue> {
    let path = FieldPath::parse(field).ok()?;
    get(&channel.borrow(), &path).cloned()
}
