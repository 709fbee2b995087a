//! Submit, reset and event handling from the caller's side.

use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strata_form::{
    BoxError, CustomSchema, FieldEvent, Form, FormOptions, FormValue, ResetOptions, Rule,
    RuleMap, SetValuesOptions, SubmitEvent, SubmitHandler, SubmitOutcome,
};
use tokio::time::{sleep, timeout};

async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

#[derive(Default)]
struct Event {
    prevented: AtomicBool,
}

impl SubmitEvent for Event {
    fn prevent_default(&self) {
        self.prevented.store(true, Ordering::SeqCst);
    }
}

fn required_name() -> CustomSchema {
    CustomSchema::rules(RuleMap::new().rule(
        "name",
        Rule::new(|value, _| (!value.is_truthy()).then(|| "Name is required".into())),
    ))
}

/// Records every submitted values snapshot.
fn recording_handler() -> (SubmitHandler, Arc<Mutex<Vec<FormValue>>>) {
    let submitted = Arc::new(Mutex::new(Vec::new()));
    let sink = submitted.clone();
    let handler = SubmitHandler::new(move |values, _helpers| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(values);
            Ok::<(), BoxError>(())
        }
    });
    (handler, submitted)
}

async fn reject() -> Result<(), BoxError> {
    Err("server unavailable".into())
}

async fn explode() -> Result<(), BoxError> {
    panic!("handler bug")
}

// ============================================================================
// Submit
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_submit_without_handler_is_skipped() {
    let form = Form::new(FormOptions::new(FormValue::from(json!({"name": ""}))));
    let event = Event::default();
    let outcome = form.handle_submit(Some(&event)).await;
    assert_eq!(outcome, SubmitOutcome::Skipped);
    assert_eq!(form.submit_count(), 0);
    assert!(!event.prevented.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_submit_valid_form() {
    let (handler, submitted) = recording_handler();
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"name": "Ada"})))
            .with_validation_schema(required_name())
            .with_on_submit(handler),
    );
    let event = Event::default();

    let outcome = form.handle_submit(Some(&event)).await;
    assert_eq!(outcome, SubmitOutcome::Submitted);
    assert!(event.prevented.load(Ordering::SeqCst));
    assert_eq!(form.submit_count(), 1);
    assert!(!form.is_submitting());
    assert_eq!(*submitted.lock().unwrap(), vec![FormValue::from(json!({"name": "Ada"}))]);

    form.handle_submit(None).await;
    assert_eq!(form.submit_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_submit_keeps_default_when_disabled() {
    let (handler, _) = recording_handler();
    let form = Form::new(
        FormOptions::new(FormValue::object())
            .with_on_submit(handler)
            .with_prevent_default(false),
    );
    let event = Event::default();
    form.handle_submit(Some(&event)).await;
    assert!(!event.prevented.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_submit_blocked_by_errors() {
    let (handler, submitted) = recording_handler();
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"name": ""})))
            .with_validate_on_mount(false)
            .with_validation_schema(required_name())
            .with_on_submit(handler),
    );

    let outcome = form.handle_submit(None).await;
    assert_eq!(
        outcome,
        SubmitOutcome::Invalid(FormValue::from(json!({"name": "Name is required"})))
    );
    assert!(submitted.lock().unwrap().is_empty());
    assert_eq!(form.submit_count(), 1);
    assert!(!form.is_submitting());
    assert_eq!(form.errors(), json!({"name": "Name is required"}));
}

#[tokio::test(start_paused = true)]
async fn test_submitting_flag_held_during_handler() {
    let handler = SubmitHandler::new(|_, _| async {
        sleep(Duration::from_millis(20)).await;
        Ok::<(), BoxError>(())
    });
    let form = Form::new(FormOptions::new(FormValue::object()).with_on_submit(handler));

    let task = tokio::spawn({
        let form = form.clone();
        async move { form.handle_submit(None).await }
    });
    sleep(Duration::from_millis(5)).await;
    assert!(form.is_submitting());

    assert_eq!(task.await.unwrap(), SubmitOutcome::Submitted);
    assert!(!form.is_submitting());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_submit_clears_submitting() {
    let handler = SubmitHandler::new(|_, _| async {
        sleep(Duration::from_millis(100)).await;
        Ok::<(), BoxError>(())
    });
    let form = Form::new(FormOptions::new(FormValue::object()).with_on_submit(handler));
    settle().await;

    let attempt = timeout(Duration::from_millis(10), form.handle_submit(None)).await;
    assert!(attempt.is_err());
    assert!(!form.is_submitting());
    assert!(!form.is_validating());
    assert_eq!(form.submit_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failing_handler_clears_submitting() {
    let handler = SubmitHandler::new(|_, _| reject());
    let form = Form::new(FormOptions::new(FormValue::object()).with_on_submit(handler));

    let outcome = form.handle_submit(None).await;
    assert_eq!(outcome, SubmitOutcome::Failed("server unavailable".into()));
    assert!(!form.is_submitting());
    assert_eq!(form.submit_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_handler_clears_submitting() {
    let handler = SubmitHandler::new(|_, _| explode());
    let form = Form::new(FormOptions::new(FormValue::object()).with_on_submit(handler));

    let outcome = form.handle_submit(None).await;
    assert_eq!(outcome, SubmitOutcome::Failed("handler bug".into()));
    assert!(!form.is_submitting());
}

#[tokio::test(start_paused = true)]
async fn test_handler_uses_helpers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handler = SubmitHandler::new(move |values, helpers| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            assert_eq!(values, json!({"email": "ada@example.com"}));
            helpers.set_errors(json!({"email": "Already registered"}));
            helpers.set_field_touched("email", Some(true));
            Ok::<(), BoxError>(())
        }
    });
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"email": "ada@example.com"})))
            .with_validate_on_mount(false)
            .with_on_submit(handler),
    );

    assert_eq!(form.handle_submit(None).await, SubmitOutcome::Submitted);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(form.has_field_error("email"));
    assert_eq!(form.get_field_error("email"), FormValue::from("Already registered"));
}

#[tokio::test(start_paused = true)]
async fn test_handler_resets_form() {
    let handler = SubmitHandler::new(|_, helpers| async move {
        helpers.reset(ResetOptions::default());
        Ok::<(), BoxError>(())
    });
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"comment": ""})))
            .with_validate_on_mount(false)
            .with_on_submit(handler),
    );
    form.set_field_value("comment", "first!");
    form.set_field_touched("comment", Some(true));

    form.handle_submit(None).await;
    assert_eq!(form.values(), json!({"comment": ""}));
    assert_eq!(form.touched(), json!({}));
    assert_eq!(form.submit_count(), 0);
}

// ============================================================================
// Reset and values
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reset_with_new_baseline() {
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"name": "A"}))).with_validate_on_mount(false),
    );
    form.set_field_value("name", "B");
    assert!(form.is_dirty());

    form.reset(ResetOptions::with_values(json!({"name": "C"})));
    assert_eq!(form.values(), json!({"name": "C"}));
    assert_eq!(form.baseline(), json!({"name": "C"}));
    assert!(!form.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn test_reset_keep_touched() {
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"name": ""})))
            .with_validate_on_mount(false)
            .with_initial_touched(json!({"name": true})),
    );
    form.reset(ResetOptions::default().keep_touched());
    assert_eq!(form.touched(), json!({"name": true}));
    form.reset(ResetOptions::default());
    assert_eq!(form.touched(), json!({}));
}

#[tokio::test(start_paused = true)]
async fn test_reset_revalidates() {
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"name": ""})))
            .with_validation_schema(required_name()),
    );
    settle().await;
    assert!(!form.is_valid());

    form.reset(ResetOptions::with_values(json!({"name": "Ada"})));
    settle().await;
    assert!(form.is_valid());
}

#[tokio::test(start_paused = true)]
async fn test_set_values_merge_and_replace() {
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"a": 1, "tags": ["x"]})))
            .with_validate_on_mount(false),
    );
    form.set_values(json!({"b": 2, "tags": ["y"]}), SetValuesOptions::default());
    assert_eq!(form.values(), json!({"a": 1, "b": 2, "tags": ["y"]}));

    form.set_values(json!({"c": 3}), SetValuesOptions { replace: true });
    assert_eq!(form.values(), json!({"c": 3}));
}

#[tokio::test(start_paused = true)]
async fn test_replace_with_non_object_clears_values() {
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"a": 1, "b": "x"})))
            .with_validate_on_mount(false),
    );
    form.set_values(FormValue::Null, SetValuesOptions { replace: true });
    assert_eq!(form.values(), json!({}));
}

#[tokio::test(start_paused = true)]
async fn test_oversized_index_writes_are_ignored() {
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"a": [1]}))).with_validate_on_mount(false),
    );
    let mut values = form.subscribe_values();

    form.set_field_value("a[18446744073709551615]", 1);
    form.handle_field_change(&FieldEvent::change("a[10000000000]", "x"));
    form.set_field_touched("rows[4000000000]", Some(true));

    assert!(!values.has_changed().unwrap());
    assert_eq!(form.values(), json!({"a": [1]}));
    assert_eq!(form.touched(), json!({}));
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_change_events() {
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"name": "", "agree": false})))
            .with_validate_on_mount(false),
    );
    form.handle_field_change(&FieldEvent::change("name", "Kiran"));
    form.handle_field_change(&FieldEvent::checkbox("agree", true));

    assert_eq!(form.values(), json!({"name": "Kiran", "agree": true}));
    assert_eq!(form.touched(), json!({"name": true, "agree": true}));
}

#[tokio::test(start_paused = true)]
async fn test_unnamed_change_event_ignored() {
    let form = Form::new(FormOptions::new(FormValue::object()).with_validate_on_mount(false));
    let mut values = form.subscribe_values();
    form.handle_field_change(&FieldEvent::change("", "lost"));
    assert!(!values.has_changed().unwrap());
    assert_eq!(*values.borrow_and_update(), json!({}));
}

#[tokio::test(start_paused = true)]
async fn test_field_error_requires_touch() {
    let form = Form::new(
        FormOptions::new(FormValue::from(json!({"name": ""})))
            .with_validation_schema(required_name()),
    );
    settle().await;
    assert!(!form.has_field_error("name"));
    assert_eq!(form.get_field_error("name"), FormValue::from(""));

    form.handle_field_blur(&FieldEvent::blur("name"));
    settle().await;
    assert!(form.has_field_error("name"));
    assert_eq!(form.get_field_error("name"), FormValue::from("Name is required"));
}
