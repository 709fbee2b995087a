//! UI events consumed by the form.

use strata_state::FormValue;

/// The value carried by a change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    /// Text-like inputs (`value`).
    Text(String),
    /// Checkboxes (`checked`).
    Checked(bool),
}

impl From<FieldInput> for FormValue {
    fn from(input: FieldInput) -> Self {
        match input {
            FieldInput::Text(s) => FormValue::String(s),
            FieldInput::Checked(b) => FormValue::Bool(b),
        }
    }
}

/// A change or blur event from a named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEvent {
    /// Field path taken from the control's `name`. May be empty.
    pub name: String,
    /// Present for change events.
    pub input: Option<FieldInput>,
}

impl FieldEvent {
    pub fn change(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: Some(FieldInput::Text(value.into())),
        }
    }

    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            input: Some(FieldInput::Checked(checked)),
        }
    }

    pub fn blur(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
        }
    }
}

/// A submit event whose default action can be suppressed.
pub trait SubmitEvent: Sync {
    fn prevent_default(&self);
}
