//! Insert and remove items of array-valued fields.

use crate::error::FieldArrayError;
use crate::form::Form;
use strata_state::FormValue;

/// Array helpers bound to one form.
///
/// Misuse (a non-array field, an index out of range, popping an empty array)
/// leaves the form untouched, logs a warning with the error's message and
/// returns the error.
#[derive(Debug, Clone)]
pub struct FieldArray {
    form: Form,
}

impl FieldArray {
    pub fn new(form: &Form) -> Self {
        Self { form: form.clone() }
    }

    /// Insert `value` at `index` (`0..=len`), or append when `index` is `None`.
    pub fn push(
        &self,
        field: &str,
        value: impl Into<FormValue>,
        index: Option<i64>,
    ) -> Result<(), FieldArrayError> {
        let mut items = self.items(field)?;
        match index {
            None => items.push(value.into()),
            Some(i) => {
                let position = checked_index(i, items.len() + 1).ok_or_else(|| {
                    report(FieldArrayError::OutOfBounds {
                        field: field.to_owned(),
                        index: i,
                    })
                })?;
                items.insert(position, value.into());
            }
        }
        self.form.set_field_value(field, items);
        Ok(())
    }

    /// Remove the item at `index` (`0..len`), or the last item when `index`
    /// is `None`. Removing by index also unsets the touched flag at
    /// `field[index]`.
    pub fn pop(&self, field: &str, index: Option<i64>) -> Result<(), FieldArrayError> {
        let mut items = self.items(field)?;
        if items.is_empty() {
            return Err(report(FieldArrayError::Empty {
                field: field.to_owned(),
            }));
        }
        match index {
            None => {
                items.pop();
                self.form.set_field_value(field, items);
            }
            Some(i) => {
                let position = checked_index(i, items.len()).ok_or_else(|| {
                    report(FieldArrayError::OutOfBounds {
                        field: field.to_owned(),
                        index: i,
                    })
                })?;
                items.remove(position);
                self.form.set_field_value(field, items);
                self.form.set_field_touched(&format!("{field}[{position}]"), None);
            }
        }
        Ok(())
    }

    fn items(&self, field: &str) -> Result<Vec<FormValue>, FieldArrayError> {
        match self.form.get_field_value(field) {
            Some(FormValue::Array(items)) => Ok(items.as_ref().clone()),
            _ => Err(report(FieldArrayError::NotAnArray {
                field: field.to_owned(),
            })),
        }
    }
}

/// `index` as a position when it lies in `0..limit`.
fn checked_index(index: i64, limit: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < limit)
}

fn report(err: FieldArrayError) -> FieldArrayError {
    tracing::warn!("{err}");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormOptions;
    use serde_json::json;

    fn form(values: serde_json::Value) -> Form {
        Form::new(
            FormOptions::new(FormValue::from(values))
                .with_validate_on_mount(false)
                .with_validate_on_change(false),
        )
    }

    #[test]
    fn test_checked_index() {
        assert_eq!(checked_index(0, 1), Some(0));
        assert_eq!(checked_index(1, 1), None);
        assert_eq!(checked_index(-1, 5), None);
    }

    #[tokio::test]
    async fn test_push_append_and_insert() {
        let form = form(json!({"names": ["John", "Doe"]}));
        let array = FieldArray::new(&form);
        array.push("names", "Jane", None).unwrap();
        array.push("names", "First", Some(0)).unwrap();
        array.push("names", "Last", Some(4)).unwrap();
        assert_eq!(
            form.values(),
            json!({"names": ["First", "John", "Doe", "Jane", "Last"]})
        );
    }

    #[tokio::test]
    async fn test_push_errors() {
        let form = form(json!({"name": "x", "names": ["a"]}));
        let array = FieldArray::new(&form);
        assert_eq!(
            array.push("name", "y", None).unwrap_err().to_string(),
            "Field \"name\" is not an array"
        );
        assert_eq!(
            array.push("names", "b", Some(3)).unwrap_err().to_string(),
            "Index 3 out of bounds for field \"names\""
        );
        assert_eq!(
            array.push("names", "b", Some(-1)).unwrap_err().to_string(),
            "Index -1 out of bounds for field \"names\""
        );
        assert_eq!(form.values(), json!({"name": "x", "names": ["a"]}));
    }

    #[tokio::test]
    async fn test_pop_last_and_indexed() {
        let form = form(json!({"names": ["a", "b", "c"]}));
        let array = FieldArray::new(&form);
        form.set_field_touched("names[1]", Some(true));
        array.pop("names", Some(1)).unwrap();
        assert_eq!(form.get_field_value("names"), Some(FormValue::from(json!(["a", "c"]))));
        assert!(form.get_field_touched("names[1]").is_none());

        array.pop("names", None).unwrap();
        assert_eq!(form.get_field_value("names"), Some(FormValue::from(json!(["a"]))));
    }

    #[tokio::test]
    async fn test_pop_errors() {
        let form = form(json!({"names": [], "one": ["x"]}));
        let array = FieldArray::new(&form);
        assert_eq!(
            array.pop("names", None),
            Err(FieldArrayError::Empty { field: "names".into() })
        );
        assert_eq!(
            array.pop("one", Some(1)),
            Err(FieldArrayError::OutOfBounds { field: "one".into(), index: 1 })
        );
        assert_eq!(
            array.pop("missing", None),
            Err(FieldArrayError::NotAnArray { field: "missing".into() })
        );
    }
}
