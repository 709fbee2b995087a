//! Reading and writing values by field path.
//!
//! Reads are total: anything that cannot be resolved yields `None`. Writes are
//! copy-on-write: only the containers on the written path are copied, every
//! other branch keeps its identity with the input.

use crate::error::{PathError, PathResult};
use crate::path::{FieldPath, PathKey};
use crate::value::{FormValue, Record};
use std::sync::Arc;

/// Largest array index a write may address. Writes grow arrays densely, so
/// the bound caps the placeholders a single write can create.
pub const MAX_INDEX: usize = 100_000;

/// Read the value at `path`.
///
/// Returns `None` for missing keys, out-of-range indices, indexing into a
/// non-array, and for null or undefined leaves. A numeric key applied to an
/// array is treated as an index.
///
/// # Examples
///
/// ```
/// use strata_state::{get, FieldPath, FormValue};
/// use serde_json::json;
///
/// let values = FormValue::from(json!({"contacts": [{"city": "Pune"}]}));
/// let path = FieldPath::parse("contacts[0].city").unwrap();
/// assert_eq!(get(&values, &path).and_then(|v| v.as_str()), Some("Pune"));
/// ```
pub fn get<'a>(root: &'a FormValue, path: &FieldPath) -> Option<&'a FormValue> {
    let mut current = root;
    for segment in path.segments() {
        current = step_key(current, &segment.key)?;
        for &index in &segment.indices {
            current = current.as_array()?.get(index)?;
        }
    }
    (!current.is_nullish()).then_some(current)
}

/// Read the value at a flat key list.
pub fn get_keys<'a>(root: &'a FormValue, keys: &[PathKey]) -> Option<&'a FormValue> {
    let mut current = root;
    for key in keys {
        current = match key {
            PathKey::Key(k) => step_key(current, k)?,
            PathKey::Index(i) => current.as_array()?.get(*i)?,
        };
    }
    (!current.is_nullish()).then_some(current)
}

/// Parse `path` and read it. A malformed path reads as `None`.
pub fn get_str<'a>(root: &'a FormValue, path: &str) -> Option<&'a FormValue> {
    FieldPath::parse(path).ok().and_then(|p| get(root, &p))
}

fn step_key<'a>(current: &'a FormValue, key: &str) -> Option<&'a FormValue> {
    match current {
        FormValue::Object(record) => record.get(key),
        FormValue::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Return a copy of `root` with `value` written at `path`.
///
/// Missing intermediates are created: an array when the next step is an
/// index, an object otherwise. A value of the wrong kind in the way is
/// replaced. Arrays grow with `Undefined` placeholders up to the written
/// index. `root` itself is never modified.
///
/// # Errors
///
/// [`PathError::InvalidTarget`] if `root` is neither an object nor an array.
///
/// # Examples
///
/// ```
/// use strata_state::{set, FieldPath, FormValue};
/// use serde_json::json;
///
/// let root = FormValue::object();
/// let path = FieldPath::parse("a[2].b").unwrap();
/// let next = set(&root, &path, FormValue::from(1)).unwrap();
/// assert_eq!(next, json!({"a": [null, null, {"b": 1}]}));
/// ```
pub fn set(root: &FormValue, path: &FieldPath, value: FormValue) -> PathResult<FormValue> {
    ensure_container(root)?;
    let keys = path.keys();
    check_indices(root, &keys)?;
    let mut result = root.clone();
    write_at(&mut result, &keys, value);
    Ok(result)
}

/// Write `value` at `path` into the live `root`.
///
/// The root container keeps its identity when nothing else shares it;
/// otherwise it is copied once, exactly as [`set`] would.
///
/// # Errors
///
/// [`PathError::InvalidTarget`] for a non-container root,
/// [`PathError::IndexTooLarge`] for a slot past [`MAX_INDEX`], and
/// [`PathError::FrozenTarget`] when the root object is frozen. The root is
/// left untouched on every error.
pub fn assign(root: &mut FormValue, path: &FieldPath, value: FormValue) -> PathResult<()> {
    ensure_container(root)?;
    if root.as_object().is_some_and(Record::is_frozen) {
        tracing::warn!(path = %path, "cannot assign into a frozen object");
        return Err(PathError::FrozenTarget {
            path: path.to_string(),
        });
    }
    let keys = path.keys();
    check_indices(root, &keys)?;
    write_at(root, &keys, value);
    Ok(())
}

fn ensure_container(root: &FormValue) -> PathResult<()> {
    if root.is_container() {
        Ok(())
    } else {
        Err(PathError::invalid_target(root.type_name()))
    }
}

/// Walk the write ahead of time and reject any array slot past `MAX_INDEX`,
/// including numeric keys that will land on an existing array.
fn check_indices(root: &FormValue, keys: &[PathKey]) -> PathResult<()> {
    let mut current = Some(root);
    for key in keys {
        let index = match key {
            PathKey::Index(i) => Some(*i),
            PathKey::Key(k) => current
                .filter(|c| c.is_array())
                .and_then(|_| k.parse::<usize>().ok()),
        };
        if let Some(i) = index.filter(|&i| i > MAX_INDEX) {
            return Err(PathError::index_too_large(i));
        }
        current = current.and_then(|c| match (index, key) {
            (Some(i), _) => c.as_array().and_then(|items| items.get(i)),
            (None, PathKey::Key(k)) => c.as_object().and_then(|record| record.get(k)),
            (None, PathKey::Index(_)) => None,
        });
    }
    Ok(())
}

fn write_at(current: &mut FormValue, keys: &[PathKey], value: FormValue) {
    match keys {
        [] => *current = value,
        [PathKey::Key(key), rest @ ..] => {
            let array_index = if current.is_array() {
                key.parse::<usize>().ok()
            } else {
                None
            };
            match array_index {
                Some(index) => write_index(current, index, rest, value),
                None => write_key(current, key, rest, value),
            }
        }
        [PathKey::Index(index), rest @ ..] => write_index(current, *index, rest, value),
    }
}

fn write_key(current: &mut FormValue, key: &str, rest: &[PathKey], value: FormValue) {
    let mut record = match std::mem::take(current) {
        FormValue::Object(record) if record.is_frozen() => Arc::new(record.thawed()),
        FormValue::Object(record) => record,
        _ => Arc::default(),
    };
    let slot = Arc::make_mut(&mut record)
        .entry(key.to_owned())
        .or_default();
    write_at(slot, rest, value);
    *current = FormValue::Object(record);
}

fn write_index(current: &mut FormValue, index: usize, rest: &[PathKey], value: FormValue) {
    let mut items = match std::mem::take(current) {
        FormValue::Array(items) => items,
        _ => Arc::default(),
    };
    let slots = Arc::make_mut(&mut items);
    if slots.len() <= index {
        slots.resize(index + 1, FormValue::Undefined);
    }
    write_at(&mut slots[index], rest, value);
    *current = FormValue::Array(items);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    // ========================================================================
    // get
    // ========================================================================

    #[test]
    fn test_get_nested() {
        let root = FormValue::from(json!({"a": {"b": [10, {"c": "x"}]}}));
        assert_eq!(get(&root, &p("a.b[0]")), Some(&FormValue::from(10)));
        assert_eq!(get(&root, &p("a.b[1].c")).and_then(|v| v.as_str()), Some("x"));
    }

    #[test]
    fn test_get_is_total() {
        let root = FormValue::from(json!({"a": {"b": [1]}, "n": null, "s": "str"}));
        assert!(get(&root, &p("missing")).is_none());
        assert!(get(&root, &p("a.b[5]")).is_none());
        assert!(get(&root, &p("s[0]")).is_none());
        assert!(get(&root, &p("n")).is_none());
        assert!(get(&root, &p("n.deeper")).is_none());
        assert!(get_str(&root, "a[-1]").is_none());
    }

    #[test]
    fn test_get_numeric_key_on_array() {
        let root = FormValue::from(json!({"list": ["a", "b"]}));
        assert_eq!(get_str(&root, "list.1").and_then(|v| v.as_str()), Some("b"));
        assert_eq!(
            get_keys(&root, &crate::field_path!("list", 0)).and_then(|v| v.as_str()),
            Some("a")
        );
    }

    // ========================================================================
    // set
    // ========================================================================

    #[test]
    fn test_set_round_trip() {
        let root = FormValue::from(json!({"user": {"name": "Ada"}}));
        let next = set(&root, &p("user.email"), FormValue::from("ada@example.com")).unwrap();
        assert_eq!(
            get(&next, &p("user.email")).and_then(|v| v.as_str()),
            Some("ada@example.com")
        );
        // Input untouched.
        assert!(get(&root, &p("user.email")).is_none());
    }

    #[test]
    fn test_set_preserves_sibling_identity() {
        let root = FormValue::from(json!({"a": {"x": 1}, "b": {"y": [1, 2]}}));
        let next = set(&root, &p("a.x"), FormValue::from(2)).unwrap();

        let old_b = get(&root, &p("b")).unwrap();
        let new_b = get(&next, &p("b")).unwrap();
        assert!(old_b.ptr_eq(new_b));

        let old_a = get(&root, &p("a")).unwrap();
        let new_a = get(&next, &p("a")).unwrap();
        assert!(!old_a.ptr_eq(new_a));
    }

    #[test]
    fn test_set_materializes_placeholders() {
        let next = set(&FormValue::object(), &p("a[2].b"), FormValue::from("v")).unwrap();
        let items = get(&next, &p("a")).and_then(FormValue::as_array).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_undefined());
        assert!(items[1].is_undefined());
        assert_eq!(items[2], json!({"b": "v"}));
    }

    #[test]
    fn test_set_nested_indices() {
        let next = set(&FormValue::object(), &p("m[1][0]"), FormValue::from(true)).unwrap();
        assert_eq!(next, json!({"m": [null, [true]]}));
    }

    #[test]
    fn test_set_coerces_wrong_container() {
        let root = FormValue::from(json!({"a": "text", "b": [1]}));
        let next = set(&root, &p("a[0]"), FormValue::from(1)).unwrap();
        assert_eq!(get(&next, &p("a")), Some(&FormValue::from(json!([1]))));

        let next = set(&root, &p("b.key"), FormValue::from(1)).unwrap();
        assert_eq!(get(&next, &p("b")), Some(&FormValue::from(json!({"key": 1}))));
    }

    #[test]
    fn test_set_single_key_replaces() {
        let root = FormValue::from(json!({"a": 1, "b": {"c": 2}}));
        let next = set(&root, &p("a"), FormValue::from(5)).unwrap();
        assert_eq!(next, json!({"a": 5, "b": {"c": 2}}));
        assert!(get(&root, &p("b")).unwrap().ptr_eq(get(&next, &p("b")).unwrap()));
    }

    #[test]
    fn test_set_rejects_scalar_root() {
        let err = set(&FormValue::from(1), &p("a"), FormValue::Null).unwrap_err();
        assert_eq!(err, PathError::InvalidTarget { found: "number" });
    }

    #[test]
    fn test_set_through_frozen_child_thaws_copy() {
        let mut inner = Record::new();
        inner.insert("x".into(), FormValue::from(1));
        let mut outer = Record::new();
        outer.insert("cfg".into(), FormValue::from(inner.frozen()));
        let root = FormValue::from(outer);

        let next = set(&root, &p("cfg.x"), FormValue::from(2)).unwrap();
        let cfg = get(&next, &p("cfg")).and_then(FormValue::as_object).unwrap();
        assert!(!cfg.is_frozen());
        assert_eq!(get(&root, &p("cfg.x")), Some(&FormValue::from(1)));
    }

    #[test]
    fn test_set_rejects_huge_index() {
        let root = FormValue::from(json!({"a": [1]}));
        assert_eq!(
            set(&root, &p("a[18446744073709551615]"), FormValue::from(1)),
            Err(PathError::IndexTooLarge {
                index: usize::MAX,
                max: MAX_INDEX
            })
        );
        assert!(matches!(
            set(&root, &p("a.10000000000"), FormValue::from(1)),
            Err(PathError::IndexTooLarge { .. })
        ));
        assert!(set(&root, &p(&format!("a[{MAX_INDEX}]")), FormValue::from(1)).is_ok());
    }

    #[test]
    fn test_numeric_object_key_is_not_bounded() {
        let root = FormValue::from(json!({"ids": {}}));
        let next = set(&root, &p("ids.10000000000"), FormValue::from(true)).unwrap();
        assert_eq!(next, json!({"ids": {"10000000000": true}}));
    }

    // ========================================================================
    // assign
    // ========================================================================

    #[test]
    fn test_assign_in_place() {
        let mut root = FormValue::from(json!({"a": 1}));
        assign(&mut root, &p("b.c"), FormValue::from(2)).unwrap();
        assert_eq!(root, json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn test_assign_huge_index_leaves_root() {
        let mut root = FormValue::from(json!({"a": 1}));
        let before = root.clone();
        let err = assign(&mut root, &p("rows[0].cells[4000000000]"), FormValue::Null).unwrap_err();
        assert!(matches!(err, PathError::IndexTooLarge { index: 4_000_000_000, .. }));
        assert!(root.ptr_eq(&before));
    }

    #[test]
    fn test_assign_frozen_root() {
        let mut record = Record::new();
        record.insert("a".into(), FormValue::from(1));
        let mut root = FormValue::from(record.frozen());
        let err = assign(&mut root, &p("a"), FormValue::from(2)).unwrap_err();
        assert!(matches!(err, PathError::FrozenTarget { .. }));
        assert_eq!(root, json!({"a": 1}));
    }
}
