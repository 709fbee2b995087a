//! Whole-tree utilities: deep clone, deep equality, clear-in-place and state
//! application.

use crate::value::{FormValue, Record};
use serde_json::Number;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Structural copy with fresh containers.
///
/// Primitives and dates are copied by value. Host values are shared, never
/// duplicated. The frozen flag is not carried over.
pub fn deep_clone(value: &FormValue) -> FormValue {
    match value {
        FormValue::Array(items) => FormValue::from(items.iter().map(deep_clone).collect::<Vec<_>>()),
        FormValue::Object(record) => FormValue::from(
            record
                .iter()
                .map(|(k, v)| (k.clone(), deep_clone(v)))
                .collect::<Record>(),
        ),
        other => other.clone(),
    }
}

/// Structural equality.
///
/// Numbers compare numerically, dates by timestamp, host values by handle
/// identity. A pair of containers already under comparison counts as equal
/// when met again.
pub fn deep_equal(a: &FormValue, b: &FormValue) -> bool {
    let mut visited = HashSet::new();
    equal_inner(a, b, &mut visited)
}

fn equal_inner(a: &FormValue, b: &FormValue, visited: &mut HashSet<(usize, usize)>) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    match (a, b) {
        (FormValue::Undefined, FormValue::Undefined) | (FormValue::Null, FormValue::Null) => true,
        (FormValue::Bool(x), FormValue::Bool(y)) => x == y,
        (FormValue::Number(x), FormValue::Number(y)) => numbers_equal(x, y),
        (FormValue::String(x), FormValue::String(y)) => x == y,
        (FormValue::Date(x), FormValue::Date(y)) => x == y,
        (FormValue::Array(x), FormValue::Array(y)) => {
            if !visited.insert((Arc::as_ptr(x) as usize, Arc::as_ptr(y) as usize)) {
                return true;
            }
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| equal_inner(l, r, visited))
        }
        (FormValue::Object(x), FormValue::Object(y)) => {
            if !visited.insert((Arc::as_ptr(x) as usize, Arc::as_ptr(y) as usize)) {
                return true;
            }
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| equal_inner(v, w, visited)))
        }
        (FormValue::Host(x), FormValue::Host(y)) => x.ptr_eq(y),
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    x == y || matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
}

/// Options for [`clear_in_place`].
#[derive(Clone, Debug)]
pub struct ClearOptions {
    /// Recurse into nested objects. Default: `true`.
    pub deep: bool,
    /// Keep emptied objects and arrays instead of removing them. Default: `false`.
    pub preserve_empty: bool,
    /// Dotted sub-paths (`"address.city"`) left untouched.
    pub exclude: HashSet<String>,
}

impl Default for ClearOptions {
    fn default() -> Self {
        Self {
            deep: true,
            preserve_empty: false,
            exclude: HashSet::new(),
        }
    }
}

impl ClearOptions {
    /// Set `deep`.
    #[must_use]
    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Set `preserve_empty`.
    #[must_use]
    pub fn preserve_empty(mut self, preserve_empty: bool) -> Self {
        self.preserve_empty = preserve_empty;
        self
    }

    /// Add excluded paths.
    #[must_use]
    pub fn exclude<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(paths.into_iter().map(Into::into));
        self
    }
}

// Original record pointer -> (original kept alive, cleared replacement).
type ClearMemo = HashMap<usize, (Arc<Record>, Arc<Record>)>;

/// Empty `value` without replacing it.
///
/// Per property of an object: excluded paths are kept; host values are
/// cleared through their handler and kept; arrays are removed (emptied when
/// `preserve_empty`); objects are recursed when `deep` and removed once empty
/// unless `preserve_empty`; everything else is removed. Frozen objects are
/// skipped. A root array is truncated and a root host value is cleared.
///
/// A record shared at several places in the tree is cleared once and every
/// occurrence is pointed at the cleared copy.
///
/// # Examples
///
/// ```
/// use strata_state::{clear_in_place, ClearOptions, FormValue};
/// use serde_json::json;
///
/// let mut value = FormValue::from(json!({"a": 1, "b": 2, "c": {"d": 3, "e": 4}}));
/// clear_in_place(&mut value, &ClearOptions::default().exclude(["b", "c.e"]));
/// assert_eq!(value, json!({"b": 2, "c": {"e": 4}}));
/// ```
pub fn clear_in_place(value: &mut FormValue, options: &ClearOptions) {
    match value {
        FormValue::Host(host) => host.clear(),
        FormValue::Array(items) => Arc::make_mut(items).clear(),
        FormValue::Object(record) => {
            if record.is_frozen() {
                tracing::debug!("skipping clear of frozen object");
                return;
            }
            let mut memo = ClearMemo::new();
            clear_record(record, "", options, &mut memo);
        }
        _ => {}
    }
}

fn clear_record(slot: &mut Arc<Record>, prefix: &str, options: &ClearOptions, memo: &mut ClearMemo) {
    let id = Arc::as_ptr(slot) as usize;
    if let Some((_, cleared)) = memo.get(&id) {
        *slot = Arc::clone(cleared);
        return;
    }
    let original = (Arc::strong_count(slot) > 1).then(|| Arc::clone(slot));

    let record = Arc::make_mut(slot);
    let keys: Vec<String> = record.keys().cloned().collect();
    for key in keys {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if options.exclude.contains(&path) {
            continue;
        }
        let remove = match record.get_mut(&key) {
            None => false,
            Some(FormValue::Host(host)) => {
                host.clear();
                false
            }
            Some(FormValue::Array(items)) => {
                if options.preserve_empty {
                    Arc::make_mut(items).clear();
                }
                !options.preserve_empty
            }
            Some(FormValue::Object(child)) => {
                if child.is_frozen() || !options.deep {
                    false
                } else {
                    clear_record(child, &path, options, memo);
                    child.is_empty() && !options.preserve_empty
                }
            }
            Some(_) => true,
        };
        if remove {
            record.shift_remove(&key);
        }
    }

    if let Some(original) = original {
        memo.insert(id, (original, Arc::clone(slot)));
    }
}

/// Options for [`apply_state`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ApplyOptions {
    /// Clear the target before merging.
    pub replace: bool,
}

/// Merge a deep copy of `source` into `target`.
///
/// Object keys overwrite, arrays append, and a target of a different kind is
/// replaced outright. With `replace`, the target is cleared first, even when
/// `source` is not a container and nothing is merged afterwards. A frozen
/// target object is left untouched.
pub fn apply_state(target: &mut FormValue, source: &FormValue, options: ApplyOptions) {
    if target.as_object().is_some_and(Record::is_frozen) {
        tracing::warn!("cannot apply state to a frozen object");
        return;
    }
    if options.replace {
        clear_in_place(target, &ClearOptions::default());
    }
    if !source.is_container() {
        tracing::debug!(found = source.type_name(), "ignoring non-container state");
        return;
    }
    match (target, deep_clone(source)) {
        (FormValue::Object(live), FormValue::Object(next)) => {
            let live = Arc::make_mut(live);
            for (k, v) in next.iter() {
                live.insert(k.clone(), v.clone());
            }
        }
        (FormValue::Array(live), FormValue::Array(next)) => {
            Arc::make_mut(live).extend(next.iter().cloned());
        }
        (live, next) => *live = next,
    }
}
