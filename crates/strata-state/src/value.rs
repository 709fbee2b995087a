//! The form value tree.
//!
//! `FormValue` is a JSON-like value whose containers live behind `Arc`. Cloning
//! a value is O(1) and shares every container; writers go through
//! `Arc::make_mut`, so only the containers on the written path are copied and
//! untouched siblings keep their identity (see [`FormValue::ptr_eq`]).

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A value owned by the host application that the form engine must never
/// traverse or copy (keyed collections, weak collections, reactive wrappers,
/// UI nodes).
///
/// Deep clones share the handle, equality is handle identity, and clearing
/// delegates to [`HostValue::clear`].
pub trait HostValue: fmt::Debug + Send + Sync {
    /// Short type label used in diagnostics (`"map"`, `"weak_set"`, ...).
    fn kind(&self) -> &'static str;

    /// Empty the value in place. Types that cannot be emptied keep the no-op.
    fn clear(&self) {}
}

/// Shared handle to a [`HostValue`].
#[derive(Clone)]
pub struct HostRef(Arc<dyn HostValue>);

impl HostRef {
    /// Wrap a host value.
    pub fn new(value: impl HostValue + 'static) -> Self {
        Self(Arc::new(value))
    }

    /// Wrap an already shared host value.
    pub fn from_arc(value: Arc<dyn HostValue>) -> Self {
        Self(value)
    }

    /// Returns true if both handles point at the same host value.
    #[inline]
    pub fn ptr_eq(&self, other: &HostRef) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0).cast::<()>(),
            Arc::as_ptr(&other.0).cast::<()>(),
        )
    }
}

impl Deref for HostRef {
    type Target = dyn HostValue;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Host").field(&self.0).finish()
    }
}

/// Key/value container backing [`FormValue::Object`]. Keys keep insertion
/// order.
///
/// A frozen record is never mutated in place: clearing skips it and
/// copy-on-write writers produce an unfrozen copy.
#[derive(Clone, Debug, Default)]
pub struct Record {
    entries: IndexMap<String, FormValue>,
    frozen: bool,
}

impl Record {
    /// Create an empty, unfrozen record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark this record frozen.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Builder form of [`Record::freeze`].
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// Returns true if the record is frozen.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Copy of the entries without the frozen flag.
    pub fn thawed(&self) -> Record {
        Record {
            entries: self.entries.clone(),
            frozen: false,
        }
    }
}

impl Deref for Record {
    type Target = IndexMap<String, FormValue>;

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl DerefMut for Record {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entries
    }
}

impl FromIterator<(String, FormValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FormValue)>>(iter: I) -> Self {
        Record {
            entries: iter.into_iter().collect(),
            frozen: false,
        }
    }
}

/// A value in the form state tree.
#[derive(Clone, Debug, Default)]
pub enum FormValue {
    /// No value. Used for array placeholders and cleared touched flags.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(Number),
    /// String.
    String(String),
    /// Timestamp in milliseconds since the Unix epoch.
    Date(i64),
    /// Array container.
    Array(Arc<Vec<FormValue>>),
    /// Object container.
    Object(Arc<Record>),
    /// Opaque host-owned value.
    Host(HostRef),
}

impl FormValue {
    /// An empty object.
    #[inline]
    pub fn object() -> Self {
        FormValue::Object(Arc::default())
    }

    /// An empty array.
    #[inline]
    pub fn array() -> Self {
        FormValue::Array(Arc::default())
    }

    /// A date from epoch milliseconds.
    #[inline]
    pub fn date(millis: i64) -> Self {
        FormValue::Date(millis)
    }

    /// Wrap a host value.
    pub fn host(value: impl HostValue + 'static) -> Self {
        FormValue::Host(HostRef::new(value))
    }

    /// Returns true for `Undefined`.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, FormValue::Undefined)
    }

    /// Returns true for `Undefined` and `Null`.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, FormValue::Undefined | FormValue::Null)
    }

    /// Returns true for objects.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, FormValue::Object(_))
    }

    /// Returns true for arrays.
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, FormValue::Array(_))
    }

    /// Returns true for objects and arrays.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, FormValue::Object(_) | FormValue::Array(_))
    }

    /// Truthiness as used when deciding whether an error or touched flag is set:
    /// undefined, null, `false`, `0` and `""` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FormValue::Undefined | FormValue::Null => false,
            FormValue::Bool(b) => *b,
            FormValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            FormValue::String(s) => !s.is_empty(),
            FormValue::Date(_)
            | FormValue::Array(_)
            | FormValue::Object(_)
            | FormValue::Host(_) => true,
        }
    }

    /// Borrow the record of an object.
    #[inline]
    pub fn as_object(&self) -> Option<&Record> {
        match self {
            FormValue::Object(record) => Some(record),
            _ => None,
        }
    }

    /// Mutably borrow the record of an object, copying it first if shared.
    #[inline]
    pub fn as_object_mut(&mut self) -> Option<&mut Record> {
        match self {
            FormValue::Object(record) => Some(Arc::make_mut(record)),
            _ => None,
        }
    }

    /// Borrow the items of an array.
    #[inline]
    pub fn as_array(&self) -> Option<&Vec<FormValue>> {
        match self {
            FormValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Mutably borrow the items of an array, copying them first if shared.
    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<FormValue>> {
        match self {
            FormValue::Array(items) => Some(Arc::make_mut(items)),
            _ => None,
        }
    }

    /// Borrow a string.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read a number as `f64`.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FormValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Borrow a host handle.
    #[inline]
    pub fn as_host(&self) -> Option<&HostRef> {
        match self {
            FormValue::Host(host) => Some(host),
            _ => None,
        }
    }

    /// Returns true if both values are the same container (or the same host
    /// handle). Scalars never share identity.
    pub fn ptr_eq(&self, other: &FormValue) -> bool {
        match (self, other) {
            (FormValue::Array(a), FormValue::Array(b)) => Arc::ptr_eq(a, b),
            (FormValue::Object(a), FormValue::Object(b)) => Arc::ptr_eq(a, b),
            (FormValue::Host(a), FormValue::Host(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            FormValue::Undefined => "undefined",
            FormValue::Null => "null",
            FormValue::Bool(_) => "boolean",
            FormValue::Number(_) => "number",
            FormValue::String(_) => "string",
            FormValue::Date(_) => "date",
            FormValue::Array(_) => "array",
            FormValue::Object(_) => "object",
            FormValue::Host(_) => "host",
        }
    }

    /// Convert to plain JSON. Undefined and host values become `null`, dates
    /// become their millisecond timestamp.
    pub fn to_json(&self) -> Value {
        match self {
            FormValue::Undefined | FormValue::Null | FormValue::Host(_) => Value::Null,
            FormValue::Bool(b) => Value::Bool(*b),
            FormValue::Number(n) => Value::Number(n.clone()),
            FormValue::String(s) => Value::String(s.clone()),
            FormValue::Date(ms) => Value::from(*ms),
            FormValue::Array(items) => Value::Array(items.iter().map(FormValue::to_json).collect()),
            FormValue::Object(record) => Value::Object(
                record
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for FormValue {
    fn eq(&self, other: &Self) -> bool {
        crate::object::deep_equal(self, other)
    }
}

/// Compares the JSON rendering, so `Undefined` equals `null`.
impl PartialEq<Value> for FormValue {
    fn eq(&self, other: &Value) -> bool {
        self.to_json() == *other
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => FormValue::Number(n),
            Value::String(s) => FormValue::String(s),
            Value::Array(items) => {
                FormValue::Array(Arc::new(items.into_iter().map(FormValue::from).collect()))
            }
            Value::Object(map) => FormValue::Object(Arc::new(
                map.into_iter().map(|(k, v)| (k, FormValue::from(v))).collect(),
            )),
        }
    }
}

impl From<&Value> for FormValue {
    fn from(value: &Value) -> Self {
        FormValue::from(value.clone())
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(s.to_owned())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(s)
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        FormValue::Number(n.into())
    }
}

impl From<i32> for FormValue {
    fn from(n: i32) -> Self {
        FormValue::Number(n.into())
    }
}

impl From<u64> for FormValue {
    fn from(n: u64) -> Self {
        FormValue::Number(n.into())
    }
}

impl From<f64> for FormValue {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(FormValue::Null, FormValue::Number)
    }
}

impl From<Vec<FormValue>> for FormValue {
    fn from(items: Vec<FormValue>) -> Self {
        FormValue::Array(Arc::new(items))
    }
}

impl From<Record> for FormValue {
    fn from(record: Record) -> Self {
        FormValue::Object(Arc::new(record))
    }
}

impl From<HostRef> for FormValue {
    fn from(host: HostRef) -> Self {
        FormValue::Host(host)
    }
}

impl<T: Into<FormValue>> From<Option<T>> for FormValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FormValue::Undefined, Into::into)
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FormValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FormValue::from)
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Undefined => write!(f, "undefined"),
            FormValue::String(s) => write!(f, "{s}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
