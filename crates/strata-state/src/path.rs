//! Field path parsing.
//!
//! A field path is a dot-delimited list of segments, each a property name
//! optionally followed by bracketed array indices: `"contacts[0].address.city"`,
//! `"matrix[1][2]"`. Parsing never panics; malformed input yields a
//! [`PathError`].

use crate::error::{PathError, PathResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single step into a value: a property name or an array index.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    /// Object property.
    Key(String),
    /// Array position.
    Index(usize),
}

impl PathKey {
    /// Create a key step.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        PathKey::Key(k.into())
    }

    /// Create an index step.
    #[inline]
    pub fn index(i: usize) -> Self {
        PathKey::Index(i)
    }

    /// Get the key if this is a key step.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathKey::Key(k) => Some(k),
            PathKey::Index(_) => None,
        }
    }

    /// Get the index if this is an index step.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathKey::Key(_) => None,
            PathKey::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Key(k) => write!(f, "{k}"),
            PathKey::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl From<String> for PathKey {
    fn from(s: String) -> Self {
        PathKey::Key(s)
    }
}

impl From<&str> for PathKey {
    fn from(s: &str) -> Self {
        PathKey::Key(s.to_owned())
    }
}

impl From<usize> for PathKey {
    fn from(i: usize) -> Self {
        PathKey::Index(i)
    }
}

/// One dot-delimited piece of a field path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Property name. Never empty.
    pub key: String,
    /// Array indices applied, in order, to the property's value.
    pub indices: Vec<usize>,
}

impl Segment {
    /// A segment without indices.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            indices: Vec::new(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)?;
        for i in &self.indices {
            write!(f, "[{i}]")?;
        }
        Ok(())
    }
}

/// Parse one dot-delimited piece such as `"items[2][0]"`.
pub fn parse_segment(segment: &str) -> PathResult<Segment> {
    let (key, mut rest) = match segment.find('[') {
        Some(pos) => segment.split_at(pos),
        None => (segment, ""),
    };
    if key.is_empty() {
        return Err(PathError::empty_key(segment));
    }
    if key.contains(']') {
        return Err(PathError::malformed_brackets(segment));
    }

    let mut indices = Vec::new();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err(PathError::malformed_brackets(segment));
        };
        let Some(close) = body.find(']') else {
            return Err(PathError::malformed_brackets(segment));
        };
        let token = &body[..close];
        indices.push(parse_index(segment, token)?);
        rest = &body[close + 1..];
    }

    Ok(Segment {
        key: key.to_owned(),
        indices,
    })
}

fn parse_index(segment: &str, token: &str) -> PathResult<usize> {
    if let Some(digits) = token.strip_prefix('-') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PathError::negative_index(segment, token));
        }
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::invalid_index(segment, token));
    }
    token
        .parse()
        .map_err(|_| PathError::invalid_index(segment, token))
}

/// Split a full path on `.` and parse every piece.
pub fn split(path: &str) -> PathResult<Vec<Segment>> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    path.split('.').map(parse_segment).collect()
}

/// Render a key list in canonical form: `["a", 0, "b"]` becomes `"a[0].b"`.
pub fn construct_path(keys: &[PathKey]) -> String {
    let mut out = String::new();
    for key in keys {
        match key {
            PathKey::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            PathKey::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
        }
    }
    out
}

/// A parsed, non-empty field path.
///
/// # Examples
///
/// ```
/// use strata_state::FieldPath;
///
/// let path: FieldPath = "contacts[0].city".parse().unwrap();
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.to_string(), "contacts[0].city");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// Parse a dot/bracket path string.
    pub fn parse(path: &str) -> PathResult<Self> {
        split(path).map(Self)
    }

    /// A single-segment path.
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![Segment::new(key)])
    }

    /// Build a path from a flat key list as reported by validation engines.
    ///
    /// A leading index has no property to apply to and is used as a key
    /// (`[0, "name"]` becomes `"0.name"`). String keys are parsed like path
    /// text, so `"a.b"` nests and `"items[2]"` carries an index.
    pub fn from_keys(keys: &[PathKey]) -> PathResult<Self> {
        let mut segments: Vec<Segment> = Vec::new();
        for key in keys {
            match key {
                PathKey::Key(k) => {
                    for piece in k.split('.') {
                        segments.push(parse_segment(piece)?);
                    }
                }
                PathKey::Index(i) => match segments.last_mut() {
                    Some(last) => last.indices.push(*i),
                    None => segments.push(Segment::new(i.to_string())),
                },
            }
        }
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments))
    }

    /// Append a property segment (builder pattern).
    pub fn child(mut self, key: impl Into<String>) -> Self {
        self.0.push(Segment::new(key));
        self
    }

    /// Append an index to the last segment (builder pattern).
    pub fn with_index(mut self, index: usize) -> Self {
        if let Some(last) = self.0.last_mut() {
            last.indices.push(index);
        }
        self
    }

    /// The parsed segments.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of dot-delimited segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a parsed path; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name of the top-level property this path writes into.
    #[inline]
    pub fn root_key(&self) -> Option<&str> {
        self.0.first().map(|s| s.key.as_str())
    }

    /// Flatten into individual key and index steps.
    pub fn keys(&self) -> Vec<PathKey> {
        let mut out = Vec::with_capacity(self.0.len());
        for segment in &self.0 {
            out.push(PathKey::Key(segment.key.clone()));
            out.extend(segment.indices.iter().copied().map(PathKey::Index));
        }
        out
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// Build a `Vec<PathKey>` from literals, the shape validation engines use to
/// report issue locations.
///
/// ```
/// use strata_state::{field_path, PathKey};
///
/// let keys = field_path!("users", 0, "email");
/// assert_eq!(keys[1], PathKey::Index(0));
/// ```
#[macro_export]
macro_rules! field_path {
    () => {
        ::std::vec::Vec::<$crate::PathKey>::new()
    };
    ($($seg:expr),+ $(,)?) => {
        ::std::vec![$($crate::PathKey::from($seg)),+]
    };
}
