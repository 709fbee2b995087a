//! Form state tree and path addressing.
//!
//! `strata-state` is the data layer under `strata-form`. It provides:
//!
//! - **FormValue**: a structurally shared value tree (values, errors and
//!   touched flags all use it)
//! - **FieldPath**: dot/bracket path parsing (`"contacts[0].address.city"`)
//! - **get / set / assign**: total reads and copy-on-write writes by path
//! - **deep_clone / deep_equal / clear_in_place / apply_state**: whole-tree
//!   utilities that respect frozen records and opaque host values
//!
//! # Quick Start
//!
//! ```
//! use strata_state::{get, set, FieldPath, FormValue};
//! use serde_json::json;
//!
//! let values = FormValue::from(json!({"user": {"name": "Ada"}, "tags": ["a"]}));
//! let path = FieldPath::parse("user.email").unwrap();
//!
//! let next = set(&values, &path, FormValue::from("ada@example.com")).unwrap();
//! assert_eq!(get(&next, &path).and_then(|v| v.as_str()), Some("ada@example.com"));
//!
//! // The input is unchanged and untouched branches are shared.
//! assert!(get(&values, &path).is_none());
//! let tags = FieldPath::parse("tags").unwrap();
//! assert!(get(&values, &tags).unwrap().ptr_eq(get(&next, &tags).unwrap()));
//! ```

mod accessor;
mod error;
mod object;
mod path;
mod value;

pub use accessor::{assign, get, get_keys, get_str, set, MAX_INDEX};
pub use error::{PathError, PathResult};
pub use object::{apply_state, clear_in_place, deep_clone, deep_equal, ApplyOptions, ClearOptions};
pub use path::{construct_path, parse_segment, split, FieldPath, PathKey, Segment};
pub use value::{FormValue, HostRef, HostValue, Record};
