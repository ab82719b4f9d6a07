//! Shared data models for records and identifier values
//!
//! Records are opaque JSON values. The engine only ever looks at two kinds of
//! top-level fields, and this naming is the whole contract between a REST store
//! and the resolver:
//!
//! - a field named exactly after a parameter (`userId`) carries that
//!   parameter's identifier
//! - a field named after a parameter plus [`RECORD_SUFFIX`] (`userIdRecord`)
//!   carries the full record for that parameter, embedded
//!
//! JSON `null` is treated as "not there" in both cases.

use serde_json::Value;
use std::collections::BTreeMap;

/// A record returned by a store or supplied by the caller.
pub type Record = Value;

/// An identifier value: a JSON scalar.
pub type IdValue = Value;

/// Routing values keyed by parameter name, as produced by a router.
pub type RoutingValues = BTreeMap<String, IdValue>;

/// Suffix of the field that embeds a child record.
pub const RECORD_SUFFIX: &str = "Record";

/// Suffix used for the list payload in [`element data`](crate::resolver::LoadResult::element_data).
pub const LIST_SUFFIX: &str = "List";

/// Name of the field embedding the record for `param`.
#[must_use]
pub fn record_field(param: &str) -> String {
    format!("{param}{RECORD_SUFFIX}")
}

/// Returns the field `name` of `record` if the record is an object and the
/// field holds something other than `null`.
#[must_use]
pub fn defined_field<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
    record.as_object()?.get(name).filter(|value| !value.is_null())
}

/// Render an identifier for use in a URL path or query string.
///
/// Strings are used verbatim; numbers and booleans use their JSON form.
#[must_use]
pub fn render_id(value: &IdValue) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a routing value typed on a command line.
///
/// Anything that parses as a JSON number or boolean keeps that type, everything
/// else becomes a string. `null` stays `null` (an unknown value).
#[must_use]
pub fn parse_scalar(raw: &str) -> IdValue {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => value,
        _ => Value::String(raw.to_string()),
    }
}
