//! JSON-path predicates over the response body
//!
//! Every predicate parses the body as JSON, evaluates a JSON-path expression
//! and compares the first match. Failures carry the path as their name and
//! the observed and expected values as fields.
//!
//! ```rust
//! use apiprobe::assert::json;
//!
//! let check = json::equal("$.user.name", "alice");
//! assert!(check(&br#"{"user": {"name": "alice"}}"#[..]).is_ok());
//! assert!(check(&br#"{"user": {"name": "bob"}}"#[..]).is_err());
//! ```

use apiprobe_core::ClassifiedError;
use jsonpath_rust::{JsonPath, JsonPathValue};
use serde_json::Value;
use std::str::FromStr;

/// Evaluate `path` against `document`, returning every match
pub fn select(document: &Value, path: &str) -> Result<Vec<Value>, ClassifiedError> {
    let compiled = JsonPath::from_str(path).map_err(|e| {
        ClassifiedError::assertion(format!("invalid JSON path `{path}`: {e}")).with_name(path)
    })?;

    Ok(compiled
        .find_slice(document)
        .into_iter()
        .filter_map(|found| match found {
            JsonPathValue::Slice(value, _) => Some(value.clone()),
            JsonPathValue::NewValue(value) => Some(value),
            JsonPathValue::NoValue => None,
        })
        .collect())
}

fn parse(body: &[u8]) -> Result<Value, ClassifiedError> {
    serde_json::from_slice(body).map_err(|e| {
        ClassifiedError::assertion(format!("response body is not valid JSON: {e}"))
            .with_source(e)
    })
}

/// First match of `path` in `body`, or an error when nothing matches
fn first(body: &[u8], path: &str) -> Result<Value, ClassifiedError> {
    let document = parse(body)?;
    select(&document, path)?
        .into_iter()
        .next()
        .ok_or_else(|| ClassifiedError::assertion(format!("no value at `{path}`")).with_name(path))
}

fn mismatch(path: &str, message: String, actual: Value, expected: Value) -> ClassifiedError {
    ClassifiedError::assertion(message)
        .with_name(path)
        .with_actual(actual)
        .with_expected(expected)
}

fn len_of(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        Value::String(s) => Some(s.chars().count()),
        _ => None,
    }
}

fn is_empty_value(value: &Value) -> bool {
    value.is_null() || len_of(value) == Some(0)
}

/// The value at `path` equals `expected`
pub fn equal(
    path: impl Into<String>,
    expected: impl Into<Value>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let path = path.into();
    let expected = expected.into();
    move |body| {
        let actual = first(body, &path)?;
        if actual == expected {
            Ok(())
        } else {
            Err(mismatch(
                &path,
                format!("`{path}` is {actual}, expected {expected}"),
                actual,
                expected.clone(),
            ))
        }
    }
}

/// The value at `path` differs from `unexpected`
pub fn not_equal(
    path: impl Into<String>,
    unexpected: impl Into<Value>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let path = path.into();
    let unexpected = unexpected.into();
    move |body| {
        let actual = first(body, &path)?;
        if actual != unexpected {
            Ok(())
        } else {
            Err(mismatch(
                &path,
                format!("`{path}` must not be {unexpected}"),
                actual,
                unexpected.clone(),
            ))
        }
    }
}

/// The value at `path` contains `needle`
///
/// Strings match substrings, arrays match elements and objects match keys.
pub fn contains(
    path: impl Into<String>,
    needle: impl Into<Value>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let path = path.into();
    let needle = needle.into();
    move |body| {
        let actual = first(body, &path)?;
        let found = match (&actual, &needle) {
            (Value::String(haystack), Value::String(n)) => haystack.contains(n.as_str()),
            (Value::Array(items), n) => items.contains(n),
            (Value::Object(map), Value::String(key)) => map.contains_key(key),
            _ => false,
        };
        if found {
            Ok(())
        } else {
            Err(mismatch(
                &path,
                format!("`{path}` does not contain {needle}"),
                actual,
                needle.clone(),
            ))
        }
    }
}

/// The array, object or string at `path` has `expected` elements
pub fn length(
    path: impl Into<String>,
    expected: usize,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let path = path.into();
    move |body| {
        let actual = first(body, &path)?;
        match len_of(&actual) {
            Some(len) if len == expected => Ok(()),
            Some(len) => Err(mismatch(
                &path,
                format!("`{path}` has length {len}, expected {expected}"),
                Value::from(len),
                Value::from(expected),
            )),
            None => Err(mismatch(
                &path,
                format!("`{path}` has no length"),
                actual,
                Value::from(expected),
            )),
        }
    }
}

fn numeric(
    path: String,
    bound: f64,
    op: &'static str,
    holds: fn(f64, f64) -> bool,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    move |body| {
        let actual = first(body, &path)?;
        match actual.as_f64() {
            Some(n) if holds(n, bound) => Ok(()),
            _ => Err(mismatch(
                &path,
                format!("`{path}` is {actual}, expected {op} {bound}"),
                actual,
                Value::from(bound),
            )),
        }
    }
}

/// The number at `path` is greater than `bound`
pub fn greater_than(
    path: impl Into<String>,
    bound: f64,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    numeric(path.into(), bound, ">", |n, b| n > b)
}

/// The number at `path` is less than `bound`
pub fn less_than(
    path: impl Into<String>,
    bound: f64,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    numeric(path.into(), bound, "<", |n, b| n < b)
}

/// `path` matches at least one value
pub fn present(
    path: impl Into<String>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let path = path.into();
    move |body| first(body, &path).map(|_| ())
}

/// `path` matches nothing
pub fn not_present(
    path: impl Into<String>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let path = path.into();
    move |body| {
        let document = parse(body)?;
        match select(&document, &path)?.into_iter().next() {
            None => Ok(()),
            Some(actual) => Err(ClassifiedError::assertion(format!(
                "`{path}` is present with value {actual}"
            ))
            .with_name(path.as_str())
            .with_actual(actual)),
        }
    }
}

/// The value at `path` is null, or an empty array, object or string
pub fn empty(
    path: impl Into<String>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let path = path.into();
    move |body| {
        let actual = first(body, &path)?;
        if is_empty_value(&actual) {
            Ok(())
        } else {
            Err(ClassifiedError::assertion(format!("`{path}` is not empty"))
                .with_name(path.as_str())
                .with_actual(actual))
        }
    }
}

/// The value at `path` is present and not empty
pub fn not_empty(
    path: impl Into<String>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let path = path.into();
    move |body| {
        let actual = first(body, &path)?;
        if is_empty_value(&actual) {
            Err(ClassifiedError::assertion(format!("`{path}` is empty"))
                .with_name(path.as_str())
                .with_actual(actual))
        } else {
            Ok(())
        }
    }
}
