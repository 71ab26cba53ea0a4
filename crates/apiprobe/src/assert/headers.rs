//! Header predicates
//!
//! Header names are matched case-insensitively. When a header repeats, a
//! predicate passes if any of its values satisfies it.

use apiprobe_core::ClassifiedError;
use reqwest::header::HeaderMap;

fn values<'a>(headers: &'a HeaderMap, name: &str) -> Vec<&'a str> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect()
}

fn missing(name: &str) -> ClassifiedError {
    ClassifiedError::assertion(format!("header `{name}` is missing")).with_name(name)
}

/// The header is present
pub fn present(
    name: impl Into<String>,
) -> impl Fn(&HeaderMap) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let name = name.into();
    move |headers| {
        if headers.contains_key(name.as_str()) {
            Ok(())
        } else {
            Err(missing(&name))
        }
    }
}

/// The header is absent
pub fn not_present(
    name: impl Into<String>,
) -> impl Fn(&HeaderMap) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let name = name.into();
    move |headers| {
        if !headers.contains_key(name.as_str()) {
            return Ok(());
        }
        let actual = values(headers, &name).first().copied().unwrap_or_default();
        Err(
            ClassifiedError::assertion(format!("header `{name}` must not be present"))
                .with_name(name.as_str())
                .with_actual(actual),
        )
    }
}

/// A value of the header equals `expected`
pub fn equal(
    name: impl Into<String>,
    expected: impl Into<String>,
) -> impl Fn(&HeaderMap) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let name = name.into();
    let expected = expected.into();
    move |headers| {
        let found = values(headers, &name);
        if found.is_empty() {
            return Err(missing(&name).with_expected(expected.as_str()));
        }
        if found.iter().any(|value| *value == expected) {
            Ok(())
        } else {
            Err(ClassifiedError::assertion(format!(
                "header `{name}` is `{}`, expected `{expected}`",
                found.join(", ")
            ))
            .with_name(name.as_str())
            .with_actual(found.join(", "))
            .with_expected(expected.as_str()))
        }
    }
}

/// A value of the header contains `needle`
pub fn contains(
    name: impl Into<String>,
    needle: impl Into<String>,
) -> impl Fn(&HeaderMap) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let name = name.into();
    let needle = needle.into();
    move |headers| {
        let found = values(headers, &name);
        if found.is_empty() {
            return Err(missing(&name).with_expected(needle.as_str()));
        }
        if found.iter().any(|value| value.contains(needle.as_str())) {
            Ok(())
        } else {
            Err(ClassifiedError::assertion(format!(
                "header `{name}` does not contain `{needle}`"
            ))
            .with_name(name.as_str())
            .with_actual(found.join(", "))
            .with_expected(needle.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json; charset=utf-8"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers
    }

    #[test]
    fn test_presence_is_case_insensitive() {
        assert!(present("Content-Type")(&headers()).is_ok());
        assert!(present("x-request-id")(&headers()).is_err());
        assert!(not_present("x-request-id")(&headers()).is_ok());
        assert!(not_present("CONTENT-TYPE")(&headers()).is_err());
    }

    #[test]
    fn test_equal_matches_any_repeated_value() {
        assert!(equal("set-cookie", "b=2")(&headers()).is_ok());
        let err = equal("set-cookie", "c=3")(&headers()).unwrap_err();
        assert_eq!(err.actual().and_then(|v| v.as_str()), Some("a=1, b=2"));
    }

    #[test]
    fn test_contains() {
        assert!(contains("content-type", "json")(&headers()).is_ok());
        assert!(contains("content-type", "xml")(&headers()).is_err());
        let err = contains("x-missing", "a")(&headers()).unwrap_err();
        assert!(err.message().contains("missing"));
    }
}
