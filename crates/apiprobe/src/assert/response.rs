//! Whole-response predicates

use apiprobe_core::ClassifiedError;
use serde_json::Value;

use crate::response::HttpResponse;

/// The status code is one of `allowed`
pub fn status_in(
    allowed: impl IntoIterator<Item = u16>,
) -> impl Fn(&HttpResponse) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let allowed: Vec<u16> = allowed.into_iter().collect();
    move |response| {
        let status = response.status.as_u16();
        if allowed.contains(&status) {
            Ok(())
        } else {
            Err(ClassifiedError::assertion(format!(
                "status code {status} is not one of {allowed:?}"
            ))
            .with_name("status code")
            .with_actual(status)
            .with_expected(Value::from(allowed.clone())))
        }
    }
}

/// The body is at most `limit` bytes long
pub fn max_body_len(
    limit: usize,
) -> impl Fn(&HttpResponse) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    move |response| {
        let len = response.body.len();
        if len <= limit {
            Ok(())
        } else {
            Err(ClassifiedError::assertion(format!(
                "body is {len} bytes, limit is {limit}"
            ))
            .with_name("body length")
            .with_actual(len)
            .with_expected(limit))
        }
    }
}
