//! Raw body predicates

use apiprobe_core::ClassifiedError;

/// The body contains `needle` as a byte sequence
pub fn contains(
    needle: impl Into<Vec<u8>>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let needle = needle.into();
    move |body| {
        let found = needle.is_empty() || body.windows(needle.len()).any(|w| w == needle.as_slice());
        if found {
            Ok(())
        } else {
            let needle = String::from_utf8_lossy(&needle);
            Err(
                ClassifiedError::assertion(format!("body does not contain `{needle}`"))
                    .with_name("body")
                    .with_expected(needle.as_ref()),
            )
        }
    }
}

/// The body equals `expected` byte for byte
pub fn equal(
    expected: impl Into<Vec<u8>>,
) -> impl Fn(&[u8]) -> Result<(), ClassifiedError> + Send + Sync + 'static {
    let expected = expected.into();
    move |body| {
        if body == expected.as_slice() {
            Ok(())
        } else {
            Err(ClassifiedError::assertion("body does not match")
                .with_name("body")
                .with_actual(String::from_utf8_lossy(body).as_ref())
                .with_expected(String::from_utf8_lossy(&expected).as_ref()))
        }
    }
}
