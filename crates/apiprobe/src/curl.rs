//! Render a prepared request as an equivalent curl command

use crate::request::{MultipartField, PreparedRequest, RequestBody};

/// Render `request` as a single-line curl command
///
/// Values are single-quoted for a POSIX shell. Multipart file parts are shown
/// by file name only since their bytes are not on disk.
pub fn to_curl(request: &PreparedRequest) -> String {
    let mut parts = vec!["curl".to_string(), "-X".to_string(), request.method.to_string()];

    for (name, value) in &request.headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        parts.push("-H".to_string());
        parts.push(quote(&format!("{}: {}", name.as_str(), value)));
    }

    match &request.body {
        RequestBody::Empty => {}
        RequestBody::Bytes(bytes) => {
            parts.push("--data-binary".to_string());
            parts.push(quote(&String::from_utf8_lossy(bytes)));
        }
        RequestBody::Multipart(fields) => {
            for field in fields {
                let form = match field {
                    MultipartField::Text { name, value } => format!("{name}={value}"),
                    MultipartField::File {
                        name,
                        file_name,
                        content_type: Some(mime),
                        ..
                    } => format!("{name}=@{file_name};type={mime}"),
                    MultipartField::File {
                        name, file_name, ..
                    } => format!("{name}=@{file_name}"),
                };
                parts.push("-F".to_string());
                parts.push(quote(&form));
            }
        }
    }

    parts.push(quote(request.url.as_str()));
    parts.join(" ")
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
