use apiprobe_core::{ClassifiedError, ErrorKind, JsonSchema, Severity};
use bytes::Bytes;
use reqwest::Method;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::request::PreparedRequest;
use crate::transport::{HttpTransport, TransportError};

/// Where a JSON schema comes from
#[derive(Debug, Clone)]
pub enum SchemaSource {
    Inline(String),
    Bytes(Bytes),
    File(PathBuf),
    /// Fetched through the engine's transport on every attempt
    Url(Url),
}

/// A schema expectation registered on a test
#[derive(Debug, Clone)]
pub struct SchemaExpectation {
    source: SchemaSource,
    severity: Severity,
    trace: &'static Location<'static>,
    compiled: Option<Arc<JsonSchema>>,
}

impl SchemaExpectation {
    #[track_caller]
    pub fn new(source: SchemaSource, severity: Severity) -> Self {
        Self {
            source,
            severity,
            trace: Location::caller(),
            compiled: None,
        }
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn trace(&self) -> &'static Location<'static> {
        self.trace
    }

    /// Compile local sources ahead of the first attempt
    ///
    /// Remote sources are left for [`resolve`](Self::resolve).
    pub fn prepare(&mut self) -> apiprobe_core::Result<()> {
        let schema = match &self.source {
            SchemaSource::Inline(text) => JsonSchema::from_json_str(text)?,
            SchemaSource::Bytes(bytes) => JsonSchema::from_bytes(bytes)?,
            SchemaSource::File(path) => JsonSchema::from_file(path)?,
            SchemaSource::Url(_) => return Ok(()),
        };
        self.compiled = Some(Arc::new(schema));
        Ok(())
    }

    /// The compiled schema, fetching remote sources when needed
    pub async fn resolve(
        &self,
        transport: &dyn HttpTransport,
        timeout: Duration,
    ) -> Result<Arc<JsonSchema>, ClassifiedError> {
        if let Some(schema) = &self.compiled {
            return Ok(Arc::clone(schema));
        }

        let schema = match &self.source {
            SchemaSource::Url(url) => {
                let body = fetch(transport, url, timeout).await?;
                JsonSchema::from_bytes(&body)
            }
            SchemaSource::Inline(text) => JsonSchema::from_json_str(text),
            SchemaSource::Bytes(bytes) => JsonSchema::from_bytes(bytes),
            SchemaSource::File(path) => JsonSchema::from_file(path),
        };

        schema.map(Arc::new).map_err(|e| {
            ClassifiedError::new(ErrorKind::Schema, format!("failed to load schema: {e}"))
                .with_name("schema")
                .with_source(e)
        })
    }

    /// Apply this expectation's severity and trace to an error
    pub fn decorate(&self, err: ClassifiedError) -> ClassifiedError {
        self.severity.apply(err).with_trace(self.trace)
    }
}

async fn fetch(
    transport: &dyn HttpTransport,
    url: &Url,
    timeout: Duration,
) -> Result<Bytes, ClassifiedError> {
    let request = PreparedRequest::new(Method::GET, url.clone());
    let response = match tokio::time::timeout(timeout, transport.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(timeout)),
    }
    .map_err(|e| {
        ClassifiedError::transport(format!("failed to fetch schema from {url}: {e}"))
            .with_name("schema")
            .with_source(e)
    })?;

    if !response.status.is_success() {
        return Err(ClassifiedError::new(
            ErrorKind::Schema,
            format!("failed to fetch schema from {url}: status {}", response.status),
        )
        .with_name("schema")
        .with_actual(response.status.as_u16()));
    }

    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_rejects_invalid_inline_schema() {
        let source = SchemaSource::Inline(r#"{"type": 1}"#.to_string());
        let mut expectation = SchemaExpectation::new(source, Severity::Plain);
        assert!(expectation.prepare().is_err());
    }

    #[test]
    fn test_prepare_missing_file() {
        let mut expectation = SchemaExpectation::new(
            SchemaSource::File(PathBuf::from("/nonexistent/schema.json")),
            Severity::Plain,
        );
        assert!(expectation.prepare().is_err());
    }

    struct NoNetwork;

    #[async_trait::async_trait]
    impl HttpTransport for NoNetwork {
        async fn send(
            &self,
            _request: PreparedRequest,
        ) -> Result<crate::response::HttpResponse, TransportError> {
            Err(TransportError::other("network disabled"))
        }
    }

    #[tokio::test]
    async fn test_file_schema_is_compiled_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("user.json");
        std::fs::write(&path, r#"{"type": "object", "required": ["id"]}"#).unwrap();

        let mut expectation = SchemaExpectation::new(SchemaSource::File(path), Severity::Plain);
        expectation.prepare().unwrap();

        let schema = expectation
            .resolve(&NoNetwork, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(schema.validate(&serde_json::json!({"id": 1})).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_remote_schema_is_transport_error() {
        let url = Url::parse("http://localhost/schemas/user.json").unwrap();
        let mut expectation = SchemaExpectation::new(SchemaSource::Url(url), Severity::Plain);
        expectation.prepare().unwrap();

        let err = expectation
            .resolve(&NoNetwork, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.name(), Some("schema"));
    }

    #[test]
    fn test_decorate() {
        let expectation =
            SchemaExpectation::new(SchemaSource::Inline("{}".to_string()), Severity::Optional);
        let err = expectation.decorate(ClassifiedError::schema_violation("/id", "id", "bad"));
        assert!(err.is_optional());
        assert_eq!(err.trace(), Some(expectation.trace()));
    }
}
