//! YAML test suite model
//!
//! A suite file holds a list of test definitions. Each one is turned into a
//! validated [`Test`] through the engine's fluent builder, so a suite and a
//! hand-written test go through the same validation pass.

use anyhow::{bail, Context, Result};
use apiprobe::assert::{body, headers, json, SchemaSource};
use apiprobe::{Engine, Method, RetryPolicy, Severity, Test, TestBuilder, Url};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// A parsed suite file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Suite {
    #[serde(default)]
    pub tests: Vec<TestDef>,
}

impl Suite {
    /// Read and parse a suite file
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suite {path}"))?;
        Self::parse(&content).with_context(|| format!("Invalid suite {path}"))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let suite: Suite = serde_yaml_ng::from_str(content)?;
        if suite.tests.is_empty() {
            bail!("suite defines no tests");
        }
        Ok(suite)
    }

    /// Build every definition into a validated test
    ///
    /// Relative schema files are resolved against `base_dir`.
    pub fn build(self, engine: &Engine, base_dir: &Utf8Path) -> Result<Vec<Test>> {
        self.tests
            .into_iter()
            .map(|def| {
                let name = def.name.clone();
                def.into_test(engine, base_dir)
                    .with_context(|| format!("Test `{name}`"))
            })
            .collect()
    }
}

/// One test definition
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TestDef {
    pub name: String,
    /// Overrides the engine-wide parallel default
    pub parallel: Option<bool>,
    pub request: RequestDef,
    #[serde(default)]
    pub expect: ExpectDef,
    /// Attempt-level retry
    pub retry: Option<RetryPolicy>,
    /// Request-level retry
    pub request_retry: Option<RetryPolicy>,
    pub timeout_ms: Option<u64>,
}

impl TestDef {
    fn into_test(self, engine: &Engine, base_dir: &Utf8Path) -> Result<Test> {
        let mut builder = self.request.apply(engine.test(self.name))?;

        if let Some(parallel) = self.parallel {
            builder = builder.parallel(parallel);
        }
        if let Some(policy) = self.retry {
            builder = builder.attempt_retry(policy);
        }
        if let Some(policy) = self.request_retry {
            builder = builder.request_retry(policy);
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        let builder = self.expect.apply(builder, base_dir)?;
        Ok(builder.build()?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RequestDef {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// JSON body, sent with `application/json`
    pub json: Option<Value>,
    /// Raw text body
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RequestDef {
    fn apply(self, builder: TestBuilder) -> Result<TestBuilder> {
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("Invalid HTTP method `{}`", self.method))?;
        let mut builder = builder.method(method).url(self.url);

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        for (key, value) in self.query {
            builder = builder.query(key, value);
        }

        builder = match (self.json, self.body) {
            (Some(_), Some(_)) => bail!("`json` and `body` cannot both be set"),
            (Some(value), None) => builder.json(&value),
            (None, Some(text)) => builder.body(text),
            (None, None) => builder,
        };
        Ok(builder)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExpectDef {
    pub status: Option<u16>,
    #[serde(default)]
    pub json: Vec<JsonCheckDef>,
    #[serde(default)]
    pub headers: Vec<HeaderCheckDef>,
    #[serde(default)]
    pub body: Vec<BodyCheckDef>,
    pub schema: Option<SchemaDef>,
}

impl ExpectDef {
    fn apply(self, mut builder: TestBuilder, base_dir: &Utf8Path) -> Result<TestBuilder> {
        if let Some(status) = self.status {
            builder = builder.expect_status(status);
        }
        for check in self.json {
            builder = check.register(builder);
        }
        for check in self.headers {
            builder = check.register(builder);
        }
        for check in self.body {
            builder = check.register(builder);
        }
        if let Some(schema) = self.schema {
            let severity = schema.severity.into();
            builder = builder.expect_schema_with(schema.source.resolve(base_dir)?, severity);
        }
        Ok(builder)
    }
}

/// Severity as written in a suite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeverityDef {
    #[default]
    Plain,
    Optional,
    Broken,
    Require,
}

impl From<SeverityDef> for Severity {
    fn from(value: SeverityDef) -> Self {
        match value {
            SeverityDef::Plain => Severity::Plain,
            SeverityDef::Optional => Severity::Optional,
            SeverityDef::Broken => Severity::Broken,
            SeverityDef::Require => Severity::Require,
        }
    }
}

/// `{ path: "$.id", present: true, severity: require }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JsonCheckDef {
    pub path: String,
    #[serde(flatten)]
    pub op: JsonOp,
    #[serde(default)]
    pub severity: SeverityDef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JsonOp {
    Equal(Value),
    NotEqual(Value),
    Contains(Value),
    Length(usize),
    GreaterThan(f64),
    LessThan(f64),
    Present(bool),
    Empty(bool),
}

impl JsonCheckDef {
    fn register(self, builder: TestBuilder) -> TestBuilder {
        let severity = self.severity.into();
        let path = self.path;
        match self.op {
            JsonOp::Equal(v) => builder.assert_body_with(json::equal(path, v), severity),
            JsonOp::NotEqual(v) => builder.assert_body_with(json::not_equal(path, v), severity),
            JsonOp::Contains(v) => builder.assert_body_with(json::contains(path, v), severity),
            JsonOp::Length(n) => builder.assert_body_with(json::length(path, n), severity),
            JsonOp::GreaterThan(b) => {
                builder.assert_body_with(json::greater_than(path, b), severity)
            }
            JsonOp::LessThan(b) => builder.assert_body_with(json::less_than(path, b), severity),
            JsonOp::Present(true) => builder.assert_body_with(json::present(path), severity),
            JsonOp::Present(false) => builder.assert_body_with(json::not_present(path), severity),
            JsonOp::Empty(true) => builder.assert_body_with(json::empty(path), severity),
            JsonOp::Empty(false) => builder.assert_body_with(json::not_empty(path), severity),
        }
    }
}

/// `{ name: content-type, contains: json }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HeaderCheckDef {
    pub name: String,
    #[serde(flatten)]
    pub op: HeaderOp,
    #[serde(default)]
    pub severity: SeverityDef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderOp {
    Equal(String),
    Contains(String),
    Present(bool),
}

impl HeaderCheckDef {
    fn register(self, builder: TestBuilder) -> TestBuilder {
        let severity = self.severity.into();
        let name = self.name;
        match self.op {
            HeaderOp::Equal(v) => builder.assert_headers_with(headers::equal(name, v), severity),
            HeaderOp::Contains(v) => {
                builder.assert_headers_with(headers::contains(name, v), severity)
            }
            HeaderOp::Present(true) => {
                builder.assert_headers_with(headers::present(name), severity)
            }
            HeaderOp::Present(false) => {
                builder.assert_headers_with(headers::not_present(name), severity)
            }
        }
    }
}

/// `{ contains: "ok" }` over the raw body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BodyCheckDef {
    #[serde(flatten)]
    pub op: BodyOp,
    #[serde(default)]
    pub severity: SeverityDef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyOp {
    Contains(String),
    Equal(String),
}

impl BodyCheckDef {
    fn register(self, builder: TestBuilder) -> TestBuilder {
        let severity = self.severity.into();
        match self.op {
            BodyOp::Contains(v) => builder.assert_body_with(body::contains(v), severity),
            BodyOp::Equal(v) => builder.assert_body_with(body::equal(v), severity),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaDef {
    #[serde(flatten)]
    pub source: SchemaSourceDef,
    #[serde(default)]
    pub severity: SeverityDef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaSourceDef {
    File(Utf8PathBuf),
    Url(String),
    /// A schema document, or a string holding one
    Inline(Value),
}

impl SchemaSourceDef {
    fn resolve(self, base_dir: &Utf8Path) -> Result<SchemaSource> {
        Ok(match self {
            SchemaSourceDef::File(path) if path.is_relative() => {
                SchemaSource::File(base_dir.join(path).into_std_path_buf())
            }
            SchemaSourceDef::File(path) => SchemaSource::File(path.into_std_path_buf()),
            SchemaSourceDef::Url(url) => SchemaSource::Url(
                Url::parse(&url).with_context(|| format!("Invalid schema URL `{url}`"))?,
            ),
            SchemaSourceDef::Inline(Value::String(text)) => SchemaSource::Inline(text),
            SchemaSourceDef::Inline(document) => SchemaSource::Inline(document.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiprobe::EngineConfig;
    use tempfile::TempDir;

    const SUITE: &str = r#"
tests:
  - name: create user
    parallel: true
    request:
      method: post
      url: http://localhost:8080/users
      headers: { x-trace: abc }
      query: { dry: "1" }
      json: { name: alice }
    expect:
      status: 201
      json:
        - { path: "$.name", equal: "alice" }
        - { path: "$.id", present: true, severity: require }
        - { path: "$.tags", length: 2 }
      headers:
        - { name: content-type, contains: json, severity: optional }
      schema: { file: schemas/user.json }
    retry: { max-attempts: 2, delay-ms: 500 }
  - name: list users
    request:
      url: http://localhost:8080/users
"#;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).expect("engine")
    }

    fn base_dir_with_schema() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("tempdir");
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        std::fs::create_dir_all(base.join("schemas")).expect("mkdir");
        std::fs::write(
            base.join("schemas/user.json"),
            r#"{"type": "object", "required": ["id"]}"#,
        )
        .expect("write schema");
        (dir, base)
    }

    #[test]
    fn test_parse_suite() {
        let suite = Suite::parse(SUITE).unwrap();
        assert_eq!(suite.tests.len(), 2);

        let create = &suite.tests[0];
        assert_eq!(create.parallel, Some(true));
        assert_eq!(create.expect.status, Some(201));
        assert_eq!(create.expect.json.len(), 3);
        assert!(matches!(create.expect.json[1].op, JsonOp::Present(true)));
        assert_eq!(create.expect.json[1].severity, SeverityDef::Require);
        assert!(matches!(create.expect.json[2].op, JsonOp::Length(2)));
        assert_eq!(create.expect.headers[0].severity, SeverityDef::Optional);
        assert_eq!(create.retry.as_ref().map(|r| r.max_attempts), Some(2));

        assert_eq!(suite.tests[1].request.method, "GET");
        assert!(suite.tests[1].retry.is_none());
    }

    #[test]
    fn test_build_suite() {
        let (_dir, base) = base_dir_with_schema();
        let tests = Suite::parse(SUITE).unwrap().build(&engine(), &base).unwrap();
        assert_eq!(tests.len(), 2);

        let plan = tests[0].plan();
        assert!(tests[0].is_parallel());
        assert_eq!(plan.expected_status, Some(201));
        assert_eq!(plan.body_checks.len(), 3);
        assert_eq!(plan.header_checks.len(), 1);
        assert_eq!(plan.body_checks[1].severity(), Severity::Require);
        assert_eq!(plan.attempt_retry.max_attempts, 2);
        assert_eq!(plan.attempt_retry.delay_ms, 500);
        assert_eq!(plan.request.method(), Method::POST);

        match plan.schema.as_ref().map(|s| s.source()) {
            Some(SchemaSource::File(path)) => {
                assert_eq!(path, &base.join("schemas/user.json").into_std_path_buf())
            }
            other => panic!("unexpected schema source: {other:?}"),
        }

        assert!(!tests[1].is_parallel());
        assert_eq!(tests[1].plan().check_count(), 0);
    }

    #[test]
    fn test_missing_schema_file_fails_build() {
        let dir = TempDir::new().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let err = Suite::parse(SUITE).unwrap().build(&engine(), &base).unwrap_err();
        assert!(format!("{err:#}").contains("create user"));
    }

    #[test]
    fn test_inline_schema_and_body_checks() {
        let suite = Suite::parse(
            r#"
tests:
  - name: health
    request: { url: "http://localhost/health" }
    expect:
      body:
        - { contains: "ok" }
        - { equal: "ok", severity: broken }
      schema:
        inline: { type: object }
"#,
        )
        .unwrap();
        let tests = suite.build(&engine(), Utf8Path::new(".")).unwrap();
        let plan = tests[0].plan();
        assert_eq!(plan.body_checks.len(), 2);
        assert_eq!(plan.body_checks[1].severity(), Severity::Broken);
        assert!(matches!(
            plan.schema.as_ref().map(|s| s.source()),
            Some(SchemaSource::Inline(text)) if text.contains("object")
        ));
    }

    #[test]
    fn test_rejects_json_and_body_together() {
        let suite = Suite::parse(
            r#"
tests:
  - name: both
    request: { url: "http://localhost/", json: {}, body: "raw" }
"#,
        )
        .unwrap();
        assert!(suite.build(&engine(), Utf8Path::new(".")).is_err());
    }

    #[test]
    fn test_rejects_unknown_check() {
        let result = Suite::parse(
            r#"
tests:
  - name: typo
    request: { url: "http://localhost/" }
    expect:
      json:
        - { path: "$.a", equals: 1 }
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_suite() {
        assert!(Suite::parse("tests: []").is_err());
    }
}
