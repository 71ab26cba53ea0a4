//! Request construction from accumulated builder options
//!
//! A [`RequestSpec`] is pure data collected by the test builder. It is turned
//! into a fresh [`PreparedRequest`] at the start of every attempt, so state
//! from a failed attempt (including before-hook mutations) is never reused.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use apiprobe_core::ClassifiedError;

/// Body of a prepared request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Multipart(Vec<MultipartField>),
}

/// One multipart form field
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

impl MultipartField {
    pub fn name(&self) -> &str {
        match self {
            MultipartField::Text { name, .. } | MultipartField::File { name, .. } => name,
        }
    }
}

/// A request ready to hand to the transport
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl PreparedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Body bytes, if the body is not a multipart form
    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            RequestBody::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Settings applied to every request built by one engine
#[derive(Debug, Clone, Default)]
pub struct RequestDefaults {
    pub user_agent: Option<String>,
}

/// Builder options for one request
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    method: Option<Method>,
    url: Option<String>,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<Bytes>,
    json_body: Option<Result<Bytes, String>>,
    multipart: Vec<MultipartField>,
    prepared: Option<PreparedRequest>,
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = Some(method);
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn add_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Marshal a value as the JSON body
    ///
    /// A marshaling failure is kept and reported by [`validate`](Self::validate).
    pub fn set_json<T: Serialize + ?Sized>(&mut self, value: &T) {
        self.json_body = Some(
            serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(|e| e.to_string()),
        );
    }

    pub fn add_multipart(&mut self, field: MultipartField) {
        self.multipart.push(field);
    }

    /// Use a caller-supplied request instead of the builder options
    pub fn set_prepared(&mut self, request: PreparedRequest) {
        self.prepared = Some(request);
    }

    pub fn method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Check the options without building a request
    pub fn validate(&self) -> Result<(), String> {
        if self.prepared.is_some() {
            return Ok(());
        }
        let url = self.url.as_deref().ok_or("no URL configured")?;
        Url::parse(url).map_err(|e| format!("invalid URL `{url}`: {e}"))?;
        build_headers(&self.headers)?;
        if let Some(Err(e)) = &self.json_body {
            return Err(format!("failed to marshal JSON body: {e}"));
        }
        Ok(())
    }

    /// Build a fresh request
    ///
    /// Body source priority is raw body < marshaled JSON body < multipart
    /// forms. Query parameters are appended to any query already on the URL.
    pub fn build(&self, defaults: &RequestDefaults) -> Result<PreparedRequest, ClassifiedError> {
        if let Some(prepared) = &self.prepared {
            return Ok(prepared.clone());
        }

        let raw_url = self
            .url
            .as_deref()
            .ok_or_else(|| ClassifiedError::build("no URL configured"))?;
        let mut url = Url::parse(raw_url)
            .map_err(|e| ClassifiedError::build(format!("invalid URL `{raw_url}`: {e}")))?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        let mut headers = build_headers(&self.headers).map_err(ClassifiedError::build)?;
        if let Some(agent) = &defaults.user_agent {
            if !headers.contains_key(USER_AGENT) {
                let value = HeaderValue::from_str(agent).map_err(|e| {
                    ClassifiedError::build(format!("invalid user agent `{agent}`: {e}"))
                })?;
                headers.insert(USER_AGENT, value);
            }
        }

        let body = if !self.multipart.is_empty() {
            RequestBody::Multipart(self.multipart.clone())
        } else if let Some(json) = &self.json_body {
            let bytes = json.clone().map_err(|e| {
                ClassifiedError::build(format!("failed to marshal JSON body: {e}"))
            })?;
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            RequestBody::Bytes(bytes)
        } else if let Some(body) = &self.body {
            RequestBody::Bytes(body.clone())
        } else {
            RequestBody::Empty
        };

        Ok(PreparedRequest {
            method: self.method(),
            url,
            headers,
            body,
        })
    }
}

/// Build a header map, appending repeated names verbatim
pub fn build_headers(input: &[(String, String)]) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        if key.is_empty() {
            return Err(format!("header name is empty (value `{value}`)"));
        }

        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| format!("Invalid header name `{key}`: {err}"))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| format!("Invalid header value for `{key}`: {err}"))?;
        headers.append(header_name, header_value);
    }

    Ok(headers)
}
