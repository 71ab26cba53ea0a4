use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Instant;

use super::{HttpTransport, TransportError};
use crate::request::{MultipartField, PreparedRequest, RequestBody};
use crate::response::HttpResponse;

/// Default transport backed by a shared `reqwest::Client`
///
/// The client is cloned cheaply and shared read-only by every test created
/// from the same engine. Timeouts are enforced by the request executor, not
/// by the client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a client that follows up to 10 redirects
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        let PreparedRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url);

        match body {
            RequestBody::Empty => {
                builder = builder.headers(headers);
            }
            RequestBody::Bytes(bytes) => {
                builder = builder.headers(headers).body(bytes);
            }
            RequestBody::Multipart(fields) => {
                // reqwest sets the content type with the form boundary
                headers.remove(CONTENT_TYPE);
                builder = builder.headers(headers).multipart(build_form(fields)?);
            }
        }

        let started = Instant::now();
        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(TransportError::Body)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
            url,
            elapsed: started.elapsed(),
        })
    }
}

fn build_form(fields: Vec<MultipartField>) -> Result<Form, TransportError> {
    let mut form = Form::new();

    for field in fields {
        form = match field {
            MultipartField::Text { name, value } => form.text(name, value),
            MultipartField::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                let mut part = Part::bytes(data.to_vec()).file_name(file_name);
                if let Some(mime) = content_type {
                    part = part.mime_str(&mime)?;
                }
                form.part(name, part)
            }
        };
    }

    Ok(form)
}
