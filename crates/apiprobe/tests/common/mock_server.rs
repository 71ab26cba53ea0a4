//! Mock server helpers
//!
//! Endpoints answer with JSON bodies so the predicate library can be
//! exercised end to end.

use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_SCHEMA: &str = r#"{
    "type": "object",
    "required": ["id", "name"],
    "properties": {
        "id": { "type": "integer" },
        "name": { "type": "string" }
    }
}"#;

/// Set up a JSON endpoint answering every request with `status` and `body`
pub async fn mock_json(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Set up an endpoint that fails with `fail_status` `fail_count` times, then
/// answers with 200 and `body`
pub async fn mock_flaky_json(
    server: &MockServer,
    route: &str,
    fail_count: u64,
    fail_status: u16,
    body: Value,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(fail_status))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Set up a schema document endpoint
pub async fn mock_schema(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/schema+json")
                .set_body_string(USER_SCHEMA),
        )
        .mount(server)
        .await;
}

/// Number of requests the server received for `route`
pub async fn received(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}
