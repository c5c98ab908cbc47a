use std::time::Duration;

use meridian_infra::{HttpClient, ReqwestTransport};
use wiremock::MockServer;

/// API base under the mock server, mirroring the `/api` prefix of the real
/// backend.
pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// Transport pointed at `server` with a short timeout and no retries.
pub fn transport_for(server: &MockServer) -> ReqwestTransport {
    let client = HttpClient::builder()
        .timeout(Duration::from_secs(2))
        .base_backoff(Duration::from_millis(5))
        .build()
        .expect("http client should build");
    ReqwestTransport::new(client, &api_base(server)).expect("base url should parse")
}
