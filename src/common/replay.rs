//! Canned HTTP exchanges for driving real SDK clients in tests.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::{Credentials, provider::SharedCredentialsProvider};
use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
use aws_smithy_types::body::SdkBody;

pub(crate) const ENDPOINT: &str = "http://localhost:4566";

/// HTTP client answering the n-th request with the n-th body.
pub(crate) fn replay_client(bodies: &[&str]) -> StaticReplayClient {
    let events = bodies
        .iter()
        .map(|body| {
            ReplayEvent::new(
                http::Request::builder()
                    .uri(ENDPOINT)
                    .body(SdkBody::empty())
                    .unwrap(),
                http::Response::builder()
                    .status(200)
                    .body(SdkBody::from(*body))
                    .unwrap(),
            )
        })
        .collect();
    StaticReplayClient::new(events)
}

/// Shared config pointing every client at [`ENDPOINT`] through `http_client`.
pub(crate) fn sdk_config(http_client: StaticReplayClient) -> SdkConfig {
    let credentials = Credentials::new("AKIDREPLAY", "secret", None, None, "replay");
    SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(ENDPOINT)
        .credentials_provider(SharedCredentialsProvider::new(credentials))
        .http_client(http_client)
        .build()
}

/// URI and body text of every request the client received, in order.
pub(crate) fn requests(http_client: &StaticReplayClient) -> Vec<(String, String)> {
    http_client
        .actual_requests()
        .map(|request| {
            let body = request.body().bytes().unwrap_or_default();
            (
                request.uri().to_string(),
                String::from_utf8_lossy(body).into_owned(),
            )
        })
        .collect()
}
