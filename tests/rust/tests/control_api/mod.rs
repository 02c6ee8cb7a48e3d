//! Cloud Controller and UAA client tests against a mock HTTP server


use std::time::Duration;

use cfbroker_core::{CloudControllerClient, CloudControllerConfig, TokenSource};
use serde_json::{json, Value};
use url::Url;
use wiremock::MockServer;
use zeroize::Zeroizing;

pub const TOKEN: &str = "test-token";

pub fn config(server: &MockServer, token_source: TokenSource) -> CloudControllerConfig {
    config_at(&server.uri(), token_source)
}

/// Config whose API URL is `base`, which may carry a path prefix
pub fn config_at(base: &str, token_source: TokenSource) -> CloudControllerConfig {
    tests::init_test_tracing();
    CloudControllerConfig {
        api_url: Url::parse(base).unwrap(),
        token_source,
        skip_ssl_validation: false,
        timeout: Duration::from_secs(5),
    }
}

pub fn static_client(server: &MockServer) -> CloudControllerClient {
    let source = TokenSource::Static(Zeroizing::new(TOKEN.to_string()));
    CloudControllerClient::new(config(server, source)).unwrap()
}

/// `{metadata, entity}` envelope
pub fn resource(guid: &str, entity: Value) -> Value {
    json!({ "metadata": { "guid": guid, "url": format!("/v2/x/{}", guid) }, "entity": entity })
}

pub fn page(resources: Vec<Value>, next_url: Option<&str>) -> Value {
    json!({
        "total_results": resources.len(),
        "next_url": next_url,
        "prev_url": null,
        "resources": resources,
    })
}
