//! `HubmapHttpClient` against a local mock server.
//!
//! The client is blocking, so every call runs on tokio's blocking pool while
//! the mock server keeps serving from the async runtime.

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hubmap_catalog::config::ResolvedConfig;
use hubmap_catalog::domain::DatasetUuid;
use hubmap_catalog::error::CatalogError;
use hubmap_catalog::registry::{HubmapHttpClient, RegistryClient, fetch_dataset_record};

const X: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const D1: &str = "d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1";
const SEARCH: &str = "/v3/param-search/datasets";

fn config_for(server: &MockServer) -> ResolvedConfig {
    ResolvedConfig {
        registry_base: server.uri(),
        assets_base: server.uri(),
        ..ResolvedConfig::default()
    }
}

/// Builds the client and runs `call` off the async runtime.
async fn with_client<T, F>(config: ResolvedConfig, call: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&HubmapHttpClient) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let client = HubmapHttpClient::new(&config).unwrap();
        call(&client)
    })
    .await
    .unwrap()
}

async fn mount_head(server: &MockServer, file_path: &str, response: ResponseTemplate) {
    Mock::given(method("HEAD"))
        .and(path(file_path))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn head_success_means_present() {
    let server = MockServer::start().await;
    mount_head(&server, &format!("/{D1}/out.h5ad"), ResponseTemplate::new(200)).await;

    let present = with_client(config_for(&server), |client| {
        client.head(&client.asset_url(D1, "out.h5ad"))
    })
    .await;

    assert_matches!(present, Ok(true));
}

#[tokio::test(flavor = "multi_thread")]
async fn head_not_found_means_absent() {
    let server = MockServer::start().await;
    mount_head(&server, &format!("/{D1}/out.h5ad"), ResponseTemplate::new(404)).await;

    let present = with_client(config_for(&server), |client| {
        client.head(&client.asset_url(D1, "out.h5ad"))
    })
    .await;

    assert_matches!(present, Ok(false));
}

#[tokio::test(flavor = "multi_thread")]
async fn head_redirect_without_target_means_absent() {
    let server = MockServer::start().await;
    mount_head(&server, &format!("/{D1}/out.h5ad"), ResponseTemplate::new(301)).await;

    let present = with_client(config_for(&server), |client| {
        client.head(&client.asset_url(D1, "out.h5ad"))
    })
    .await;

    assert_matches!(present, Ok(false));
}

#[tokio::test(flavor = "multi_thread")]
async fn head_redirect_is_followed_to_its_target() {
    let server = MockServer::start().await;
    mount_head(
        &server,
        &format!("/{D1}/out.h5ad"),
        ResponseTemplate::new(301).insert_header("Location", "/moved/out.h5ad"),
    )
    .await;
    mount_head(&server, "/moved/out.h5ad", ResponseTemplate::new(200)).await;

    let present = with_client(config_for(&server), |client| {
        client.head(&client.asset_url(D1, "out.h5ad"))
    })
    .await;

    assert_matches!(present, Ok(true));
}

#[tokio::test(flavor = "multi_thread")]
async fn head_without_answer_is_a_transport_error() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = ResolvedConfig {
        assets_base: format!("http://{closed}"),
        ..ResolvedConfig::default()
    };

    let present = with_client(config, |client| {
        client.head(&client.asset_url(D1, "out.h5ad"))
    })
    .await;

    assert_matches!(present, Err(CatalogError::ProbeHttp(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn search_returns_first_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("uuid", X))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "uuid": X, "hubmap_id": "HBM123.ABCD.456", "descendant_ids": [D1] }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let record = with_client(config_for(&server), |client| {
        fetch_dataset_record(client, &X.parse::<DatasetUuid>().unwrap())
    })
    .await
    .unwrap();

    assert_eq!(record["hubmap_id"], "HBM123.ABCD.456");
    assert_eq!(record["descendant_ids"], json!([D1]));
}

#[tokio::test(flavor = "multi_thread")]
async fn search_server_error_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .expect(4)
        .mount(&server)
        .await;

    let result = with_client(config_for(&server), |client| {
        client.fetch_datasets(&X.parse::<DatasetUuid>().unwrap())
    })
    .await;

    assert_matches!(
        result,
        Err(CatalogError::RegistryStatus { status: 500, message }) if message == "upstream down"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn search_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let result = with_client(config_for(&server), |client| {
        client.fetch_datasets(&X.parse::<DatasetUuid>().unwrap())
    })
    .await;

    assert_matches!(result, Err(CatalogError::RegistryStatus { status: 400, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn search_non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = with_client(config_for(&server), |client| {
        client.fetch_datasets(&X.parse::<DatasetUuid>().unwrap())
    })
    .await;

    assert_matches!(result, Err(CatalogError::InvalidRegistryResponse(_)));
}
