use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::ResolvedConfig;
use crate::domain::DatasetUuid;
use crate::error::CatalogError;

/// Read access to the HuBMAP search API and the asset host.
pub trait RegistryClient: Send + Sync {
    /// Raw body of `/v3/param-search/datasets?uuid={uuid}`.
    fn fetch_datasets(&self, uuid: &DatasetUuid) -> Result<Value, CatalogError>;

    /// `Ok(true)` for a 2xx answer, `Ok(false)` for any other status,
    /// `Err` when no answer could be obtained.
    fn head(&self, url: &str) -> Result<bool, CatalogError>;

    fn asset_url(&self, descendant: &str, file_type: &str) -> String;
}

/// First record of a param-search response.
pub fn fetch_dataset_record<C: RegistryClient + ?Sized>(
    client: &C,
    uuid: &DatasetUuid,
) -> Result<Value, CatalogError> {
    let body = client.fetch_datasets(uuid)?;
    match body {
        Value::Array(mut records) if !records.is_empty() => Ok(records.swap_remove(0)),
        Value::Array(_) => Err(CatalogError::InvalidRegistryResponse(format!(
            "no dataset record for {uuid}"
        ))),
        _ => Err(CatalogError::InvalidRegistryResponse(format!(
            "expected a JSON array for {uuid}"
        ))),
    }
}

#[derive(Clone)]
pub struct HubmapHttpClient {
    client: Client,
    registry_base: String,
    assets_base: String,
    probe_timeout: Duration,
}

impl HubmapHttpClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("hubmap-catalog/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CatalogError::RegistryHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| CatalogError::RegistryHttp(err.to_string()))?;
        Ok(Self {
            client,
            registry_base: config.registry_base.clone(),
            assets_base: config.assets_base.clone(),
            probe_timeout: config.probe_timeout,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/v3/param-search/datasets", self.registry_base)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, CatalogError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "HuBMAP search request failed".to_string());
        Err(CatalogError::RegistryStatus { status, message })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, CatalogError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tracing::debug!(status, attempt, "retrying HuBMAP search request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tracing::debug!(error = %err, attempt, "retrying HuBMAP search request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(CatalogError::RegistryHttp(err.to_string()));
                }
            }
        }
    }
}

impl RegistryClient for HubmapHttpClient {
    fn fetch_datasets(&self, uuid: &DatasetUuid) -> Result<Value, CatalogError> {
        let url = self.search_url();
        let response =
            self.send_with_retries(|| self.client.get(&url).query(&[("uuid", uuid.as_str())]))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| CatalogError::InvalidRegistryResponse(err.to_string()))
    }

    fn head(&self, url: &str) -> Result<bool, CatalogError> {
        let response = self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .map_err(|err| CatalogError::ProbeHttp(err.to_string()))?;
        Ok(response.status().is_success())
    }

    fn asset_url(&self, descendant: &str, file_type: &str) -> String {
        format!("{}/{descendant}/{file_type}", self.assets_base)
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
