#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use hubmap_catalog::domain::DatasetUuid;
use hubmap_catalog::error::CatalogError;
use hubmap_catalog::probe::{ExistenceProber, ProbePolicy};
use hubmap_catalog::registry::RegistryClient;

pub const ASSETS: &str = "https://assets.test";

/// In-memory registry: search bodies keyed by uuid, hosted assets by URL.
#[derive(Default)]
pub struct MockRegistry {
    datasets: HashMap<String, Value>,
    assets: HashSet<String>,
    /// Remaining transport failures per URL before it answers.
    flaky: Mutex<HashMap<String, usize>>,
    probes: Mutex<Vec<String>>,
    searches: Mutex<usize>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, uuid: &str, body: Value) -> Self {
        self.datasets.insert(uuid.to_string(), body);
        self
    }

    pub fn with_descendants(self, uuid: &str, descendants: &[&str]) -> Self {
        let body = serde_json::json!([{
            "uuid": uuid,
            "hubmap_id": format!("HBM-{}", &uuid[..4]),
            "descendant_ids": descendants,
        }]);
        self.with_body(uuid, body)
    }

    pub fn with_fixture(self, uuid: &str, name: &str) -> Self {
        let raw = std::fs::read_to_string(format!("tests/fixtures/{name}")).unwrap();
        let body: Value = serde_json::from_str(&raw).unwrap();
        self.with_body(uuid, body)
    }

    pub fn hosting(mut self, descendant: &str, file_type: &str) -> Self {
        self.assets.insert(asset(descendant, file_type));
        self
    }

    pub fn flaky(self, url: &str, failures: usize) -> Self {
        self.flaky.lock().unwrap().insert(url.to_string(), failures);
        self
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }

    pub fn probe_count(&self, url: &str) -> usize {
        self.probes().iter().filter(|probe| *probe == url).count()
    }

    pub fn searches(&self) -> usize {
        *self.searches.lock().unwrap()
    }
}

impl RegistryClient for MockRegistry {
    fn fetch_datasets(&self, uuid: &DatasetUuid) -> Result<Value, CatalogError> {
        *self.searches.lock().unwrap() += 1;
        self.datasets
            .get(uuid.as_str())
            .cloned()
            .ok_or_else(|| CatalogError::RegistryStatus {
                status: 404,
                message: format!("unknown uuid {uuid}"),
            })
    }

    fn head(&self, url: &str) -> Result<bool, CatalogError> {
        self.probes.lock().unwrap().push(url.to_string());
        let mut flaky = self.flaky.lock().unwrap();
        if let Some(remaining) = flaky.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CatalogError::ProbeHttp("connection reset".to_string()));
            }
        }
        Ok(self.assets.contains(url))
    }

    fn asset_url(&self, descendant: &str, file_type: &str) -> String {
        asset(descendant, file_type)
    }
}

pub fn asset(descendant: &str, file_type: &str) -> String {
    format!("{ASSETS}/{descendant}/{file_type}")
}

pub fn uuid(value: &str) -> DatasetUuid {
    value.parse().unwrap()
}

/// Default attempt count without the real inter-attempt pause.
pub fn fast_prober() -> ExistenceProber {
    ExistenceProber::new(ProbePolicy {
        attempts: 3,
        delay: Duration::ZERO,
    })
}
