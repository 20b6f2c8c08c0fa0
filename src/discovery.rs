use std::collections::HashMap;

use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::Value;

use crate::domain::DatasetUuid;
use crate::error::CatalogError;
use crate::probe::ExistenceProber;
use crate::registry::{RegistryClient, fetch_dataset_record};
use crate::schema::FileSchema;

/// One URL-or-nothing per schema field, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUrls {
    entries: Vec<(String, Option<String>)>,
}

impl DiscoveredUrls {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, url)| url.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, url)| (name.as_str(), url.as_deref()))
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|(_, url)| url.is_some()).count()
    }
}

impl Serialize for DiscoveredUrls {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, url) in &self.entries {
            map.serialize_entry(name, url)?;
        }
        map.end()
    }
}

/// Probes `{assets}/{descendant}/{token}` for every descendant of `uuid`.
///
/// The first descendant (in registry order) hosting a token wins; a resolved
/// token is not probed again.
pub fn probe_descendants<C, S>(
    client: &C,
    prober: &ExistenceProber,
    uuid: &DatasetUuid,
    file_types: &[S],
) -> Result<HashMap<String, String>, CatalogError>
where
    C: RegistryClient + ?Sized,
    S: AsRef<str>,
{
    let record = fetch_dataset_record(client, uuid)?;
    let descendants = match record.get("descendant_ids") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|id| {
                id.as_str().ok_or_else(|| {
                    CatalogError::InvalidRegistryResponse(format!(
                        "descendant_ids of {uuid} holds a non-string entry: {id}"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(CatalogError::InvalidRegistryResponse(format!(
                "descendant_ids of {uuid} is not a list"
            )));
        }
    };

    let mut found = HashMap::new();
    for descendant in descendants {
        for file_type in file_types {
            let file_type: &str = file_type.as_ref();
            if found.contains_key(file_type) {
                continue;
            }
            let candidate = client.asset_url(descendant, file_type);
            if prober.exists(client, &candidate) {
                found.insert(file_type.to_string(), candidate);
            }
        }
    }
    Ok(found)
}

/// Maps probed files onto `schema`; `None` when no field resolved.
pub fn discover_urls<C, S>(
    client: &C,
    prober: &ExistenceProber,
    uuid: &DatasetUuid,
    file_types: &[S],
    schema: &FileSchema,
) -> Result<Option<DiscoveredUrls>, CatalogError>
where
    C: RegistryClient + ?Sized,
    S: AsRef<str>,
{
    let found = probe_descendants(client, prober, uuid, file_types)?;
    let urls = resolve_schema(&found, schema);
    if urls.resolved_count() == 0 {
        return Ok(None);
    }
    Ok(Some(urls))
}

pub fn resolve_schema(found: &HashMap<String, String>, schema: &FileSchema) -> DiscoveredUrls {
    let entries = schema
        .fields
        .iter()
        .map(|field| {
            let url = field
                .variants
                .iter()
                .find_map(|variant| found.get(variant).cloned());
            (field.name.clone(), url)
        })
        .collect();
    DiscoveredUrls { entries }
}
