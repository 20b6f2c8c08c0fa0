use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

static PORTAL_UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"hubmapconsortium\.org/([a-f0-9]{32})").expect("static regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetUuid(String);

impl DatasetUuid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts either a bare uuid or a portal/asset URL embedding one.
    pub fn from_str_or_url(value: &str) -> Result<Self, CatalogError> {
        let trimmed = value.trim();
        if trimmed.contains('/') {
            return Ok(Self(extract_dataset_uuid(trimmed)?));
        }
        trimmed.parse()
    }
}

impl fmt::Display for DatasetUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetUuid {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = trimmed.len() == 32
            && trimmed
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch));
        if !is_valid {
            return Err(CatalogError::InvalidUuid(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for DatasetUuid {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatasetUuid> for String {
    fn from(value: DatasetUuid) -> Self {
        value.0
    }
}

/// Pulls the 32 hex character dataset uuid out of a HuBMAP portal URL.
pub fn extract_dataset_uuid(url: &str) -> Result<String, CatalogError> {
    PORTAL_UUID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CatalogError::InvalidDatasetUrl(url.to_string()))
}
