//! Field extraction from a HuBMAP dataset record.
//!
//! List-valued attributes are scanned in order and the first qualifying
//! entry wins; a field with no qualifying entry is the empty string.

use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;

pub const CONSORTIUM: &str = "HuBMAP";
pub const PROCESSING: &str = "raw";
pub const DEFAULT_DISEASE: &str = "normal";

const CONCEPT_KEY: &str = "grouping_concept_preferred_term";
const VALUE_KEY: &str = "data_value";

/// Checked in this order; the first class found in the dataset's own type or
/// any descendant's type is reported.
pub const ANALYTE_CLASSES: &[&str] = &[
    "RNA",
    "Protein",
    "DNA",
    "Metabolite",
    "Lipid",
    "Nucleic acid + protein",
    "Endogenous fluorophore",
    "Polysaccharide",
    "Peptide",
    "DNA + RNA",
    "Lipid + metabolite",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetFields {
    pub title: String,
    pub group_name: String,
    pub consortium: String,
    pub doi: String,
    pub publication_date: String,
    pub status: String,
    pub dataset_type: String,
    pub processing: String,
    pub organ: String,
    pub sample_category: String,
    pub analyte_class: String,
    pub bmi: String,
    pub age: String,
    pub ethnicity: String,
    pub sex: String,
    pub diseases: Vec<String>,
    pub donor_id: String,
    pub sample_id: String,
    pub ancestor_id: String,
}

pub fn extract_fields(record: &Value) -> DatasetFields {
    let observations = donor_observations(record);
    DatasetFields {
        title: string_field(record, "title"),
        group_name: string_field(record, "group_name"),
        consortium: CONSORTIUM.to_string(),
        doi: string_field(record, "registered_doi"),
        publication_date: publication_date(record),
        status: string_field(record, "data_access_level"),
        dataset_type: string_field(record, "dataset_type"),
        processing: PROCESSING.to_string(),
        organ: first_field_match(list(record, "origin_samples"), "organ"),
        sample_category: first_field_match(list(record, "source_samples"), "sample_category"),
        analyte_class: analyte_class(record),
        bmi: donor_observation(observations, "Body Mass Index"),
        age: donor_observation(observations, "Age"),
        ethnicity: donor_observation(observations, "Race"),
        sex: donor_observation(observations, "Sex"),
        diseases: diseases(observations),
        donor_id: record
            .get("donor")
            .map(|donor| string_field(donor, "hubmap_id"))
            .unwrap_or_default(),
        sample_id: first_field_match(list(record, "source_samples"), "hubmap_id"),
        ancestor_id: ancestor_id(record),
    }
}

/// Renders a scalar as text; null, missing and structured values are empty.
pub fn scalar_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

pub fn string_field(value: &Value, key: &str) -> String {
    scalar_to_string(value.get(key))
}

/// Array under `key`, or an empty slice when absent or not an array.
pub fn list<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// `donor.metadata.organ_donor_data`
pub fn donor_observations(record: &Value) -> &[Value] {
    record
        .get("donor")
        .and_then(|donor| donor.get("metadata"))
        .and_then(|metadata| metadata.get("organ_donor_data"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// First non-empty `key` among `entries`.
pub fn first_field_match(entries: &[Value], key: &str) -> String {
    entries
        .iter()
        .map(|entry| string_field(entry, key))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Value of the first observation whose concept label equals `term`.
pub fn donor_observation(observations: &[Value], term: &str) -> String {
    observations
        .iter()
        .find(|entry| concept_matches(entry, term))
        .map(|entry| string_field(entry, VALUE_KEY))
        .unwrap_or_default()
}

pub fn collect_donor_observations(observations: &[Value], term: &str) -> Vec<String> {
    observations
        .iter()
        .filter(|entry| concept_matches(entry, term))
        .map(|entry| string_field(entry, VALUE_KEY))
        .collect()
}

/// All medical history entries, or `["normal"]` when there are none.
pub fn diseases(observations: &[Value]) -> Vec<String> {
    let found = collect_donor_observations(observations, "Medical History");
    if found.is_empty() {
        return vec![DEFAULT_DISEASE.to_string()];
    }
    found
}

pub fn analyte_class(record: &Value) -> String {
    let own_type = string_field(record, "dataset_type");
    let descendant_types: Vec<String> = list(record, "descendants")
        .iter()
        .map(|descendant| string_field(descendant, "dataset_type"))
        .collect();
    ANALYTE_CLASSES
        .iter()
        .find(|class| {
            own_type.contains(*class)
                || descendant_types
                    .iter()
                    .any(|dataset_type| dataset_type.contains(*class))
        })
        .map(|class| class.to_string())
        .unwrap_or_default()
}

/// `published_timestamp` (epoch milliseconds) as a UTC `YYYY-MM-DD`.
pub fn publication_date(record: &Value) -> String {
    let millis = match record.get("published_timestamp") {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        _ => None,
    };
    millis
        .filter(|millis| *millis != 0)
        .and_then(DateTime::from_timestamp_millis)
        .map(|timestamp| timestamp.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn ancestor_id(record: &Value) -> String {
    scalar_to_string(list(record, "immediate_ancestor_ids").first())
}

fn concept_matches(entry: &Value, term: &str) -> bool {
    entry.get(CONCEPT_KEY).and_then(Value::as_str) == Some(term)
}
