use std::collections::HashMap;
use std::fs::File;
use std::io::Write;

use camino::Utf8Path;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::discovery::DiscoveredUrls;
use crate::domain::DatasetUuid;
use crate::error::CatalogError;
use crate::input::InputRecord;
use crate::metadata::DatasetFields;
use crate::schema::FileSchema;

pub const INDEX_COLUMN: &str = "uuid";

pub const METADATA_COLUMNS: &[&str] = &[
    "assay",
    "rnaseq_assay_method",
    "title",
    "group_name",
    "consortium",
    "doi",
    "publication_date",
    "status",
    "dataset_type",
    "processing",
    "organ",
    "sample_category",
    "analyte_class",
    "bmi",
    "age",
    "ethnicity",
    "sex",
    "diseases",
    "donor_id",
    "sample_id",
    "ancestor_id",
];

const DISEASE_SEPARATOR: &str = ";";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub uuid: DatasetUuid,
    pub assay: String,
    pub rnaseq_assay_method: String,
    pub fields: DatasetFields,
    /// `({field}_url, url)` in schema order; unresolved fields are empty.
    pub urls: Vec<(String, String)>,
}

impl CatalogRow {
    pub fn new(input: &InputRecord, fields: DatasetFields, urls: &DiscoveredUrls) -> Self {
        Self {
            uuid: input.uuid.clone(),
            assay: input.assay_type.clone(),
            rnaseq_assay_method: input.rnaseq_assay_method.clone(),
            fields,
            urls: urls
                .iter()
                .map(|(field, url)| (format!("{field}_url"), url.unwrap_or_default().to_string()))
                .collect(),
        }
    }

    pub fn url(&self, column: &str) -> Option<&str> {
        self.urls
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, url)| url.as_str())
    }

    /// Metadata cells in [`METADATA_COLUMNS`] order.
    fn metadata_cells(&self) -> [(&'static str, Cell<'_>); 21] {
        let f = &self.fields;
        [
            ("assay", Cell::Text(&self.assay)),
            ("rnaseq_assay_method", Cell::Text(&self.rnaseq_assay_method)),
            ("title", Cell::Text(&f.title)),
            ("group_name", Cell::Text(&f.group_name)),
            ("consortium", Cell::Text(&f.consortium)),
            ("doi", Cell::Text(&f.doi)),
            ("publication_date", Cell::Text(&f.publication_date)),
            ("status", Cell::Text(&f.status)),
            ("dataset_type", Cell::Text(&f.dataset_type)),
            ("processing", Cell::Text(&f.processing)),
            ("organ", Cell::Text(&f.organ)),
            ("sample_category", Cell::Text(&f.sample_category)),
            ("analyte_class", Cell::Text(&f.analyte_class)),
            ("bmi", Cell::Text(&f.bmi)),
            ("age", Cell::Text(&f.age)),
            ("ethnicity", Cell::Text(&f.ethnicity)),
            ("sex", Cell::Text(&f.sex)),
            ("diseases", Cell::List(&f.diseases)),
            ("donor_id", Cell::Text(&f.donor_id)),
            ("sample_id", Cell::Text(&f.sample_id)),
            ("ancestor_id", Cell::Text(&f.ancestor_id)),
        ]
    }

    /// Flat values matching [`CatalogTable::columns`]; diseases are `;`-joined.
    pub fn record(&self) -> Vec<String> {
        std::iter::once(self.uuid.to_string())
            .chain(self.metadata_cells().into_iter().map(|(_, cell)| match cell {
                Cell::Text(text) => text.to_string(),
                Cell::List(items) => items.join(DISEASE_SEPARATOR),
            }))
            .chain(self.urls.iter().map(|(_, url)| url.clone()))
            .collect()
    }
}

enum Cell<'a> {
    Text(&'a str),
    List(&'a [String]),
}

impl Serialize for CatalogRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let cells = self.metadata_cells();
        let mut map = serializer.serialize_map(Some(1 + cells.len() + self.urls.len()))?;
        map.serialize_entry(INDEX_COLUMN, self.uuid.as_str())?;
        for (column, cell) in cells {
            match cell {
                Cell::Text(text) => map.serialize_entry(column, text)?,
                Cell::List(items) => map.serialize_entry(column, items)?,
            }
        }
        for (column, url) in &self.urls {
            map.serialize_entry(column, url)?;
        }
        map.end()
    }
}

/// Rows keyed by dataset uuid, kept in insertion order.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CatalogTable {
    rows: Vec<CatalogRow>,
    #[serde(skip)]
    index: HashMap<DatasetUuid, usize>,
    #[serde(skip)]
    url_columns: Vec<String>,
}

impl CatalogTable {
    pub fn new(schema: &FileSchema) -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
            url_columns: schema
                .field_names()
                .map(|field| format!("{field}_url"))
                .collect(),
        }
    }

    /// Returns `false` and leaves the table untouched if the uuid is present.
    pub fn insert(&mut self, row: CatalogRow) -> bool {
        if self.index.contains_key(&row.uuid) {
            return false;
        }
        self.index.insert(row.uuid.clone(), self.rows.len());
        self.rows.push(row);
        true
    }

    pub fn contains(&self, uuid: &DatasetUuid) -> bool {
        self.index.contains_key(uuid)
    }

    pub fn get(&self, uuid: &DatasetUuid) -> Option<&CatalogRow> {
        self.index.get(uuid).map(|position| &self.rows[*position])
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        std::iter::once(INDEX_COLUMN)
            .chain(METADATA_COLUMNS.iter().copied())
            .map(str::to_string)
            .chain(self.url_columns.iter().cloned())
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), CatalogError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer
            .write_record(self.columns())
            .map_err(|err| CatalogError::OutputWrite(err.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row.record())
                .map_err(|err| CatalogError::OutputWrite(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| CatalogError::OutputWrite(err.to_string()))
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), CatalogError> {
        serde_json::to_writer_pretty(writer, self)
            .map_err(|err| CatalogError::OutputWrite(err.to_string()))
    }

    /// Format follows the extension: `.json`, anything else is CSV.
    pub fn write_to_path(&self, path: &Utf8Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            std::fs::create_dir_all(parent.as_std_path())
                .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        }
        let file = File::create(path.as_std_path())
            .map_err(|err| CatalogError::Filesystem(format!("create {path}: {err}")))?;
        match path.extension() {
            Some("json") => self.write_json(file),
            _ => self.write_csv(file),
        }
    }
}
