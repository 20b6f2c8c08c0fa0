use std::io::Read;
use std::str::FromStr;

use camino::Utf8Path;
use serde::Deserialize;

use crate::domain::DatasetUuid;
use crate::error::CatalogError;

const REQUIRED_COLUMNS: [&str; 2] = ["uuid", "assay_type"];

/// One known dataset from the caller's worklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub uuid: DatasetUuid,
    pub assay_type: String,
    pub rnaseq_assay_method: String,
}

impl InputRecord {
    pub fn new(uuid: DatasetUuid, assay_type: &str, rnaseq_assay_method: &str) -> Self {
        Self {
            uuid,
            assay_type: assay_type.to_string(),
            rnaseq_assay_method: rnaseq_assay_method.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawInputRow {
    uuid: String,
    assay_type: String,
    #[serde(default)]
    rnaseq_assay_method: String,
}

/// A worklist row that could not be turned into an [`InputRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based data row number, header excluded.
    pub row: usize,
    pub uuid: String,
    pub reason: String,
}

/// Parsed worklist: usable records in file order plus the rows left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worklist {
    pub records: Vec<InputRecord>,
    pub rejected: Vec<RejectedRow>,
}

pub fn read_input_csv(path: &Utf8Path) -> Result<Worklist, CatalogError> {
    let file = std::fs::File::open(path.as_std_path())
        .map_err(|err| CatalogError::InputRead(format!("{path}: {err}")))?;
    read_input(file)
}

/// Reads the worklist. Only an unreadable file or missing columns fail the
/// whole read; a bad row is logged and kept in [`Worklist::rejected`].
pub fn read_input<R: Read>(reader: R) -> Result<Worklist, CatalogError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| CatalogError::InputRead(format!("header: {err}")))?;
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(CatalogError::InputRead(format!(
                "missing required column '{column}'"
            )));
        }
    }

    let mut worklist = Worklist::default();
    for (index, row) in reader.deserialize::<RawInputRow>().enumerate() {
        let row_number = index + 1;
        let parsed = row.map_err(|err| (String::new(), err.to_string())).and_then(|raw| {
            match DatasetUuid::from_str(&raw.uuid) {
                Ok(uuid) => Ok(InputRecord {
                    uuid,
                    assay_type: raw.assay_type,
                    rnaseq_assay_method: raw.rnaseq_assay_method,
                }),
                Err(err) => Err((raw.uuid, err.to_string())),
            }
        });
        match parsed {
            Ok(record) => worklist.records.push(record),
            Err((uuid, reason)) => {
                tracing::warn!("Skipping input row {row_number} (uuid '{uuid}'): {reason}");
                worklist.rejected.push(RejectedRow {
                    row: row_number,
                    uuid,
                    reason,
                });
            }
        }
    }
    Ok(worklist)
}
