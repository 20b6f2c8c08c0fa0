use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;

use crate::discovery::discover_urls;
use crate::domain::DatasetUuid;
use crate::error::CatalogError;
use crate::input::{InputRecord, Worklist};
use crate::metadata::{extract_fields, string_field};
use crate::probe::ExistenceProber;
use crate::registry::{RegistryClient, fetch_dataset_record};
use crate::schema::FileSchema;
use crate::table::{CatalogRow, CatalogTable};

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// File names probed under every descendant.
    pub file_types: Vec<String>,
    pub schema: FileSchema,
}

impl CatalogOptions {
    /// Probes exactly the file names the schema can map.
    pub fn from_schema(schema: FileSchema) -> Self {
        Self {
            file_types: schema.file_tokens(),
            schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { total: usize },
    Processing { uuid: DatasetUuid, completed: usize, total: usize },
    Skipped { uuid: DatasetUuid, reason: String },
    Failed { uuid: DatasetUuid, message: String },
    Finished { summary: BatchSummary },
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub added: usize,
    pub no_files: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub elapsed_ms: u128,
}

/// Outcome for one input row.
enum RowOutcome {
    Added(Box<CatalogRow>),
    NoFiles { hubmap_id: String },
}

pub struct Catalog<C: RegistryClient> {
    client: C,
    prober: ExistenceProber,
    options: CatalogOptions,
}

impl<C: RegistryClient> Catalog<C> {
    pub fn new(client: C, prober: ExistenceProber, options: CatalogOptions) -> Self {
        Self {
            client,
            prober,
            options,
        }
    }

    /// Processes `inputs` in order; one bad dataset never aborts the batch.
    pub fn build(&self, inputs: &[InputRecord], sink: &dyn ProgressSink) -> CatalogTable {
        self.build_with_summary(inputs, sink).0
    }

    pub fn build_with_summary(
        &self,
        inputs: &[InputRecord],
        sink: &dyn ProgressSink,
    ) -> (CatalogTable, BatchSummary) {
        self.run(inputs, 0, sink)
    }

    /// Builds from a parsed worklist; its rejected rows count as failures.
    pub fn build_worklist(
        &self,
        worklist: &Worklist,
        sink: &dyn ProgressSink,
    ) -> (CatalogTable, BatchSummary) {
        self.run(&worklist.records, worklist.rejected.len(), sink)
    }

    fn run(
        &self,
        inputs: &[InputRecord],
        rejected: usize,
        sink: &dyn ProgressSink,
    ) -> (CatalogTable, BatchSummary) {
        let started = Instant::now();
        let total = inputs.len();
        let mut table = CatalogTable::new(&self.options.schema);
        let mut summary = BatchSummary {
            total: total + rejected,
            failed: rejected,
            ..BatchSummary::default()
        };
        let mut seen = HashSet::new();

        sink.event(ProgressEvent::Started { total });

        for (position, input) in inputs.iter().enumerate() {
            let uuid = &input.uuid;
            sink.event(ProgressEvent::Processing {
                uuid: uuid.clone(),
                completed: position,
                total,
            });

            if !seen.insert(uuid.clone()) {
                tracing::warn!("Duplicate uuid {uuid} in input, keeping first occurrence.");
                summary.duplicates += 1;
                sink.event(ProgressEvent::Skipped {
                    uuid: uuid.clone(),
                    reason: "duplicate".to_string(),
                });
                continue;
            }

            match self.build_row(input) {
                Ok(RowOutcome::Added(row)) => {
                    table.insert(*row);
                    summary.added += 1;
                }
                Ok(RowOutcome::NoFiles { hubmap_id }) => {
                    tracing::warn!("No usable files for uuid {uuid}, HuBMAP ID {hubmap_id}.");
                    summary.no_files += 1;
                    sink.event(ProgressEvent::Skipped {
                        uuid: uuid.clone(),
                        reason: "no usable files".to_string(),
                    });
                }
                Err(err) => {
                    tracing::error!("Error processing uuid {uuid}: {err}");
                    summary.failed += 1;
                    sink.event(ProgressEvent::Failed {
                        uuid: uuid.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        summary.elapsed_ms = started.elapsed().as_millis();
        tracing::info!(
            total = summary.total,
            added = summary.added,
            no_files = summary.no_files,
            failed = summary.failed,
            "catalogue built"
        );
        sink.event(ProgressEvent::Finished {
            summary: summary.clone(),
        });
        (table, summary)
    }

    fn build_row(&self, input: &InputRecord) -> Result<RowOutcome, CatalogError> {
        let record = fetch_dataset_record(&self.client, &input.uuid)?;
        let urls = discover_urls(
            &self.client,
            &self.prober,
            &input.uuid,
            self.options.file_types.as_slice(),
            &self.options.schema,
        )?;
        let Some(urls) = urls else {
            return Ok(RowOutcome::NoFiles {
                hubmap_id: string_field(&record, "hubmap_id"),
            });
        };
        let fields = extract_fields(&record);
        Ok(RowOutcome::Added(Box::new(CatalogRow::new(input, fields, &urls))))
    }
}
