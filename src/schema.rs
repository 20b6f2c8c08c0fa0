use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How file-name variants are guessed for a field that declares none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackNaming {
    /// `{field}.h5ad`, then `{field}.h5`.
    H5adWithH5,
    /// `{field}.h5ad` only.
    H5adOnly,
}

impl FallbackNaming {
    pub fn variants_for(self, field: &str) -> Vec<String> {
        match self {
            FallbackNaming::H5adWithH5 => vec![format!("{field}.h5ad"), format!("{field}.h5")],
            FallbackNaming::H5adOnly => vec![format!("{field}.h5ad")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub variants: Vec<String>,
}

impl SchemaField {
    pub fn new<I, S>(name: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_fallback(name: &str, naming: FallbackNaming) -> Self {
        Self {
            name: name.to_string(),
            variants: naming.variants_for(name),
        }
    }
}

/// Ordered mapping from logical field name to the file names that satisfy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSchema {
    pub name: String,
    pub fields: Vec<SchemaField>,
}

impl FileSchema {
    pub fn new(name: &str, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }

    pub fn single_cell() -> Self {
        Self::single_cell_with(FallbackNaming::H5adWithH5, "single-cell")
    }

    pub fn single_cell_strict() -> Self {
        Self::single_cell_with(FallbackNaming::H5adOnly, "single-cell-strict")
    }

    fn single_cell_with(naming: FallbackNaming, name: &str) -> Self {
        Self::new(
            name,
            vec![
                SchemaField::new("raw_expr", ["raw_expr.h5ad", "out.h5ad"]),
                SchemaField::with_fallback("expr", naming),
                SchemaField::with_fallback("secondary_analysis", naming),
                SchemaField::new("scvelo", ["scvelo.h5ad", "scvelo_annotated.h5ad"]),
            ],
        )
    }

    pub fn bulk() -> Self {
        Self::new(
            "bulk",
            vec![SchemaField::with_fallback(
                "expression_matrices",
                FallbackNaming::H5adWithH5,
            )],
        )
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Every declared variant, in declaration order, without duplicates.
    pub fn file_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for variant in self.fields.iter().flat_map(|field| field.variants.iter()) {
            if !tokens.contains(variant) {
                tokens.push(variant.clone());
            }
        }
        tokens
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaPreset {
    #[value(alias = "scrnaseq")]
    #[serde(alias = "scrnaseq")]
    SingleCell,
    SingleCellStrict,
    #[value(alias = "bulkseq")]
    #[serde(alias = "bulkseq")]
    Bulk,
}

impl SchemaPreset {
    pub fn schema(self) -> FileSchema {
        match self {
            SchemaPreset::SingleCell => FileSchema::single_cell(),
            SchemaPreset::SingleCellStrict => FileSchema::single_cell_strict(),
            SchemaPreset::Bulk => FileSchema::bulk(),
        }
    }
}

impl fmt::Display for SchemaPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaPreset::SingleCell => write!(f, "single-cell"),
            SchemaPreset::SingleCellStrict => write!(f, "single-cell-strict"),
            SchemaPreset::Bulk => write!(f, "bulk"),
        }
    }
}
