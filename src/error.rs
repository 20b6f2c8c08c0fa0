use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("invalid HuBMAP URL format: {0}")]
    InvalidDatasetUrl(String),

    #[error("invalid dataset uuid: {0}")]
    InvalidUuid(String),

    #[error("HuBMAP search request failed: {0}")]
    RegistryHttp(String),

    #[error("HuBMAP search returned status {status}: {message}")]
    RegistryStatus { status: u16, message: String },

    #[error("invalid response format from HuBMAP API: {0}")]
    InvalidRegistryResponse(String),

    #[error("existence probe failed: {0}")]
    ProbeHttp(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("failed to read input table: {0}")]
    InputRead(String),

    #[error("failed to write output table: {0}")]
    OutputWrite(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
