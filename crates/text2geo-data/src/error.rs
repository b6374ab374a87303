use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;
pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Unknown dataset '{dataset}'. Valid options: {}", .valid.join(", "))]
    InvalidDataset {
        dataset: String,
        valid: Vec<&'static str>,
    },
    #[error(
        "Dataset '{dataset}' not found in '{}'. Run: text2geo prepare {dataset} <dump files>",
        .data_dir.display()
    )]
    DatasetNotFound { dataset: String, data_dir: PathBuf },
    #[error("No GeoNames dump files were provided")]
    NoDumpFiles,
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },
    #[cfg(feature = "download")]
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
