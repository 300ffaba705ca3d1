//! FILENAME: core/pivot-dataset/src/error.rs

use thiserror::Error;

/// Failures while loading a configuration. Resolution itself never fails.
#[derive(Error, Debug)]
pub enum DataSetError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data config: {0}")]
    InvalidConfig(String),
}
