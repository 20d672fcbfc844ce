//! Export writers for the projections and analysis results.

mod csv;
mod json;

pub use self::csv::{
    write_details_csv, write_summary_csv, write_usages_csv, DETAILS_HEADERS, SUMMARY_HEADERS,
    USAGE_HEADERS,
};
pub use self::json::{to_json_pretty, write_json};

use thiserror::Error;

use crate::error_codes;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::Csv(_) => error_codes::EXPORT_CSV,
            ExportError::Json(_) => error_codes::EXPORT_JSON,
            ExportError::Io(_) => error_codes::EXPORT_IO,
        }
    }
}
