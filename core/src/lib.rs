//! Field Usage: which model fields does a Power BI report actually use?
//!
//! This crate provides functionality for:
//! - Loading report definitions from `.pbix`/`.pbit` archives, zipped PBIP packages
//!   and PBIP report folders
//! - Extracting every field reference (visual roles, filters, drillthrough bindings)
//!   from both the legacy `Report/Layout` document and the PBIR folder format
//! - Normalising references into typed usages and classifying them
//! - Aggregating usages and projecting them into summary, details and pivot views
//! - Exporting the views as CSV or JSON
//!
//! # Quick Start
//!
//! ```ignore
//! use field_usage::{analyse_report, load_report_archive, summarize_usages, ArchiveLimits};
//!
//! let source = load_report_archive(std::fs::File::open("Sales.pbix")?, ArchiveLimits::default())?;
//! let result = analyse_report(&source, "Sales");
//!
//! for row in summarize_usages(&result.normalised) {
//!     println!("{}.{}: {} uses", row.table, row.field, row.total_uses);
//! }
//! ```

mod aggregate;
mod analysis;
mod classify;
mod config;
mod container;
pub mod error_codes;
mod extract;
mod loader;
mod normalize;
pub mod output;
mod pivot;
mod projection;
mod query_ref;
pub mod sentinels;
mod source;
mod types;

pub use aggregate::{
    aggregate_usages, Aggregation, AggregationSummary, FieldUsageAggregate, PageInfo, PageUsage,
};
pub use analysis::{
    analyse_batch, analyse_report, extract_report, report_name_from_path, BatchAnalysis,
    BatchFailure, BatchInput, ReportAnalysis,
};
pub use classify::{classify_field, FieldKind, PrototypeSelect, CONTEXT_REFERENCE};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigError};
pub use container::{ArchiveLimits, LoadError, ReportArchive};
pub use extract::{
    extract_directory, extract_legacy_layout, field_identity_from_query_ref, DirectoryExtractor,
    LegacyLayoutExtractor, ReportExtractor,
};
pub use loader::{decode_text, load_report_archive, parse_layout};
#[cfg(feature = "std-fs")]
pub use loader::{load_report_dir, load_report_path, DirScanConfig};
pub use normalize::{normalise_extraction, normalise_reference};
pub use output::ExportError;
pub use pivot::{
    pivot_from_aggregation, pivot_from_usages, FieldPages, PageCounts, Pivot, TableFields,
};
pub use projection::{
    canonical_rows, detail_usages, details_rows, summarize_usages, summary_rows,
    CanonicalUsageRow, DetailsRow, SummaryPage, SummaryReport, SummaryRow,
};
pub use query_ref::{decompose_expression, parse_query_ref, ExpressionComponents, ParsedQueryRef};
pub use source::{DirectoryDocuments, ReportSource, SchemaKind};
pub use types::{
    AnalysisResult, ExtractionContext, ExtractionResult, NormalisedFieldUsage, RawFieldReference,
};
