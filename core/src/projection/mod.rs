//! Read-optimised views over normalised usages.
//!
//! - canonical rows: one per usage, with display coercions, grouping keys and search text
//! - summary rows: one per `table|field` across all reports
//! - details rows: one per `report|page|table|field`
//!
//! Every view is sorted explicitly before it is returned; map iteration order is never
//! relied on.

mod canonical;
mod details;
mod summary;

pub use canonical::{canonical_rows, CanonicalUsageRow};
pub use details::{details_rows, DetailsRow};
pub use summary::{summary_rows, SummaryPage, SummaryReport, SummaryRow};

use crate::types::NormalisedFieldUsage;

/// Summary rows straight from normalised usages.
pub fn summarize_usages(usages: &[NormalisedFieldUsage]) -> Vec<SummaryRow> {
    summary_rows(&canonical_rows(usages))
}

/// Details rows straight from normalised usages.
pub fn detail_usages(usages: &[NormalisedFieldUsage]) -> Vec<DetailsRow> {
    details_rows(&canonical_rows(usages))
}
