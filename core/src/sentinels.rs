//! Synthetic placeholder values for page-wide and report-wide scopes.
//!
//! These literals are part of the export contract: CSV/JSON consumers key on them, so
//! changing any value is a breaking change.

/// Page index given to report-level filters so they sort ahead of every real page.
pub const REPORT_PAGE_INDEX: i64 = -1;
pub const REPORT_PAGE_NAME: &str = "Report";
pub const REPORT_PAGE_ID: &str = "__report__";
pub const REPORT_VISUAL_ID: &str = "__report__";
pub const REPORT_VISUAL_TYPE: &str = "report";

pub const PAGE_VISUAL_ID: &str = "__page__";
pub const PAGE_VISUAL_TYPE: &str = "page";
pub const DRILLTHROUGH_VISUAL_TYPE: &str = "drillthrough";

pub const ROLE_VISUAL_FILTER: &str = "visual-filter";
pub const ROLE_PAGE_FILTER: &str = "page-filter";
pub const ROLE_REPORT_FILTER: &str = "report-filter";
pub const ROLE_DRILLTHROUGH_FIELD: &str = "drillthrough-field";

/// Display label for a missing or blank table/field.
pub const UNKNOWN_LABEL: &str = "(unknown)";

/// Visual type used when a visual document does not declare one.
pub const UNKNOWN_VISUAL_TYPE: &str = "unknown";

/// True for the synthetic roles produced by filter and drillthrough extraction.
pub fn is_synthetic_role(role: &str) -> bool {
    matches!(
        role,
        ROLE_VISUAL_FILTER | ROLE_PAGE_FILTER | ROLE_REPORT_FILTER | ROLE_DRILLTHROUGH_FIELD
    )
}
