//! Raw reference → normalised usage.

use crate::classify::classify_field;
use crate::query_ref::{decompose_expression, parse_query_ref};
use crate::types::{ExtractionResult, NormalisedFieldUsage, RawFieldReference};

/// Normalises one raw reference. Missing hidden flags resolve to `false`.
pub fn normalise_reference(reference: &RawFieldReference, report: &str) -> NormalisedFieldUsage {
    let parsed = parse_query_ref(&reference.query_ref);
    let field_kind = classify_field(&reference.query_ref, &reference.prototype_select);
    let expression_components = if parsed.is_expression {
        parsed.expression.as_deref().map(decompose_expression)
    } else {
        None
    };

    NormalisedFieldUsage {
        report: report.to_string(),
        page: reference.page_name.clone(),
        page_index: reference.page_index,
        page_id: reference.page_id.clone(),
        page_type: reference.page_type.clone(),
        visual_id: reference.visual_id.clone(),
        visual_type: reference.visual_type.clone(),
        visual_title: reference.visual_title.clone(),
        role: reference.role.clone(),
        query_ref: reference.query_ref.clone(),
        table: parsed.table,
        field: parsed.field,
        field_kind,
        expression: parsed.expression,
        expression_components,
        is_hidden_visual: reference.is_hidden_visual.unwrap_or(false),
        is_hidden_filter: reference.is_hidden_filter.unwrap_or(false),
    }
}

/// Normalises every reference of an extraction, preserving order and count.
///
/// `report` is the display name stamped on each usage; when empty, the extraction
/// context's report name is used instead.
pub fn normalise_extraction(
    extraction: &ExtractionResult,
    report: &str,
) -> Vec<NormalisedFieldUsage> {
    let report = if report.trim().is_empty() {
        extraction.context.report_name.as_str()
    } else {
        report
    };
    extraction
        .references
        .iter()
        .map(|reference| normalise_reference(reference, report))
        .collect()
}
