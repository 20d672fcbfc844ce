use serde::{Deserialize, Serialize};

use crate::aggregate::label_or_unknown;
use crate::classify::FieldKind;
use crate::types::NormalisedFieldUsage;

/// One usage reshaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalUsageRow {
    pub id: String,
    pub report: String,
    pub page: String,
    pub page_index: i64,
    pub page_id: Option<String>,
    pub page_type: Option<String>,
    pub visual_id: String,
    pub visual_type: String,
    pub visual_title: Option<String>,
    pub role: String,
    /// Never blank; `(unknown)` when the usage has no table.
    pub table: String,
    /// Never blank; `(unknown)` when the usage has no field.
    pub field: String,
    pub field_kind: FieldKind,
    pub query_ref: String,
    pub expression: Option<String>,
    pub hidden_usage: bool,
    pub is_hidden_visual: bool,
    pub is_hidden_filter: bool,
    pub report_page_key: String,
    pub report_visual_key: String,
    pub search_text: String,
}

pub fn canonical_rows(usages: &[NormalisedFieldUsage]) -> Vec<CanonicalUsageRow> {
    usages
        .iter()
        .enumerate()
        .map(|(idx, usage)| canonical_row(idx, usage))
        .collect()
}

fn canonical_row(idx: usize, usage: &NormalisedFieldUsage) -> CanonicalUsageRow {
    let table = label_or_unknown(usage.table.as_deref()).to_string();
    let field = label_or_unknown(usage.field.as_deref()).to_string();

    // The position suffix keeps ids unique for otherwise identical usages.
    let id = format!(
        "{}|{}|{}|{}|{}|{}#{idx}",
        usage.report, usage.page, usage.visual_id, usage.role, table, field
    );

    let search_text = [
        Some(usage.report.as_str()),
        Some(usage.page.as_str()),
        Some(usage.visual_type.as_str()),
        usage.visual_title.as_deref(),
        Some(usage.role.as_str()),
        Some(table.as_str()),
        Some(field.as_str()),
        Some(usage.field_kind.as_str()),
        Some(usage.query_ref.as_str()),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    CanonicalUsageRow {
        id,
        report: usage.report.clone(),
        page: usage.page.clone(),
        page_index: usage.page_index,
        page_id: usage.page_id.clone(),
        page_type: usage.page_type.clone(),
        visual_id: usage.visual_id.clone(),
        visual_type: usage.visual_type.clone(),
        visual_title: usage.visual_title.clone(),
        role: usage.role.clone(),
        table,
        field,
        field_kind: usage.field_kind,
        query_ref: usage.query_ref.clone(),
        expression: usage.expression.clone(),
        hidden_usage: usage.is_hidden(),
        is_hidden_visual: usage.is_hidden_visual,
        is_hidden_filter: usage.is_hidden_filter,
        report_page_key: format!("{}|{}", usage.report, usage.page),
        report_visual_key: format!("{}|{}", usage.report, usage.visual_id),
        search_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn usage(table: Option<&str>, field: Option<&str>) -> NormalisedFieldUsage {
        NormalisedFieldUsage {
            report: "Sales".to_string(),
            page: "Overview".to_string(),
            page_index: 0,
            page_id: None,
            page_type: None,
            visual_id: "v1".to_string(),
            visual_type: "barChart".to_string(),
            visual_title: Some("Revenue By Region".to_string()),
            role: "Values".to_string(),
            query_ref: "Sum(Sales.Amount)".to_string(),
            table: table.map(str::to_string),
            field: field.map(str::to_string),
            field_kind: FieldKind::Measure,
            expression: None,
            expression_components: None,
            is_hidden_visual: false,
            is_hidden_filter: false,
        }
    }

    #[test]
    fn blank_table_and_field_become_unknown_independently() {
        let rows = canonical_rows(&[
            usage(None, Some("Amount")),
            usage(Some("   "), Some("")),
            usage(Some("Sales"), None),
        ]);
        assert_eq!((rows[0].table.as_str(), rows[0].field.as_str()), ("(unknown)", "Amount"));
        assert_eq!((rows[1].table.as_str(), rows[1].field.as_str()), ("(unknown)", "(unknown)"));
        assert_eq!((rows[2].table.as_str(), rows[2].field.as_str()), ("Sales", "(unknown)"));
        assert!(rows.iter().all(|r| !r.table.trim().is_empty() && !r.field.trim().is_empty()));
    }

    #[test]
    fn identical_usages_get_distinct_ids() {
        let same = usage(Some("Sales"), Some("Amount"));
        let rows = canonical_rows(&[same.clone(), same.clone(), same]);
        let ids: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(rows[1].id, "Sales|Overview|v1|Values|Sales|Amount#1");
    }

    #[test]
    fn derived_keys_and_search_text() {
        let mut hidden = usage(Some("Sales"), Some("Amount"));
        hidden.is_hidden_filter = true;
        let row = &canonical_rows(&[hidden])[0];
        assert!(row.hidden_usage);
        assert_eq!(row.report_page_key, "Sales|Overview");
        assert_eq!(row.report_visual_key, "Sales|v1");
        assert!(row.search_text.contains("revenue by region"));
        assert!(row.search_text.contains("sum(sales.amount)"));
        assert_eq!(row.search_text, row.search_text.to_lowercase());
    }
}
