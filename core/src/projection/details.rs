use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::CanonicalUsageRow;
use crate::aggregate::KindTally;
use crate::classify::FieldKind;

/// Usage of one `table.field` on one page of one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsRow {
    pub report: String,
    pub page: String,
    pub page_index: i64,
    pub table: String,
    pub field: String,
    pub field_kind: FieldKind,
    pub total_uses: usize,
    pub visual_count: usize,
    pub roles: Vec<String>,
    pub visual_types: Vec<String>,
    pub hidden_usage_count: usize,
    pub hidden_only: bool,
}

struct DetailsAccumulator<'a> {
    row: &'a CanonicalUsageRow,
    page_index: i64,
    total: usize,
    hidden: usize,
    kinds: KindTally,
    visuals: HashSet<&'a str>,
    roles: BTreeSet<&'a str>,
    visual_types: BTreeSet<&'a str>,
}

impl<'a> DetailsAccumulator<'a> {
    fn new(row: &'a CanonicalUsageRow) -> Self {
        Self {
            row,
            page_index: row.page_index,
            total: 0,
            hidden: 0,
            kinds: KindTally::default(),
            visuals: HashSet::new(),
            roles: BTreeSet::new(),
            visual_types: BTreeSet::new(),
        }
    }

    fn add(&mut self, row: &'a CanonicalUsageRow) {
        self.total += 1;
        if row.hidden_usage {
            self.hidden += 1;
        }
        self.page_index = self.page_index.min(row.page_index);
        self.kinds.add(row.field_kind);
        self.visuals.insert(&row.report_visual_key);
        self.roles.insert(&row.role);
        self.visual_types.insert(&row.visual_type);
    }

    fn finish(self) -> DetailsRow {
        DetailsRow {
            report: self.row.report.clone(),
            page: self.row.page.clone(),
            page_index: self.page_index,
            table: self.row.table.clone(),
            field: self.row.field.clone(),
            field_kind: self.kinds.dominant(),
            total_uses: self.total,
            visual_count: self.visuals.len(),
            roles: self.roles.into_iter().map(str::to_string).collect(),
            visual_types: self.visual_types.into_iter().map(str::to_string).collect(),
            hidden_usage_count: self.hidden,
            hidden_only: self.hidden == self.total,
        }
    }
}

/// Groups canonical rows by `report|page|table|field`.
pub fn details_rows(rows: &[CanonicalUsageRow]) -> Vec<DetailsRow> {
    let mut groups: HashMap<(&str, &str, &str, &str), DetailsAccumulator<'_>> = HashMap::new();
    for row in rows {
        let key = (
            row.report.as_str(),
            row.page.as_str(),
            row.table.as_str(),
            row.field.as_str(),
        );
        groups
            .entry(key)
            .or_insert_with(|| DetailsAccumulator::new(row))
            .add(row);
    }

    let mut out: Vec<DetailsRow> = groups.into_values().map(DetailsAccumulator::finish).collect();
    out.sort_by(|a, b| {
        a.report
            .cmp(&b.report)
            .then_with(|| a.page_index.cmp(&b.page_index))
            .then_with(|| a.page.cmp(&b.page))
            .then_with(|| a.table.cmp(&b.table))
            .then_with(|| a.field.cmp(&b.field))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::canonical_rows;
    use crate::types::NormalisedFieldUsage;

    fn usage(
        report: &str,
        page: &str,
        page_index: i64,
        visual: &str,
        role: &str,
    ) -> NormalisedFieldUsage {
        NormalisedFieldUsage {
            report: report.to_string(),
            page: page.to_string(),
            page_index,
            page_id: None,
            page_type: None,
            visual_id: visual.to_string(),
            visual_type: format!("{visual}Chart"),
            visual_title: None,
            role: role.to_string(),
            query_ref: "Sales.Amount".to_string(),
            table: Some("Sales".to_string()),
            field: Some("Amount".to_string()),
            field_kind: FieldKind::Column,
            expression: None,
            expression_components: None,
            is_hidden_visual: false,
            is_hidden_filter: false,
        }
    }

    fn details(usages: &[NormalisedFieldUsage]) -> Vec<DetailsRow> {
        details_rows(&canonical_rows(usages))
    }

    #[test]
    fn minimum_page_index_wins() {
        let rows = details(&[
            usage("R", "Overview", 3, "bar", "Values"),
            usage("R", "Overview", 1, "bar", "Values"),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].page_index, 1);
        assert_eq!(rows[0].total_uses, 2);
        assert_eq!(rows[0].visual_count, 1);
    }

    #[test]
    fn roles_and_visual_types_are_sorted_and_unique() {
        let rows = details(&[
            usage("R", "P", 0, "pie", "Values"),
            usage("R", "P", 0, "bar", "Category"),
            usage("R", "P", 0, "bar", "Values"),
        ]);
        let row = &rows[0];
        assert_eq!(row.roles, vec!["Category".to_string(), "Values".to_string()]);
        assert_eq!(row.visual_types, vec!["barChart".to_string(), "pieChart".to_string()]);
        assert_eq!(row.visual_count, 2);
    }

    #[test]
    fn hidden_counts() {
        let mut hidden = usage("R", "P", 0, "bar", "Values");
        hidden.is_hidden_filter = true;
        let rows = details(&[hidden.clone(), usage("R", "P", 0, "pie", "Values")]);
        assert_eq!(rows[0].hidden_usage_count, 1);
        assert!(!rows[0].hidden_only);

        let rows = details(&[hidden]);
        assert!(rows[0].hidden_only);
    }

    #[test]
    fn rows_ordered_by_report_then_page_index() {
        let rows = details(&[
            usage("B", "First", 0, "bar", "Values"),
            usage("A", "Second", 1, "bar", "Values"),
            usage("A", "Report", -1, "report", "report-filter"),
            usage("A", "First", 0, "bar", "Values"),
        ]);
        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.report.as_str(), r.page.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("A", "Report"), ("A", "First"), ("A", "Second"), ("B", "First")]
        );
    }
}
