use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::CanonicalUsageRow;
use crate::aggregate::KindTally;
use crate::classify::FieldKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPage {
    pub page: String,
    pub page_index: i64,
    pub uses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub report: String,
    pub uses: usize,
    /// Ordered by page index, then page name.
    pub pages: Vec<SummaryPage>,
}

/// Usage of one `table.field` across every analysed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub table: String,
    pub field: String,
    pub field_kind: FieldKind,
    pub total_uses: usize,
    pub report_count: usize,
    pub page_count: usize,
    pub visual_count: usize,
    pub hidden_only: bool,
    /// Ordered by uses descending, then report name.
    pub reports: Vec<SummaryReport>,
}

#[derive(Default)]
struct ReportAccumulator {
    uses: usize,
    // page name -> (minimum index, uses)
    pages: HashMap<String, (i64, usize)>,
}

struct SummaryAccumulator<'a> {
    table: &'a str,
    field: &'a str,
    total: usize,
    hidden: usize,
    kinds: KindTally,
    report_pages: HashSet<&'a str>,
    report_visuals: HashSet<&'a str>,
    reports: BTreeMap<&'a str, ReportAccumulator>,
}

impl<'a> SummaryAccumulator<'a> {
    fn new(row: &'a CanonicalUsageRow) -> Self {
        Self {
            table: &row.table,
            field: &row.field,
            total: 0,
            hidden: 0,
            kinds: KindTally::default(),
            report_pages: HashSet::new(),
            report_visuals: HashSet::new(),
            reports: BTreeMap::new(),
        }
    }

    fn add(&mut self, row: &'a CanonicalUsageRow) {
        self.total += 1;
        if row.hidden_usage {
            self.hidden += 1;
        }
        self.kinds.add(row.field_kind);
        self.report_pages.insert(&row.report_page_key);
        self.report_visuals.insert(&row.report_visual_key);

        let report = self.reports.entry(&row.report).or_default();
        report.uses += 1;
        let page = report
            .pages
            .entry(row.page.clone())
            .or_insert((row.page_index, 0));
        page.0 = page.0.min(row.page_index);
        page.1 += 1;
    }

    fn finish(self) -> SummaryRow {
        let mut reports: Vec<SummaryReport> = self
            .reports
            .into_iter()
            .map(|(report, acc)| {
                let mut pages: Vec<SummaryPage> = acc
                    .pages
                    .into_iter()
                    .map(|(page, (page_index, uses))| SummaryPage {
                        page,
                        page_index,
                        uses,
                    })
                    .collect();
                pages.sort_by(|a, b| {
                    a.page_index
                        .cmp(&b.page_index)
                        .then_with(|| a.page.cmp(&b.page))
                });
                SummaryReport {
                    report: report.to_string(),
                    uses: acc.uses,
                    pages,
                }
            })
            .collect();
        reports.sort_by(|a, b| b.uses.cmp(&a.uses).then_with(|| a.report.cmp(&b.report)));

        SummaryRow {
            table: self.table.to_string(),
            field: self.field.to_string(),
            field_kind: self.kinds.dominant(),
            total_uses: self.total,
            report_count: reports.len(),
            page_count: self.report_pages.len(),
            visual_count: self.report_visuals.len(),
            hidden_only: self.total > 0 && self.hidden == self.total,
            reports,
        }
    }
}

/// Groups canonical rows by `table|field`, ignoring the report.
pub fn summary_rows(rows: &[CanonicalUsageRow]) -> Vec<SummaryRow> {
    let mut groups: HashMap<(&str, &str), SummaryAccumulator<'_>> = HashMap::new();
    for row in rows {
        groups
            .entry((row.table.as_str(), row.field.as_str()))
            .or_insert_with(|| SummaryAccumulator::new(row))
            .add(row);
    }

    let mut out: Vec<SummaryRow> = groups.into_values().map(SummaryAccumulator::finish).collect();
    out.sort_by(|a, b| {
        b.total_uses
            .cmp(&a.total_uses)
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
        field: &str,
    ) -> NormalisedFieldUsage {
        NormalisedFieldUsage {
            report: report.to_string(),
            page: page.to_string(),
            page_index,
            page_id: None,
            page_type: None,
            visual_id: visual.to_string(),
            visual_type: "table".to_string(),
            visual_title: None,
            role: "Values".to_string(),
            query_ref: format!("Sales.{field}"),
            table: Some("Sales".to_string()),
            field: Some(field.to_string()),
            field_kind: FieldKind::Column,
            expression: None,
            expression_components: None,
            is_hidden_visual: false,
            is_hidden_filter: false,
        }
    }

    fn summarize(usages: &[NormalisedFieldUsage]) -> Vec<SummaryRow> {
        summary_rows(&canonical_rows(usages))
    }

    #[test]
    fn same_field_in_two_reports_is_one_row() {
        let rows = summarize(&[
            usage("North", "Overview", 0, "v1", "Amount"),
            usage("South", "Overview", 0, "v1", "Amount"),
        ]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.report_count, 2);
        assert_eq!(row.page_count, 2);
        assert_eq!(row.visual_count, 2);
        assert_eq!(row.total_uses, 2);
    }

    #[test]
    fn reports_and_pages_are_ordered() {
        let rows = summarize(&[
            usage("Beta", "Detail", 1, "v1", "Amount"),
            usage("Alpha", "Detail", 4, "v2", "Amount"),
            usage("Alpha", "Detail", 2, "v3", "Amount"),
            usage("Alpha", "Cover", 2, "v4", "Amount"),
            usage("Gamma", "Only", 0, "v5", "Amount"),
        ]);
        let row = &rows[0];
        let order: Vec<&str> = row.reports.iter().map(|r| r.report.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Beta", "Gamma"]);

        let alpha = &row.reports[0];
        assert_eq!(alpha.uses, 3);
        let pages: Vec<(&str, i64, usize)> = alpha
            .pages
            .iter()
            .map(|p| (p.page.as_str(), p.page_index, p.uses))
            .collect();
        assert_eq!(pages, vec![("Cover", 2, 1), ("Detail", 2, 2)]);
    }

    #[test]
    fn rows_sorted_by_uses_then_table_then_field() {
        let rows = summarize(&[
            usage("R", "P", 0, "v1", "Zeta"),
            usage("R", "P", 0, "v1", "Beta"),
            usage("R", "P", 0, "v2", "Alpha"),
            usage("R", "P", 0, "v3", "Alpha"),
        ]);
        let fields: Vec<&str> = rows.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["Alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn hidden_only_requires_every_usage_hidden() {
        let mut hidden = usage("R", "P", 0, "v1", "Amount");
        hidden.is_hidden_visual = true;
        let rows = summarize(&[hidden.clone(), hidden.clone()]);
        assert!(rows[0].hidden_only);

        let rows = summarize(&[hidden, usage("R", "P", 0, "v2", "Amount")]);
        assert!(!rows[0].hidden_only);
    }

    #[test]
    fn kind_ties_resolve_to_smaller_name() {
        let mut measure = usage("R", "P", 0, "v1", "Amount");
        measure.field_kind = FieldKind::Measure;
        let column = usage("R", "P", 0, "v2", "Amount");
        let rows = summarize(&[measure.clone(), column]);
        assert_eq!(rows[0].field_kind, FieldKind::Column);

        let rows = summarize(&[measure.clone(), measure, usage("R", "P", 0, "v2", "Amount")]);
        assert_eq!(rows[0].field_kind, FieldKind::Measure);
    }
}
