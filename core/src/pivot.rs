//! Nested `report → table → field → page → count` view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{label_or_unknown, Aggregation};
use crate::types::NormalisedFieldUsage;

pub type PageCounts = BTreeMap<String, usize>;
pub type FieldPages = BTreeMap<String, PageCounts>;
pub type TableFields = BTreeMap<String, FieldPages>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pivot {
    reports: BTreeMap<String, TableFields>,
}

impl Pivot {
    fn add(&mut self, report: &str, table: &str, field: &str, page: &str, count: usize) {
        *self
            .reports
            .entry(report.to_string())
            .or_default()
            .entry(table.to_string())
            .or_default()
            .entry(field.to_string())
            .or_default()
            .entry(page.to_string())
            .or_insert(0) += count;
    }

    pub fn count(&self, report: &str, table: &str, field: &str, page: &str) -> usize {
        self.reports
            .get(report)
            .and_then(|tables| tables.get(table))
            .and_then(|fields| fields.get(field))
            .and_then(|pages| pages.get(page))
            .copied()
            .unwrap_or(0)
    }

    pub fn reports(&self) -> impl Iterator<Item = (&str, &TableFields)> {
        self.reports.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

pub fn pivot_from_usages(usages: &[NormalisedFieldUsage]) -> Pivot {
    let mut pivot = Pivot::default();
    for usage in usages {
        pivot.add(
            &usage.report,
            label_or_unknown(usage.table.as_deref()),
            label_or_unknown(usage.field.as_deref()),
            &usage.page,
            1,
        );
    }
    pivot
}

pub fn pivot_from_aggregation(aggregation: &Aggregation) -> Pivot {
    let mut pivot = Pivot::default();
    for field in &aggregation.fields {
        for page in &field.pages {
            pivot.add(&field.report, &field.table, &field.field, &page.page, page.count);
        }
    }
    pivot
}
