//! Per-field aggregation of normalised usages.
//!
//! Usages are grouped by `report|table|field` (missing halves become `(unknown)`). Each
//! group records where the field is used (pages, visual types, roles), which kind it
//! mostly is, and how many of its usages are hidden.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::classify::FieldKind;
use crate::sentinels::UNKNOWN_LABEL;
use crate::types::NormalisedFieldUsage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageUsage {
    pub page: String,
    pub page_index: i64,
    pub count: usize,
    pub visual_ids: Vec<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUsageAggregate {
    pub key: String,
    pub report: String,
    pub table: String,
    pub field: String,
    pub field_kind: FieldKind,
    pub total_count: usize,
    /// Sorted by page index, then page name.
    pub pages: Vec<PageUsage>,
    pub visual_types: BTreeMap<String, usize>,
    pub roles: BTreeMap<String, usize>,
    pub hidden_usage_count: usize,
    pub has_hidden_usages: bool,
    pub has_visible_usages: bool,
}

impl FieldUsageAggregate {
    pub fn page(&self, name: &str) -> Option<&PageUsage> {
        self.pages.iter().find(|p| p.page == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub name: String,
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSummary {
    pub total_fields: usize,
    pub total_usages: usize,
    /// Distinct fields per dominant kind.
    pub fields_by_kind: BTreeMap<FieldKind, usize>,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    /// Sorted by report, table, then field.
    pub fields: Vec<FieldUsageAggregate>,
    /// Distinct pages with their first-seen index, sorted by index then name.
    pub pages: Vec<PageInfo>,
    pub summary: AggregationSummary,
}

/// Occurrence counts per field kind with a deterministic winner.
#[derive(Debug, Clone, Default)]
pub(crate) struct KindTally {
    counts: HashMap<FieldKind, usize>,
}

impl KindTally {
    pub fn add(&mut self, kind: FieldKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    /// Highest count wins; ties go to the lexicographically smaller kind name.
    pub fn dominant(&self) -> FieldKind {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.as_str().cmp(a.0.as_str())))
            .map(|(kind, _)| *kind)
            .unwrap_or(FieldKind::Unknown)
    }
}

pub(crate) fn label_or_unknown(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => UNKNOWN_LABEL,
    }
}

pub(crate) fn aggregation_key(report: &str, table: &str, field: &str) -> String {
    format!("{report}|{table}|{field}")
}

#[derive(Default)]
struct PageAccumulator {
    page_index: i64,
    count: usize,
    visual_ids: BTreeSet<String>,
    roles: BTreeSet<String>,
}

struct FieldAccumulator {
    report: String,
    table: String,
    field: String,
    total_count: usize,
    pages: HashMap<String, PageAccumulator>,
    visual_types: BTreeMap<String, usize>,
    roles: BTreeMap<String, usize>,
    kinds: KindTally,
    hidden: usize,
    visible: usize,
}

impl FieldAccumulator {
    fn new(report: &str, table: &str, field: &str) -> Self {
        Self {
            report: report.to_string(),
            table: table.to_string(),
            field: field.to_string(),
            total_count: 0,
            pages: HashMap::new(),
            visual_types: BTreeMap::new(),
            roles: BTreeMap::new(),
            kinds: KindTally::default(),
            hidden: 0,
            visible: 0,
        }
    }

    fn add(&mut self, usage: &NormalisedFieldUsage) {
        self.total_count += 1;
        let page = self
            .pages
            .entry(usage.page.clone())
            .or_insert_with(|| PageAccumulator {
                page_index: usage.page_index,
                ..PageAccumulator::default()
            });
        page.count += 1;
        page.visual_ids.insert(usage.visual_id.clone());
        page.roles.insert(usage.role.clone());

        *self.visual_types.entry(usage.visual_type.clone()).or_insert(0) += 1;
        *self.roles.entry(usage.role.clone()).or_insert(0) += 1;
        self.kinds.add(usage.field_kind);
        if usage.is_hidden() {
            self.hidden += 1;
        } else {
            self.visible += 1;
        }
    }

    fn finish(self, key: String) -> FieldUsageAggregate {
        let mut pages: Vec<PageUsage> = self
            .pages
            .into_iter()
            .map(|(page, acc)| PageUsage {
                page,
                page_index: acc.page_index,
                count: acc.count,
                visual_ids: acc.visual_ids.into_iter().collect(),
                roles: acc.roles.into_iter().collect(),
            })
            .collect();
        pages.sort_by(|a, b| a.page_index.cmp(&b.page_index).then_with(|| a.page.cmp(&b.page)));

        FieldUsageAggregate {
            key,
            report: self.report,
            table: self.table,
            field: self.field,
            field_kind: self.kinds.dominant(),
            total_count: self.total_count,
            pages,
            visual_types: self.visual_types,
            roles: self.roles,
            hidden_usage_count: self.hidden,
            has_hidden_usages: self.hidden > 0,
            has_visible_usages: self.visible > 0,
        }
    }
}

pub fn aggregate_usages(usages: &[NormalisedFieldUsage]) -> Aggregation {
    let mut groups: HashMap<String, FieldAccumulator> = HashMap::new();
    let mut first_seen_pages: HashMap<&str, i64> = HashMap::new();

    for usage in usages {
        let table = label_or_unknown(usage.table.as_deref());
        let field = label_or_unknown(usage.field.as_deref());
        let key = aggregation_key(&usage.report, table, field);
        groups
            .entry(key)
            .or_insert_with(|| FieldAccumulator::new(&usage.report, table, field))
            .add(usage);
        first_seen_pages
            .entry(usage.page.as_str())
            .or_insert(usage.page_index);
    }

    let mut fields: Vec<FieldUsageAggregate> = groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key))
        .collect();
    fields.sort_by(|a, b| {
        a.report
            .cmp(&b.report)
            .then_with(|| a.table.cmp(&b.table))
            .then_with(|| a.field.cmp(&b.field))
    });

    let mut pages: Vec<PageInfo> = first_seen_pages
        .into_iter()
        .map(|(name, index)| PageInfo {
            name: name.to_string(),
            index,
        })
        .collect();
    pages.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.name.cmp(&b.name)));

    let mut fields_by_kind: BTreeMap<FieldKind, usize> = BTreeMap::new();
    for field in &fields {
        *fields_by_kind.entry(field.field_kind).or_insert(0) += 1;
    }

    let summary = AggregationSummary {
        total_fields: fields.len(),
        total_usages: usages.len(),
        fields_by_kind,
        page_count: pages.len(),
    };

    Aggregation {
        fields,
        pages,
        summary,
    }
}
