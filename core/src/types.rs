use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::{FieldKind, PrototypeSelect};
use crate::query_ref::ExpressionComponents;

/// One observed occurrence of a field or expression, exactly as the source document
/// states it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFieldReference {
    pub page_index: i64,
    pub page_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    pub visual_id: String,
    pub visual_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_title: Option<String>,
    pub role: String,
    pub query_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prototype_select: Vec<PrototypeSelect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hidden_visual: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hidden_filter: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionContext {
    pub report_name: String,
    /// Page display name to zero-based position.
    pub page_order: BTreeMap<String, i64>,
}

impl ExtractionContext {
    pub fn new(report_name: impl Into<String>) -> Self {
        Self {
            report_name: report_name.into(),
            page_order: BTreeMap::new(),
        }
    }

    /// Page names sorted by their recorded position.
    pub fn pages_in_order(&self) -> Vec<(&str, i64)> {
        let mut pages: Vec<(&str, i64)> = self
            .page_order
            .iter()
            .map(|(name, idx)| (name.as_str(), *idx))
            .collect();
        pages.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub references: Vec<RawFieldReference>,
    pub context: ExtractionContext,
}

/// A raw reference after parsing and classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalisedFieldUsage {
    pub report: String,
    pub page: String,
    pub page_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    pub visual_id: String,
    pub visual_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_title: Option<String>,
    pub role: String,
    pub query_ref: String,
    pub table: Option<String>,
    pub field: Option<String>,
    pub field_kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_components: Option<ExpressionComponents>,
    pub is_hidden_visual: bool,
    pub is_hidden_filter: bool,
}

impl NormalisedFieldUsage {
    pub fn is_hidden(&self) -> bool {
        self.is_hidden_visual || self.is_hidden_filter
    }
}

/// Output of one end-to-end run over a single report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub raw: Vec<RawFieldReference>,
    pub normalised: Vec<NormalisedFieldUsage>,
}
