//! Raw field-reference extraction.
//!
//! Two extractors walk the two report schemas and share one output contract
//! (`ExtractionResult`):
//! - `LegacyLayoutExtractor` reads the single `Report/Layout` document, where page and
//!   visual configs are JSON blobs that may be string-encoded.
//! - `DirectoryExtractor` reads the PBIR folder format, one JSON document per page and
//!   per visual, ordered by `pages.json`.
//!
//! Extraction degrades by omission: a page or visual that cannot be decoded is skipped
//! and its siblings are still processed.

mod filters;
mod legacy;
mod pbir;
mod roles;

use serde_json::Value;

use crate::classify::PrototypeSelect;
use crate::sentinels;
use crate::types::{ExtractionResult, RawFieldReference};

pub use legacy::{extract_legacy_layout, field_identity_from_query_ref, LegacyLayoutExtractor};
pub use pbir::{extract_directory, DirectoryExtractor};

pub(crate) use filters::{read_filters, resolve_field_expr, FieldShape, FilterReference};
pub(crate) use roles::{propagate_roles, ProjectionEntry, RoleProjection};

/// Capability shared by both schema walkers.
pub trait ReportExtractor {
    type Input: ?Sized;

    fn extract(&self, input: &Self::Input, report_name: &str) -> ExtractionResult;
}

/// Page-level context stamped onto every reference found on a page.
#[derive(Debug, Clone)]
pub(crate) struct PageScope {
    pub index: i64,
    pub name: String,
    pub id: Option<String>,
    pub page_type: Option<String>,
}

impl PageScope {
    pub fn report() -> Self {
        Self {
            index: sentinels::REPORT_PAGE_INDEX,
            name: sentinels::REPORT_PAGE_NAME.to_string(),
            id: Some(sentinels::REPORT_PAGE_ID.to_string()),
            page_type: None,
        }
    }

    pub fn reference(
        &self,
        visual: &VisualScope,
        role: &str,
        query_ref: String,
    ) -> RawFieldReference {
        RawFieldReference {
            page_index: self.index,
            page_name: self.name.clone(),
            page_id: self.id.clone(),
            page_type: self.page_type.clone(),
            visual_id: visual.id.clone(),
            visual_type: visual.visual_type.clone(),
            visual_title: visual.title.clone(),
            role: role.to_string(),
            query_ref,
            prototype_select: Vec::new(),
            is_hidden_visual: visual.hidden,
            is_hidden_filter: None,
        }
    }

    /// References for page-, report- or visual-level filters.
    pub fn filter_references(
        &self,
        visual: &VisualScope,
        role: &str,
        filters: Vec<FilterReference>,
    ) -> Vec<RawFieldReference> {
        filters
            .into_iter()
            .map(|filter| {
                let mut reference = self.reference(visual, role, filter.query_ref);
                reference.is_hidden_filter = Some(filter.is_hidden);
                reference
            })
            .collect()
    }

    /// Expands a visual's role projections into references.
    pub fn projection_references(
        &self,
        visual: &VisualScope,
        roles: &[RoleProjection],
        hints: &[PrototypeSelect],
    ) -> Vec<RawFieldReference> {
        propagate_roles(roles)
            .into_iter()
            .map(|emission| {
                let mut reference = self.reference(visual, &emission.role, emission.query_ref);
                reference.prototype_select = hints.to_vec();
                reference
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VisualScope {
    pub id: String,
    pub visual_type: String,
    pub title: Option<String>,
    pub hidden: Option<bool>,
}

impl VisualScope {
    pub fn report() -> Self {
        Self::synthetic(sentinels::REPORT_VISUAL_ID, sentinels::REPORT_VISUAL_TYPE)
    }

    pub fn page() -> Self {
        Self::synthetic(sentinels::PAGE_VISUAL_ID, sentinels::PAGE_VISUAL_TYPE)
    }

    pub fn drillthrough() -> Self {
        Self::synthetic(sentinels::PAGE_VISUAL_ID, sentinels::DRILLTHROUGH_VISUAL_TYPE)
    }

    fn synthetic(id: &str, visual_type: &str) -> Self {
        Self {
            id: id.to_string(),
            visual_type: visual_type.to_string(),
            title: None,
            hidden: None,
        }
    }
}

/// Decodes a config blob that may be stored either as a JSON object or as a string
/// containing JSON.
pub(crate) fn decode_blob(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::String(text) => {
            if text.trim().is_empty() {
                return None;
            }
            serde_json::from_str(text).ok()
        }
        Value::Object(_) | Value::Array(_) => value.cloned(),
        _ => None,
    }
}

/// Follows a path of object keys.
pub(crate) fn json_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

pub(crate) fn json_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

/// Renders a scalar identifier (string or number) as text.
pub(crate) fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a static title literal from a visual's formatting objects.
///
/// Titles are stored as DAX literals (`'Sales by Region'`); the surrounding quotes are
/// removed and doubled quotes unescaped.
pub(crate) fn literal_title(objects: Option<&Value>) -> Option<String> {
    let first = objects?.get("title")?.as_array()?.first()?;
    let raw = json_path(first, &["properties", "text", "expr", "Literal", "Value"])?.as_str()?;
    let unquoted = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw)
        .replace("''", "'");
    if unquoted.trim().is_empty() {
        None
    } else {
        Some(unquoted)
    }
}

/// Converts one `prototypeQuery.Select` item into a kind hint.
pub(crate) fn prototype_from_select_item(item: &Value) -> Option<PrototypeSelect> {
    let name = json_str(item, "Name")?.to_string();
    let (kind, aggregation) = if item.get("Measure").is_some() {
        (Some("measure".to_string()), None)
    } else if let Some(agg) = item.get("Aggregation") {
        let function = scalar_text(agg.get("Function")).unwrap_or_else(|| "0".to_string());
        (None, Some(function))
    } else if item.get("Column").is_some() {
        (Some("column".to_string()), None)
    } else {
        (None, None)
    };
    Some(PrototypeSelect {
        name,
        kind,
        aggregation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_blob_accepts_string_and_object() {
        let encoded = json!("{\"a\":1}");
        let object = json!({"a": 1});
        assert_eq!(decode_blob(Some(&encoded)), Some(json!({"a": 1})));
        assert_eq!(decode_blob(Some(&object)), Some(json!({"a": 1})));
        assert_eq!(decode_blob(Some(&json!("not json"))), None);
        assert_eq!(decode_blob(Some(&json!(42))), None);
        assert_eq!(decode_blob(None), None);
    }

    #[test]
    fn literal_title_strips_dax_quotes() {
        let objects = json!({
            "title": [{"properties": {"text": {"expr": {"Literal": {"Value": "'Sales by Region'"}}}}}]
        });
        assert_eq!(literal_title(Some(&objects)).as_deref(), Some("Sales by Region"));
    }

    #[test]
    fn select_items_map_to_hints() {
        let measure = json!({"Measure": {}, "Name": "Sales.Total"});
        let agg = json!({"Aggregation": {"Function": 0}, "Name": "Sum(Sales.Amount)"});
        let column = json!({"Column": {}, "Name": "Sales.Region"});
        assert!(prototype_from_select_item(&measure).is_some_and(|h| h.signals_measure()));
        assert!(prototype_from_select_item(&agg).is_some_and(|h| h.signals_measure()));
        assert!(prototype_from_select_item(&column).is_some_and(|h| !h.signals_measure()));
        assert_eq!(prototype_from_select_item(&json!({"Column": {}})), None);
    }
}
