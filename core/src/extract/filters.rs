//! Filter-shape reader shared by both schemas.
//!
//! Recognised filter targets: a plain column, a measure, and an aggregation wrapping a
//! column (rendered as `Sum(Entity.Property)`). Anything else is dropped, and filter
//! JSON that fails to decode yields no references at all.

use log::debug;
use serde_json::Value;

use super::{decode_blob, json_path, json_str};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FilterReference {
    pub query_ref: String,
    pub is_hidden: bool,
}

/// Structural shape of a query-model field expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldShape {
    Column,
    Measure,
    Aggregation { function: Option<i64> },
    HierarchyLevel,
}

/// Reads filters from a legacy string-encoded array, a plain array, or a PBIR
/// `filterConfig` object.
pub(crate) fn read_filters(value: Option<&Value>) -> Vec<FilterReference> {
    let Some(decoded) = decode_blob(value) else {
        return Vec::new();
    };
    let filters = match &decoded {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => match decoded.get("filters").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut out = Vec::new();
    for filter in filters {
        let Some(target) = filter.get("expression").or_else(|| filter.get("field")) else {
            debug!("filter without expression skipped");
            continue;
        };
        let Some((query_ref, shape)) = resolve_field_expr(target) else {
            debug!("unsupported filter target skipped");
            continue;
        };
        if shape == FieldShape::HierarchyLevel {
            continue;
        }
        let is_hidden = filter
            .get("isHiddenInViewMode")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        out.push(FilterReference {
            query_ref,
            is_hidden,
        });
    }
    out
}

/// Renders a field expression (`Column`, `Measure` or `Aggregation` over a column) as a
/// query reference.
pub(crate) fn resolve_field_expr(expr: &Value) -> Option<(String, FieldShape)> {
    if let Some(column) = expr.get("Column") {
        return entity_property(column).map(|qr| (qr, FieldShape::Column));
    }
    if let Some(measure) = expr.get("Measure") {
        return entity_property(measure).map(|qr| (qr, FieldShape::Measure));
    }
    if let Some(aggregation) = expr.get("Aggregation") {
        let inner = json_path(aggregation, &["Expression", "Column"])?;
        let function = aggregation.get("Function").and_then(Value::as_i64);
        return entity_property(inner)
            .map(|qr| (format!("Sum({qr})"), FieldShape::Aggregation { function }));
    }
    if let Some(level) = expr.get("HierarchyLevel") {
        let hierarchy = json_path(level, &["Expression", "Hierarchy"])?;
        let entity = json_path(hierarchy, &["Expression", "SourceRef", "Entity"])?.as_str()?;
        let name = json_str(hierarchy, "Hierarchy")?;
        return Some((format!("{entity}.{name}"), FieldShape::HierarchyLevel));
    }
    None
}

fn entity_property(node: &Value) -> Option<String> {
    let entity = json_path(node, &["Expression", "SourceRef", "Entity"])
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())?;
    let property = json_str(node, "Property")?;
    Some(format!("{entity}.{property}"))
}
