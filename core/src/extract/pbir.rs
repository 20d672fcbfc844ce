//! Extractor for the PBIR directory format.
//!
//! Expected documents, relative to any prefix ending in `definition/`:
//! - `report.json` (report-level `filterConfig`)
//! - `pages/pages.json` (`pageOrder`: ordered page ids)
//! - `pages/<page>/page.json` (`displayName`, `filterConfig`, `pageBinding`)
//! - `pages/<page>/visuals/<visual>/visual.json` (`visual.query.queryState`,
//!   `filterConfig`, `isHidden`)
//!
//! Each document is decoded on its own; one that fails to decode is skipped.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::Value;

use super::{
    json_path, json_str, literal_title, read_filters, resolve_field_expr, scalar_text,
    FieldShape, PageScope, ProjectionEntry, ReportExtractor, RoleProjection, VisualScope,
};
use crate::classify::PrototypeSelect;
use crate::query_ref::parse_query_ref;
use crate::sentinels;
use crate::source::DirectoryDocuments;
use crate::types::{ExtractionContext, ExtractionResult, RawFieldReference};

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryExtractor;

impl ReportExtractor for DirectoryExtractor {
    type Input = DirectoryDocuments;

    fn extract(&self, docs: &DirectoryDocuments, report_name: &str) -> ExtractionResult {
        extract_directory(docs, report_name)
    }
}

#[derive(Debug, Default)]
struct PageDocs<'a> {
    page: Option<&'a str>,
    visuals: BTreeMap<&'a str, &'a str>,
}

#[derive(Debug, Default)]
struct DefinitionLayout<'a> {
    report: Option<&'a str>,
    pages_index: Option<&'a str>,
    pages: BTreeMap<&'a str, PageDocs<'a>>,
}

enum DocRole<'a> {
    Report,
    PagesIndex,
    Page { page_id: &'a str },
    Visual { page_id: &'a str, visual_id: &'a str },
    Other,
}

fn classify_path(path: &str) -> DocRole<'_> {
    let segments: Vec<&str> = path.split('/').collect();
    let at = |back: usize| segment_from_end(&segments, back);

    match at(1) {
        Some("report.json") if at(2) == Some("definition") => DocRole::Report,
        Some("pages.json") if at(2) == Some("pages") => DocRole::PagesIndex,
        Some("page.json") if at(3) == Some("pages") => match at(2) {
            Some(page_id) => DocRole::Page { page_id },
            None => DocRole::Other,
        },
        Some("visual.json") if at(3) == Some("visuals") && at(5) == Some("pages") => {
            match (at(4), at(2)) {
                (Some(page_id), Some(visual_id)) => DocRole::Visual { page_id, visual_id },
                _ => DocRole::Other,
            }
        }
        _ => DocRole::Other,
    }
}

fn segment_from_end<'a>(segments: &[&'a str], back: usize) -> Option<&'a str> {
    let idx = segments.len().checked_sub(back)?;
    segments.get(idx).copied()
}

fn layout_of(docs: &DirectoryDocuments) -> DefinitionLayout<'_> {
    let mut layout = DefinitionLayout::default();
    for (path, text) in docs.iter() {
        match classify_path(path) {
            DocRole::Report => layout.report = Some(text),
            DocRole::PagesIndex => layout.pages_index = Some(text),
            DocRole::Page { page_id } => layout.pages.entry(page_id).or_default().page = Some(text),
            DocRole::Visual { page_id, visual_id } => {
                layout
                    .pages
                    .entry(page_id)
                    .or_default()
                    .visuals
                    .insert(visual_id, text);
            }
            DocRole::Other => {}
        }
    }
    layout
}

fn parse_doc(path_hint: &str, text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            debug!("{path_hint}: not a JSON object; skipped");
            None
        }
        Err(err) => {
            warn!("{path_hint}: JSON parse error: {err}; skipped");
            None
        }
    }
}

/// Page ids in display order: ids listed in `pageOrder` first, then any remaining page
/// folders in id order.
fn page_order<'a>(layout: &DefinitionLayout<'a>) -> Vec<&'a str> {
    let listed: Vec<String> = layout
        .pages_index
        .and_then(|text| parse_doc("pages.json", text))
        .and_then(|index| index.get("pageOrder").and_then(Value::as_array).cloned())
        .map(|ids| ids.iter().filter_map(|id| id.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let mut ordered: Vec<&'a str> = Vec::with_capacity(layout.pages.len());
    for id in &listed {
        if let Some((key, _)) = layout.pages.get_key_value(id.as_str()) {
            if !ordered.contains(key) {
                ordered.push(*key);
            }
        }
    }
    for key in layout.pages.keys() {
        if !ordered.contains(key) {
            ordered.push(*key);
        }
    }
    ordered
}

pub fn extract_directory(docs: &DirectoryDocuments, report_name: &str) -> ExtractionResult {
    let layout = layout_of(docs);
    let mut context = ExtractionContext::new(report_name);
    let mut references: Vec<RawFieldReference> = Vec::new();

    let mut page_index: i64 = 0;
    for page_id in page_order(&layout) {
        let Some(page_docs) = layout.pages.get(page_id) else {
            continue;
        };
        let Some(page_json) = page_docs.page.and_then(|text| parse_doc(page_id, text)) else {
            debug!("page '{page_id}' has no readable page.json; skipped");
            continue;
        };

        let page = PageScope {
            index: page_index,
            name: json_str(&page_json, "displayName")
                .or_else(|| json_str(&page_json, "name"))
                .unwrap_or(page_id)
                .to_string(),
            id: Some(json_str(&page_json, "name").unwrap_or(page_id).to_string()),
            page_type: page_type(&page_json),
        };
        page_index += 1;
        context
            .page_order
            .entry(page.name.clone())
            .or_insert(page.index);

        references.extend(page.filter_references(
            &VisualScope::page(),
            sentinels::ROLE_PAGE_FILTER,
            read_filters(page_json.get("filterConfig")),
        ));
        references.extend(drillthrough_references(&page, &page_json));

        for (visual_id, text) in &page_docs.visuals {
            let Some(visual_json) = parse_doc(visual_id, text) else {
                continue;
            };
            references.extend(extract_visual(&page, visual_id, &visual_json));
        }
    }

    if let Some(report_json) = layout.report.and_then(|text| parse_doc("report.json", text)) {
        references.extend(PageScope::report().filter_references(
            &VisualScope::report(),
            sentinels::ROLE_REPORT_FILTER,
            read_filters(report_json.get("filterConfig")),
        ));
    }

    ExtractionResult {
        references,
        context,
    }
}

fn page_type(page_json: &Value) -> Option<String> {
    json_path(page_json, &["pageBinding", "type"])
        .and_then(|v| scalar_text(Some(v)))
        .or_else(|| scalar_text(page_json.get("type")))
}

fn drillthrough_references(page: &PageScope, page_json: &Value) -> Vec<RawFieldReference> {
    let Some(parameters) =
        json_path(page_json, &["pageBinding", "parameters"]).and_then(Value::as_array)
    else {
        return Vec::new();
    };
    let visual = VisualScope::drillthrough();
    parameters
        .iter()
        .filter_map(|param| param.get("fieldExpr"))
        .filter_map(resolve_field_expr)
        .map(|(query_ref, _)| {
            page.reference(&visual, sentinels::ROLE_DRILLTHROUGH_FIELD, query_ref)
        })
        .collect()
}

fn extract_visual(page: &PageScope, folder_id: &str, doc: &Value) -> Vec<RawFieldReference> {
    let body = doc.get("visual");
    let visual = VisualScope {
        id: json_str(doc, "name").unwrap_or(folder_id).to_string(),
        visual_type: body
            .and_then(|v| json_str(v, "visualType"))
            .unwrap_or(sentinels::UNKNOWN_VISUAL_TYPE)
            .to_string(),
        title: literal_title(body.and_then(|v| v.get("visualContainerObjects")))
            .or_else(|| literal_title(body.and_then(|v| v.get("objects")))),
        hidden: Some(doc.get("isHidden").and_then(Value::as_bool).unwrap_or(false)),
    };

    let mut out = Vec::new();
    if let Some(query_state) = body
        .and_then(|v| json_path(v, &["query", "queryState"]))
        .and_then(Value::as_object)
    {
        let mut hints: Vec<PrototypeSelect> = Vec::new();
        let roles: Vec<RoleProjection> = query_state
            .iter()
            .map(|(role, state)| RoleProjection {
                role: role.clone(),
                entries: state
                    .get("projections")
                    .and_then(Value::as_array)
                    .map(|projections| {
                        projections
                            .iter()
                            .filter_map(|projection| projection_entry(projection, &mut hints))
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();
        out.extend(page.projection_references(&visual, &roles, &hints));
    }

    out.extend(page.filter_references(
        &visual,
        sentinels::ROLE_VISUAL_FILTER,
        read_filters(doc.get("filterConfig")),
    ));
    out
}

/// Builds a role entry from one PBIR projection and records the kind hint its field
/// expression implies.
fn projection_entry(
    projection: &Value,
    hints: &mut Vec<PrototypeSelect>,
) -> Option<ProjectionEntry> {
    let resolved = projection.get("field").and_then(resolve_field_expr);
    let query_ref = json_str(projection, "queryRef")
        .map(str::to_string)
        .or_else(|| resolved.as_ref().map(|(qr, _)| qr.clone()))?;

    if let Some((_, shape)) = &resolved {
        if !hints.iter().any(|h| h.name == query_ref) {
            hints.push(hint_for_shape(&query_ref, *shape));
        }
    }

    Some(ProjectionEntry {
        identity: projection_identity(projection, &query_ref),
        query_ref,
    })
}

/// `Table.Field` identity of a PBIR projection.
///
/// Prefers the structured `field` expression (an aggregation is identified by the column
/// it wraps) and falls back to the parsed `queryRef` when the field is absent or of an
/// unrecognised shape.
fn projection_identity(projection: &Value, query_ref: &str) -> Option<String> {
    let field = projection.get("field");
    let structured = field.and_then(|f| {
        if let Some(inner) = json_path(f, &["Aggregation", "Expression"]) {
            return resolve_field_expr(inner).map(|(qr, _)| qr);
        }
        resolve_field_expr(f).map(|(qr, _)| qr)
    });
    structured.or_else(|| {
        let parsed = parse_query_ref(query_ref);
        match (parsed.table, parsed.field) {
            (Some(table), Some(field)) => Some(format!("{table}.{field}")),
            _ => None,
        }
    })
}

fn hint_for_shape(query_ref: &str, shape: FieldShape) -> PrototypeSelect {
    let (kind, aggregation) = match shape {
        FieldShape::Measure => (Some("measure".to_string()), None),
        FieldShape::Aggregation { function } => {
            (None, Some(function.unwrap_or(0).to_string()))
        }
        FieldShape::Column => (Some("column".to_string()), None),
        FieldShape::HierarchyLevel => (Some("hierarchyLevel".to_string()), None),
    };
    PrototypeSelect {
        name: query_ref.to_string(),
        kind,
        aggregation,
    }
}
