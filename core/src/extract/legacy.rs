//! Extractor for the legacy single-document layout (`Report/Layout`).
//!
//! Shape (all keys optional):
//! `{ filters, sections: [{ name, displayName, ordinal, config, filters,
//!   visualContainers: [{ config, filters }] }] }`
//! where every `config`/`filters` value may be a JSON string rather than an object.

use log::debug;
use serde_json::Value;

use super::{
    decode_blob, json_path, json_str, literal_title, prototype_from_select_item, read_filters,
    scalar_text, PageScope, ProjectionEntry, ReportExtractor, RoleProjection, VisualScope,
};
use crate::classify::PrototypeSelect;
use crate::query_ref::{first_table_field, parse_query_ref};
use crate::sentinels;
use crate::types::{ExtractionContext, ExtractionResult, RawFieldReference};

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyLayoutExtractor;

impl ReportExtractor for LegacyLayoutExtractor {
    type Input = Value;

    fn extract(&self, layout: &Value, report_name: &str) -> ExtractionResult {
        extract_legacy_layout(layout, report_name)
    }
}

/// `Table.Field` identity of a legacy `queryRef`.
///
/// Expressions are identified by the first pair they wrap; plain references split on
/// the first dot, so table names containing spaces stay whole. Plain and wrapped forms
/// of the same column share an identity.
pub fn field_identity_from_query_ref(query_ref: &str) -> Option<String> {
    if query_ref.contains('(') {
        return first_table_field(query_ref).map(|(table, field)| format!("{table}.{field}"));
    }
    let parsed = parse_query_ref(query_ref);
    match (parsed.table, parsed.field) {
        (Some(table), Some(field)) => Some(format!("{table}.{field}")),
        _ => None,
    }
}

pub fn extract_legacy_layout(layout: &Value, report_name: &str) -> ExtractionResult {
    let mut context = ExtractionContext::new(report_name);
    let mut references: Vec<RawFieldReference> = Vec::new();

    let sections = layout
        .get("sections")
        .and_then(Value::as_array)
        .map(|s| ordered_sections(s))
        .unwrap_or_default();

    let mut page_index: i64 = 0;
    for section in sections {
        let Some(page) = page_scope(section, page_index) else {
            debug!("legacy section without a usable name skipped");
            continue;
        };
        page_index += 1;
        context
            .page_order
            .entry(page.name.clone())
            .or_insert(page.index);

        references.extend(page.filter_references(
            &VisualScope::page(),
            sentinels::ROLE_PAGE_FILTER,
            read_filters(section.get("filters")),
        ));

        let containers = section
            .get("visualContainers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (visual_idx, container) in containers.iter().enumerate() {
            references.extend(extract_visual(&page, container, visual_idx));
        }
    }

    references.extend(PageScope::report().filter_references(
        &VisualScope::report(),
        sentinels::ROLE_REPORT_FILTER,
        read_filters(layout.get("filters")),
    ));

    ExtractionResult {
        references,
        context,
    }
}

/// Sections sorted by `ordinal` when present, otherwise by document position.
fn ordered_sections(sections: &[Value]) -> Vec<&Value> {
    let mut keyed: Vec<(i64, usize, &Value)> = sections
        .iter()
        .enumerate()
        .filter(|(_, section)| section.is_object())
        .map(|(idx, section)| {
            let ordinal = section
                .get("ordinal")
                .and_then(Value::as_i64)
                .unwrap_or(idx as i64);
            (ordinal, idx, section)
        })
        .collect();
    keyed.sort_by_key(|(ordinal, idx, _)| (*ordinal, *idx));
    keyed.into_iter().map(|(_, _, section)| section).collect()
}

fn page_scope(section: &Value, index: i64) -> Option<PageScope> {
    let id = json_str(section, "name").map(str::to_string);
    let name = json_str(section, "displayName")
        .map(str::to_string)
        .or_else(|| id.clone())?;
    let page_type =
        decode_blob(section.get("config")).and_then(|config| scalar_text(config.get("type")));
    Some(PageScope {
        index,
        name,
        id,
        page_type,
    })
}

fn extract_visual(
    page: &PageScope,
    container: &Value,
    visual_idx: usize,
) -> Vec<RawFieldReference> {
    let Some(config) = decode_blob(container.get("config")) else {
        debug!(
            "visual container {visual_idx} on page '{}' has no decodable config; skipped",
            page.name
        );
        return Vec::new();
    };

    let single = config.get("singleVisual");
    let visual = VisualScope {
        id: scalar_text(config.get("name"))
            .or_else(|| scalar_text(container.get("id")))
            .unwrap_or_else(|| format!("visual-{visual_idx}")),
        visual_type: single
            .and_then(|s| json_str(s, "visualType"))
            .unwrap_or(sentinels::UNKNOWN_VISUAL_TYPE)
            .to_string(),
        title: literal_title(single.and_then(|s| s.get("vcObjects"))),
        hidden: Some(is_hidden_visual(&config)),
    };

    let mut out = Vec::new();
    if let Some(single) = single {
        let hints = prototype_hints(single);
        let roles = role_projections(single);
        out.extend(page.projection_references(&visual, &roles, &hints));
    }

    let filters = container
        .get("filters")
        .or_else(|| config.get("filters"));
    out.extend(page.filter_references(
        &visual,
        sentinels::ROLE_VISUAL_FILTER,
        read_filters(filters),
    ));
    out
}

fn is_hidden_visual(config: &Value) -> bool {
    if config.get("isHidden").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    let mode = json_path(config, &["singleVisual", "display", "mode"]).and_then(Value::as_str);
    matches!(mode, Some(m) if m.eq_ignore_ascii_case("hidden"))
}

fn prototype_hints(single: &Value) -> Vec<PrototypeSelect> {
    json_path(single, &["prototypeQuery", "Select"])
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(prototype_from_select_item).collect())
        .unwrap_or_default()
}

fn role_projections(single: &Value) -> Vec<RoleProjection> {
    let Some(projections) = single.get("projections").and_then(Value::as_object) else {
        return Vec::new();
    };
    projections
        .iter()
        .map(|(role, items)| RoleProjection {
            role: role.clone(),
            entries: items
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| json_str(item, "queryRef"))
                        .map(|query_ref| ProjectionEntry {
                            query_ref: query_ref.to_string(),
                            identity: field_identity_from_query_ref(query_ref),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}
