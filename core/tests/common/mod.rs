//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub fn column(entity: &str, property: &str) -> Value {
    json!({"Column": {"Expression": {"SourceRef": {"Entity": entity}}, "Property": property}})
}

pub fn measure(entity: &str, property: &str) -> Value {
    json!({"Measure": {"Expression": {"SourceRef": {"Entity": entity}}, "Property": property}})
}

/// A legacy visual container whose config blob is string-encoded, as Desktop writes it.
pub fn legacy_visual(id: &str, visual_type: &str, projections: Value) -> Value {
    let config = json!({
        "name": id,
        "singleVisual": {"visualType": visual_type, "projections": projections}
    });
    json!({"config": config.to_string()})
}

pub fn legacy_section(name: &str, ordinal: i64, visuals: Vec<Value>) -> Value {
    json!({
        "name": format!("section-{ordinal}"),
        "displayName": name,
        "ordinal": ordinal,
        "visualContainers": visuals
    })
}

pub fn legacy_layout(sections: Vec<Value>, report_filters: Vec<Value>) -> Value {
    json!({
        "sections": sections,
        "filters": Value::Array(report_filters).to_string()
    })
}

pub fn filter_on(field: Value) -> Value {
    json!({"expression": field})
}

pub fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// In-memory ZIP archive with the given entries, rewound for reading.
pub fn zip_archive(entries: &[(&str, Vec<u8>)]) -> Cursor<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap_or_else(|e| panic!("failed to start entry {name}: {e}"));
        writer
            .write_all(bytes)
            .unwrap_or_else(|e| panic!("failed to write entry {name}: {e}"));
    }
    let mut cursor = writer.finish().expect("finish zip");
    cursor.set_position(0);
    cursor
}

/// A `.pbix`-shaped archive carrying `layout` as UTF-16LE `Report/Layout`.
pub fn pbix_with_layout(layout: &Value) -> Cursor<Vec<u8>> {
    zip_archive(&[
        ("[Content_Types].xml", b"<Types/>".to_vec()),
        ("Version", utf16le_with_bom("1.28")),
        ("Report/Layout", utf16le_with_bom(&layout.to_string())),
    ])
}

/// A zipped PBIP report with one page per `(page id, display name, visuals)` entry.
pub fn pbip_archive(report: &str, pages: &[(&str, &str, Vec<(&str, Value)>)]) -> Cursor<Vec<u8>> {
    let base = format!("{report}.Report/definition");
    let mut entries: Vec<(String, Vec<u8>)> = vec![
        (format!("{base}/report.json"), b"{}".to_vec()),
        (
            format!("{base}/pages/pages.json"),
            json!({"pageOrder": pages.iter().map(|(id, _, _)| *id).collect::<Vec<_>>()})
                .to_string()
                .into_bytes(),
        ),
    ];
    for (page_id, display_name, visuals) in pages {
        entries.push((
            format!("{base}/pages/{page_id}/page.json"),
            json!({"name": page_id, "displayName": display_name})
                .to_string()
                .into_bytes(),
        ));
        for (visual_id, visual) in visuals {
            entries.push((
                format!("{base}/pages/{page_id}/visuals/{visual_id}/visual.json"),
                visual.to_string().into_bytes(),
            ));
        }
    }
    let borrowed: Vec<(&str, Vec<u8>)> = entries
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.clone()))
        .collect();
    zip_archive(&borrowed)
}

pub fn pbir_visual(
    id: &str,
    visual_type: &str,
    role: &str,
    projections: Vec<(Value, &str)>,
) -> Value {
    let projections: Vec<Value> = projections
        .into_iter()
        .map(|(field, query_ref)| json!({"field": field, "queryRef": query_ref}))
        .collect();
    json!({
        "name": id,
        "visual": {
            "visualType": visual_type,
            "query": {"queryState": {role: {"projections": projections}}}
        }
    })
}
