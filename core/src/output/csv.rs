use std::io::Write;

use super::ExportError;
use crate::projection::{CanonicalUsageRow, DetailsRow, SummaryRow};

const LIST_SEPARATOR: &str = "|";

pub const SUMMARY_HEADERS: [&str; 9] = [
    "table",
    "field",
    "fieldKind",
    "totalUses",
    "reportCount",
    "pageCount",
    "visualCount",
    "hiddenOnly",
    "reports",
];

pub const DETAILS_HEADERS: [&str; 12] = [
    "report",
    "page",
    "pageIndex",
    "table",
    "field",
    "fieldKind",
    "totalUses",
    "visualCount",
    "roles",
    "visualTypes",
    "hiddenUsageCount",
    "hiddenOnly",
];

pub const USAGE_HEADERS: [&str; 18] = [
    "id",
    "report",
    "page",
    "pageIndex",
    "pageId",
    "pageType",
    "visualId",
    "visualType",
    "visualTitle",
    "role",
    "table",
    "field",
    "fieldKind",
    "queryRef",
    "expression",
    "hiddenUsage",
    "isHiddenVisual",
    "isHiddenFilter",
];

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn joined<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values.into_iter().collect::<Vec<_>>().join(LIST_SEPARATOR)
}

pub fn write_summary_csv<W: Write>(w: W, rows: &[SummaryRow]) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(w);
    out.write_record(SUMMARY_HEADERS)?;
    for row in rows {
        out.write_record([
            row.table.clone(),
            row.field.clone(),
            row.field_kind.to_string(),
            row.total_uses.to_string(),
            row.report_count.to_string(),
            row.page_count.to_string(),
            row.visual_count.to_string(),
            row.hidden_only.to_string(),
            joined(row.reports.iter().map(|r| r.report.as_str())),
        ])?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_details_csv<W: Write>(w: W, rows: &[DetailsRow]) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(w);
    out.write_record(DETAILS_HEADERS)?;
    for row in rows {
        out.write_record([
            row.report.clone(),
            row.page.clone(),
            row.page_index.to_string(),
            row.table.clone(),
            row.field.clone(),
            row.field_kind.to_string(),
            row.total_uses.to_string(),
            row.visual_count.to_string(),
            joined(row.roles.iter().map(String::as_str)),
            joined(row.visual_types.iter().map(String::as_str)),
            row.hidden_usage_count.to_string(),
            row.hidden_only.to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_usages_csv<W: Write>(w: W, rows: &[CanonicalUsageRow]) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(w);
    out.write_record(USAGE_HEADERS)?;
    for row in rows {
        out.write_record([
            row.id.clone(),
            row.report.clone(),
            row.page.clone(),
            row.page_index.to_string(),
            opt(&row.page_id),
            opt(&row.page_type),
            row.visual_id.clone(),
            row.visual_type.clone(),
            opt(&row.visual_title),
            row.role.clone(),
            row.table.clone(),
            row.field.clone(),
            row.field_kind.to_string(),
            row.query_ref.clone(),
            opt(&row.expression),
            row.hidden_usage.to_string(),
            row.is_hidden_visual.to_string(),
            row.is_hidden_filter.to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FieldKind;
    use crate::projection::{canonical_rows, details_rows, summary_rows};
    use crate::types::NormalisedFieldUsage;

    fn usage(report: &str, visual_type: &str, role: &str) -> NormalisedFieldUsage {
        NormalisedFieldUsage {
            report: report.to_string(),
            page: "Overview, main".to_string(),
            page_index: 0,
            page_id: None,
            page_type: None,
            visual_id: format!("{visual_type}-1"),
            visual_type: visual_type.to_string(),
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

    fn csv_lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .expect("utf8")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn summary_joins_reports_with_pipe() {
        let rows = summary_rows(&canonical_rows(&[
            usage("North", "card", "Values"),
            usage("South", "card", "Values"),
        ]));
        let mut buf = Vec::new();
        write_summary_csv(&mut buf, &rows).expect("write csv");
        let lines = csv_lines(buf);
        assert_eq!(lines[0], SUMMARY_HEADERS.join(","));
        assert_eq!(lines[1], "Sales,Amount,column,2,2,2,2,false,North|South");
    }

    #[test]
    fn details_quote_commas_and_join_lists() {
        let rows = details_rows(&canonical_rows(&[
            usage("R", "table", "Values"),
            usage("R", "card", "Category"),
        ]));
        let mut buf = Vec::new();
        write_details_csv(&mut buf, &rows).expect("write csv");
        let lines = csv_lines(buf);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "R,\"Overview, main\",0,Sales,Amount,column,2,2,Category|Values,card|table,0,false"
        );
    }

    #[test]
    fn missing_optionals_become_empty_cells() {
        let rows = canonical_rows(&[usage("R", "card", "Values")]);
        let mut buf = Vec::new();
        write_usages_csv(&mut buf, &rows).expect("write csv");
        let lines = csv_lines(buf);
        let cells: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(lines[0].split(',').count(), USAGE_HEADERS.len());
        assert!(lines[1].contains(",0,,,card-1,card,,Values,"));
        assert_eq!(cells.last().copied(), Some("false"));
    }
}
