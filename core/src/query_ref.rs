//! Query-reference parsing.
//!
//! A query reference (`queryRef`) is the string a report uses to name a field or an
//! expression in its query model, e.g. `Sales.Amount` or `Sum(Sales.Amount)`. Parsing is
//! total: every input yields a `ParsedQueryRef`, with `None` standing in for anything the
//! string does not carry.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static TABLE_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_]+)\.([A-Za-z0-9_ ]+)").expect("table.field pattern compiles")
});

static AGGREGATION_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(CountRows|Sum|Count|Average|Min|Max|Distinct)\(")
        .expect("aggregation prefix pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQueryRef {
    pub table: Option<String>,
    pub field: Option<String>,
    pub expression: Option<String>,
    pub is_expression: bool,
}

/// Tables, qualified fields and the leading aggregation function referenced by an
/// expression string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    pub tables: Vec<String>,
    /// `Table.Field` pairs in first-seen order.
    pub fields: Vec<String>,
}

pub fn parse_query_ref(query_ref: &str) -> ParsedQueryRef {
    if query_ref.contains('(') {
        let (table, field) = match first_table_field(query_ref) {
            Some((table, field)) => (Some(table), Some(field)),
            None => (None, None),
        };
        return ParsedQueryRef {
            table,
            field,
            expression: Some(query_ref.to_string()),
            is_expression: true,
        };
    }

    if let Some((table, field)) = query_ref.split_once('.') {
        return ParsedQueryRef {
            table: non_blank(table),
            field: non_blank(field),
            expression: None,
            is_expression: false,
        };
    }

    ParsedQueryRef {
        table: None,
        field: non_blank(query_ref),
        expression: None,
        is_expression: false,
    }
}

/// Every `Table.Field` occurrence plus the leading aggregation keyword, if any.
pub fn decompose_expression(expression: &str) -> ExpressionComponents {
    let mut components = ExpressionComponents {
        aggregation: aggregation_function(expression).map(str::to_string),
        ..ExpressionComponents::default()
    };

    for caps in TABLE_FIELD_RE.captures_iter(expression) {
        let table = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let field = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        if table.is_empty() || field.is_empty() {
            continue;
        }
        if !components.tables.iter().any(|t| t == table) {
            components.tables.push(table.to_string());
        }
        let qualified = format!("{table}.{field}");
        if !components.fields.contains(&qualified) {
            components.fields.push(qualified);
        }
    }

    components
}

/// The aggregation function name an expression starts with, as written.
pub(crate) fn aggregation_function(expression: &str) -> Option<&str> {
    AGGREGATION_PREFIX_RE
        .captures(expression)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// First `Table.Field` pair inside `text`, trimmed. Blank halves count as no match.
pub(crate) fn first_table_field(text: &str) -> Option<(String, String)> {
    let caps = TABLE_FIELD_RE.captures(text)?;
    let table = caps.get(1)?.as_str().trim();
    let field = caps.get(2)?.as_str().trim();
    if table.is_empty() || field.is_empty() {
        return None;
    }
    Some((table.to_string(), field.to_string()))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_column_splits_on_first_dot() {
        let parsed = parse_query_ref("Sales.Amount.Net");
        assert_eq!(parsed.table.as_deref(), Some("Sales"));
        assert_eq!(parsed.field.as_deref(), Some("Amount.Net"));
        assert!(!parsed.is_expression);
        assert_eq!(parsed.expression, None);
    }

    #[test]
    fn segments_are_trimmed() {
        let parsed = parse_query_ref("  Sales . Amount ");
        assert_eq!(parsed.table.as_deref(), Some("Sales"));
        assert_eq!(parsed.field.as_deref(), Some("Amount"));
    }

    #[test]
    fn aggregation_expression_extracts_inner_pair() {
        let parsed = parse_query_ref("Sum(Sales.Amount)");
        assert!(parsed.is_expression);
        assert_eq!(parsed.table.as_deref(), Some("Sales"));
        assert_eq!(parsed.field.as_deref(), Some("Amount"));
        assert_eq!(parsed.expression.as_deref(), Some("Sum(Sales.Amount)"));
    }

    #[test]
    fn expression_without_pair_keeps_only_text() {
        let parsed = parse_query_ref("CountRows()");
        assert!(parsed.is_expression);
        assert_eq!(parsed.table, None);
        assert_eq!(parsed.field, None);
        assert_eq!(parsed.expression.as_deref(), Some("CountRows()"));
    }

    #[test]
    fn bare_name_is_a_field_without_table() {
        let parsed = parse_query_ref("AmountOnly");
        assert_eq!(parsed.table, None);
        assert_eq!(parsed.field.as_deref(), Some("AmountOnly"));
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        for input in ["", ".", "(", ")", "((Sales.", "Sum(", "   ", ".Amount", "Sales."] {
            let parsed = parse_query_ref(input);
            assert_eq!(parsed.is_expression, input.contains('('), "input {input:?}");
        }
        let dot = parse_query_ref(".");
        assert_eq!(dot.table, None);
        assert_eq!(dot.field, None);
    }

    #[test]
    fn field_with_spaces_inside_expression() {
        let parsed = parse_query_ref("Sum(Sales.Sales Amount)");
        assert_eq!(parsed.field.as_deref(), Some("Sales Amount"));
    }

    #[test]
    fn decompose_collects_all_pairs_and_aggregation() {
        let components =
            decompose_expression("sum(Sales.Amount) / Sum(Budget.Amount) + Sales.Amount");
        assert_eq!(components.aggregation.as_deref(), Some("sum"));
        assert_eq!(components.tables, vec!["Sales".to_string(), "Budget".to_string()]);
        assert_eq!(
            components.fields,
            vec!["Sales.Amount".to_string(), "Budget.Amount".to_string()]
        );
    }

    #[test]
    fn decompose_without_aggregation_prefix() {
        let components = decompose_expression("Divide(Sales.Amount, Sales.Qty)");
        assert_eq!(components.aggregation, None);
        assert_eq!(components.fields.len(), 2);
    }

    #[test]
    fn count_rows_prefix_is_recognised() {
        assert_eq!(aggregation_function("CountRows(Sales)"), Some("CountRows"));
        assert_eq!(aggregation_function("Count(Sales.Id)"), Some("Count"));
        assert_eq!(aggregation_function("DistinctCount(Sales.Id)"), None);
    }
}
