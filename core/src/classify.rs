//! Field-kind classification.
//!
//! Prototype metadata supplied by the source document wins over the shape of the
//! reference string; shape rules only apply when no hint says otherwise.

use serde::{Deserialize, Serialize};

use crate::query_ref::aggregation_function;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Column,
    Measure,
    Calculated,
    Context,
    Unknown,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Column,
        FieldKind::Measure,
        FieldKind::Calculated,
        FieldKind::Context,
        FieldKind::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Measure => "measure",
            Self::Calculated => "calculated",
            Self::Context => "context",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative kind hint for one selected item of a visual's query.
///
/// Newer documents carry an explicit `kind`; older ones only record the aggregation
/// function applied to the item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrototypeSelect {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
}

impl PrototypeSelect {
    pub fn signals_measure(&self) -> bool {
        if self.aggregation.is_some() {
            return true;
        }
        self.kind.as_deref().is_some_and(|kind| {
            kind.eq_ignore_ascii_case("measure") || kind.eq_ignore_ascii_case("aggregation")
        })
    }
}

/// Literal used by visuals to bind the row context rather than a field.
pub const CONTEXT_REFERENCE: &str = ".";

pub fn classify_field(query_ref: &str, hints: &[PrototypeSelect]) -> FieldKind {
    if query_ref == CONTEXT_REFERENCE {
        return FieldKind::Context;
    }
    if hints
        .iter()
        .any(|hint| hint.name == query_ref && hint.signals_measure())
    {
        return FieldKind::Measure;
    }
    if aggregation_function(query_ref).is_some() {
        return FieldKind::Measure;
    }
    if query_ref.contains('(') {
        return FieldKind::Calculated;
    }
    if query_ref.contains('.') {
        return FieldKind::Column;
    }
    FieldKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure_hint(name: &str) -> PrototypeSelect {
        PrototypeSelect {
            name: name.to_string(),
            kind: Some("measure".to_string()),
            aggregation: None,
        }
    }

    #[test]
    fn dot_literal_is_context() {
        assert_eq!(classify_field(".", &[measure_hint(".")]), FieldKind::Context);
    }

    #[test]
    fn prototype_hint_overrides_column_shape() {
        assert_eq!(
            classify_field("Sales.Amount", &[measure_hint("Sales.Amount")]),
            FieldKind::Measure
        );
    }

    #[test]
    fn legacy_aggregation_hint_counts_as_measure() {
        let hint = PrototypeSelect {
            name: "Sales.Qty".to_string(),
            kind: None,
            aggregation: Some("0".to_string()),
        };
        assert_eq!(classify_field("Sales.Qty", &[hint]), FieldKind::Measure);
    }

    #[test]
    fn hint_for_other_name_is_ignored() {
        assert_eq!(
            classify_field("Sales.Region", &[measure_hint("Sales.Amount")]),
            FieldKind::Column
        );
    }

    #[test]
    fn column_hint_does_not_force_measure() {
        let hint = PrototypeSelect {
            name: "Sales.Region".to_string(),
            kind: Some("column".to_string()),
            aggregation: None,
        };
        assert_eq!(classify_field("Sales.Region", &[hint]), FieldKind::Column);
    }

    #[test]
    fn aggregation_prefix_is_case_insensitive() {
        assert_eq!(classify_field("SUM(Sales.Amount)", &[]), FieldKind::Measure);
        assert_eq!(classify_field("countrows(Sales)", &[]), FieldKind::Measure);
    }

    #[test]
    fn other_functions_are_calculated() {
        assert_eq!(classify_field("Divide(Sales.A, Sales.B)", &[]), FieldKind::Calculated);
        assert_eq!(classify_field("CountNonNull(Sales.Id)", &[]), FieldKind::Calculated);
    }

    #[test]
    fn bare_names_are_unknown() {
        assert_eq!(classify_field("AmountOnly", &[]), FieldKind::Unknown);
        assert_eq!(classify_field("", &[]), FieldKind::Unknown);
    }

    #[test]
    fn kind_names_sort_lexicographically() {
        let mut names: Vec<&str> = FieldKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["calculated", "column", "context", "measure", "unknown"]);
    }
}
