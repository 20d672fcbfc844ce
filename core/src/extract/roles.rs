//! Role-order propagation for visual projections.
//!
//! Roles are cumulative: a field seen under role N is also recorded under roles
//! 0..N-1, and every sighting starts a fresh emission round. Usages are counted per
//! role downstream, so repeats are kept rather than deduplicated. The first `queryRef`
//! seen for a field identity becomes the canonical form for every later emission of
//! that field within the visual.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProjectionEntry {
    pub query_ref: String,
    /// `Table.Field` identity; `None` falls back to the literal `queryRef`.
    pub identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RoleProjection {
    pub role: String,
    pub entries: Vec<ProjectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RoleEmission {
    pub role: String,
    pub query_ref: String,
}

pub(crate) fn propagate_roles(roles: &[RoleProjection]) -> Vec<RoleEmission> {
    let mut canonical: HashMap<String, String> = HashMap::new();
    let mut out = Vec::new();

    for (role_idx, role) in roles.iter().enumerate() {
        let mut seen_in_role: HashSet<&str> = HashSet::new();
        for entry in &role.entries {
            if !seen_in_role.insert(entry.query_ref.as_str()) {
                continue;
            }
            let identity = entry
                .identity
                .clone()
                .unwrap_or_else(|| entry.query_ref.clone());
            let canonical_ref = canonical
                .entry(identity)
                .or_insert_with(|| entry.query_ref.clone())
                .clone();

            for prior in &roles[..=role_idx] {
                out.push(RoleEmission {
                    role: prior.role.clone(),
                    query_ref: canonical_ref.clone(),
                });
            }
        }
    }

    out
}
