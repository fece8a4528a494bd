//! Property catalogue
//!
//! The three composition properties the verifier can check, with the names
//! and descriptions used in reports.

use serde::{Deserialize, Serialize};

/// Category of a checked property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Composition never permits what a component denies
    MonotonicRestriction,
    /// Every reachable joint state has a globally permitted action
    DeadlockFreedom,
    /// A higher-priority denial is never overridden
    PriorityOrdering,
}

impl PropertyKind {
    /// Every kind, in `verify_all` order.
    pub const ALL: [PropertyKind; 3] = [
        PropertyKind::MonotonicRestriction,
        PropertyKind::DeadlockFreedom,
        PropertyKind::PriorityOrdering,
    ];

    /// Stable snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            PropertyKind::MonotonicRestriction => "monotonic_restriction",
            PropertyKind::DeadlockFreedom => "deadlock_freedom",
            PropertyKind::PriorityOrdering => "priority_ordering",
        }
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, described property ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// Property category
    pub kind: PropertyKind,
    /// Report name
    pub name: String,
    /// One-sentence description
    pub description: String,
    /// Highest to lowest priority; empty unless `kind` is priority ordering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_order: Vec<String>,
}

impl PropertySpec {
    /// Composition never increases permissions.
    pub fn monotonic_restriction() -> Self {
        Self {
            kind: PropertyKind::MonotonicRestriction,
            name: PropertyKind::MonotonicRestriction.name().to_string(),
            description: "Composing protocols never increases permissions: the composed system \
                          is at most as permissive as the most restrictive component."
                .to_string(),
            priority_order: Vec::new(),
        }
    }

    /// No reachable joint state blocks every action.
    pub fn deadlock_freedom() -> Self {
        Self {
            kind: PropertyKind::DeadlockFreedom,
            name: PropertyKind::DeadlockFreedom.name().to_string(),
            description: "No reachable composed state exists in which every action in the union \
                          alphabet is blocked by at least one protocol."
                .to_string(),
            priority_order: Vec::new(),
        }
    }

    /// Priority ordering for the given ranking, highest first.
    pub fn priority_ordering<S: AsRef<str>>(priority_order: &[S]) -> Self {
        let priority_order: Vec<String> = priority_order
            .iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        Self {
            kind: PropertyKind::PriorityOrdering,
            name: PropertyKind::PriorityOrdering.name().to_string(),
            description: format!(
                "Higher-priority protocols always override lower ones. Verified order: {}.",
                priority_order.join(" > ")
            ),
            priority_order,
        }
    }

    /// The catalogue entry for `kind`; priority ordering uses `priority`.
    pub fn for_kind<S: AsRef<str>>(kind: PropertyKind, priority: &[S]) -> Self {
        match kind {
            PropertyKind::MonotonicRestriction => Self::monotonic_restriction(),
            PropertyKind::DeadlockFreedom => Self::deadlock_freedom(),
            PropertyKind::PriorityOrdering => Self::priority_ordering(priority),
        }
    }
}

/// Human-readable text for a violation reached via `path`.
pub fn describe_violation(kind: PropertyKind, path: &[String]) -> String {
    let path = if path.is_empty() {
        "(initial state)".to_string()
    } else {
        path.join(" -> ")
    };
    match kind {
        PropertyKind::MonotonicRestriction => format!(
            "Monotonic restriction violated: composition expanded permissions after actions: {path}"
        ),
        PropertyKind::DeadlockFreedom => format!("Deadlock found after actions: {path}"),
        PropertyKind::PriorityOrdering => format!(
            "Priority ordering violated: lower-priority protocol overrode higher-priority denial after actions: {path}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_snake_case() {
        for kind in PropertyKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.name());
        }
        assert_eq!(PropertyKind::DeadlockFreedom.to_string(), "deadlock_freedom");
    }

    #[test]
    fn priority_spec_lists_order() {
        let spec = PropertySpec::priority_ordering(&["ASP", "ATP", "AEAP"]);
        assert_eq!(spec.priority_order[0], "ASP");
        assert!(spec.description.ends_with("Verified order: ASP > ATP > AEAP."));
        assert!(PropertySpec::deadlock_freedom().priority_order.is_empty());
    }

    #[test]
    fn violation_text() {
        assert_eq!(
            describe_violation(
                PropertyKind::DeadlockFreedom,
                &["read".to_string(), "write".to_string()]
            ),
            "Deadlock found after actions: read -> write"
        );
        assert!(describe_violation(PropertyKind::PriorityOrdering, &[]).ends_with("(initial state)"));
    }
}
