//! Joint states across a composition

use crate::model::StateId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Position of every composed protocol, in protocol order.
///
/// This is the explicit state value passed through composition and
/// verification in place of moving protocol cursors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointState(Vec<StateId>);

impl JointState {
    /// Wrap per-protocol positions.
    pub fn new(positions: Vec<StateId>) -> Self {
        Self(positions)
    }

    /// Per-protocol positions.
    pub fn positions(&self) -> &[StateId] {
        &self.0
    }

    /// Position of the `i`-th protocol.
    pub fn get(&self, i: usize) -> Option<StateId> {
        self.0.get(i).copied()
    }

    /// Number of protocols covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the joint state covers no protocols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<StateId> for JointState {
    fn from_iter<I: IntoIterator<Item = StateId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Snapshot of a joint state by name, plus the actions that reached it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedState {
    /// Protocol name -> state name, in protocol order
    pub states: IndexMap<String, String>,
    /// Actions taken from the joint initial state
    pub actions: Vec<String>,
}

impl ComposedState {
    /// Create a snapshot.
    pub fn new(states: IndexMap<String, String>, actions: Vec<String>) -> Self {
        Self { states, actions }
    }

    /// State of the named protocol.
    pub fn state_of(&self, protocol: &str) -> Option<&str> {
        self.states.get(protocol).map(String::as_str)
    }

    /// Whether no action was needed to reach this state.
    pub fn is_initial(&self) -> bool {
        self.actions.is_empty()
    }

    /// Action path rendered as `a -> b`, or `(initial state)`.
    pub fn path_display(&self) -> String {
        if self.actions.is_empty() {
            "(initial state)".to_string()
        } else {
            self.actions.join(" -> ")
        }
    }
}

impl std::fmt::Display for ComposedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joint: Vec<String> = self
            .states
            .iter()
            .map(|(protocol, state)| format!("{protocol}={state}"))
            .collect();
        write!(f, "{{{}}} via {}", joint.join(", "), self.path_display())
    }
}

/// A joint state that disproves a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterexample {
    /// The offending joint state
    pub state: ComposedState,
    /// The action at fault; `None` when the state itself is the violation
    pub action: Option<String>,
}

impl Counterexample {
    /// Counterexample for a single offending action.
    pub fn for_action(state: ComposedState, action: impl Into<String>) -> Self {
        Self {
            state,
            action: Some(action.into()),
        }
    }

    /// Counterexample where the state itself is the violation.
    pub fn at_state(state: ComposedState) -> Self {
        Self {
            state,
            action: None,
        }
    }
}

impl std::fmt::Display for Counterexample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.action {
            Some(action) => write!(f, "{} on '{action}'", self.state),
            None => write!(f, "{}", self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(actions: &[&str]) -> ComposedState {
        let mut states = IndexMap::new();
        states.insert("ATP".to_string(), "low".to_string());
        states.insert("BROKEN".to_string(), "sink".to_string());
        ComposedState::new(states, actions.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn display_keeps_protocol_order() {
        assert_eq!(
            snapshot(&[]).to_string(),
            "{ATP=low, BROKEN=sink} via (initial state)"
        );
        assert_eq!(snapshot(&["read", "write"]).path_display(), "read -> write");
    }

    #[test]
    fn counterexample_display() {
        let cx = Counterexample::for_action(snapshot(&[]), "execute");
        assert_eq!(cx.to_string(), "{ATP=low, BROKEN=sink} via (initial state) on 'execute'");
        assert_eq!(cx.state.state_of("BROKEN"), Some("sink"));
        assert!(Counterexample::at_state(snapshot(&[])).action.is_none());
    }
}
