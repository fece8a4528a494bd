//! Protocol state machines
//!
//! A [`ProtocolModel`] is a small permission gate: a fixed set of states, a
//! list of labelled transitions that either permit or deny an action, and a
//! position cursor. The transition table is immutable once built and shared
//! between clones; only the cursor is per-instance.
//!
//! Decisions come in two flavours. [`ProtocolModel::decide`] answers at the
//! cursor, while [`ProtocolModel::decide_at`] answers at an explicit
//! [`StateId`] and is what composition and verification use, so that
//! exploring the product never moves anyone's cursor.
//!
//! When several transitions share a `(from_state, action)` pair the first one
//! declared wins. The winner is fixed in a lookup table at construction time
//! and can be inspected with [`ProtocolModel::transition_for`].

use crate::errors::{ConcordError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Index of a state within its protocol's declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(usize);

impl StateId {
    /// Id of the state at `index` in declaration order.
    ///
    /// Ids are only meaningful for the protocol whose states they index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Position of the state in declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn default_accepting() -> bool {
    true
}

/// A single state in a protocol state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Unique identifier within the owning protocol
    pub name: String,
    /// Whether this is a valid, non-error configuration
    #[serde(rename = "accepting", default = "default_accepting")]
    pub is_accepting: bool,
    /// Display annotations
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl State {
    /// Create an accepting state with no metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_accepting: true,
            metadata: IndexMap::new(),
        }
    }

    /// Create a non-accepting (error or blocked) state.
    pub fn rejecting(name: impl Into<String>) -> Self {
        Self {
            is_accepting: false,
            ..Self::new(name)
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A directed edge between two states triggered by an action.
///
/// `permitted = false` records an explicit denial, which is distinct from the
/// implicit denial produced when no transition matches at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Originating state name
    #[serde(rename = "from")]
    pub from_state: String,
    /// Destination state name
    #[serde(rename = "to")]
    pub to_state: String,
    /// Action label
    pub action: String,
    /// Whether the action is allowed from `from_state`
    pub permitted: bool,
    /// Description of an extra guard condition; never evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

impl Transition {
    /// Create a transition.
    pub fn new(
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        action: impl Into<String>,
        permitted: bool,
    ) -> Self {
        Self {
            from_state: from_state.into(),
            to_state: to_state.into(),
            action: action.into(),
            permitted,
            guard: None,
        }
    }

    /// Create a permitting transition.
    pub fn permit(
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::new(from_state, to_state, action, true)
    }

    /// Create an explicitly denying transition.
    pub fn deny(
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::new(from_state, to_state, action, false)
    }

    /// Attach a guard description.
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }
}

/// Why a protocol refused an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No transition out of the current state carries the action
    NoMatchingTransition,
    /// A transition explicitly denies the action
    ExplicitDeny {
        /// Guard description of the denying transition, if any
        guard: Option<String>,
    },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::NoMatchingTransition => write!(f, "no matching transition"),
            DenialReason::ExplicitDeny { guard: Some(guard) } => {
                write!(f, "explicitly denied ({guard})")
            }
            DenialReason::ExplicitDeny { guard: None } => write!(f, "explicitly denied"),
        }
    }
}

/// The outcome of evaluating one action against one protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDecision {
    /// Whether the protocol allows the action
    pub permitted: bool,
    /// State the protocol would move to; the current state when nothing matched
    pub next_state: String,
    /// Index of `next_state` within the protocol
    pub next_state_id: StateId,
    /// Name of the deciding protocol
    pub protocol: String,
    /// Denial reason, `None` when permitted
    pub reason: Option<DenialReason>,
}

impl ProtocolDecision {
    /// Returns `true` if the decision denies the action.
    pub fn is_denied(&self) -> bool {
        !self.permitted
    }
}

/// Immutable part of a protocol, shared by every clone of a model.
#[derive(Debug)]
struct ProtocolTable {
    name: String,
    states: Vec<State>,
    index: HashMap<String, StateId>,
    transitions: Vec<Transition>,
    /// Per state: action -> index of the authoritative transition
    outgoing: Vec<BTreeMap<String, usize>>,
    initial: StateId,
}

/// A governance protocol modelled as a finite state machine.
#[derive(Debug, Clone)]
pub struct ProtocolModel {
    table: Arc<ProtocolTable>,
    position: StateId,
}

impl ProtocolModel {
    /// Build and validate a protocol.
    ///
    /// # Errors
    ///
    /// Returns a structural error when a state name is declared twice, when
    /// `initial_state` is not declared, or when a transition references an
    /// undeclared state.
    pub fn new(
        name: impl Into<String>,
        states: Vec<State>,
        transitions: Vec<Transition>,
        initial_state: &str,
    ) -> Result<Self> {
        let name = name.into();

        let mut index = HashMap::with_capacity(states.len());
        for (i, state) in states.iter().enumerate() {
            if index.insert(state.name.clone(), StateId::from_index(i)).is_some() {
                return Err(ConcordError::DuplicateState {
                    protocol: name,
                    state: state.name.clone(),
                });
            }
        }

        let initial = match index.get(initial_state) {
            Some(id) => *id,
            None => {
                return Err(ConcordError::UndeclaredInitialState {
                    protocol: name,
                    state: initial_state.to_string(),
                    declared: states.iter().map(|s| s.name.clone()).collect(),
                })
            }
        };

        let mut outgoing: Vec<BTreeMap<String, usize>> = vec![BTreeMap::new(); states.len()];
        for (i, transition) in transitions.iter().enumerate() {
            let from = lookup_endpoint(&index, &name, transition, "from", &transition.from_state)?;
            lookup_endpoint(&index, &name, transition, "to", &transition.to_state)?;

            let slot = &mut outgoing[from.index()];
            if let Some(&winner) = slot.get(&transition.action) {
                warn!(
                    protocol = %name,
                    from_state = %transition.from_state,
                    action = %transition.action,
                    winner,
                    shadowed = i,
                    "duplicate transition shadowed by earlier declaration"
                );
            } else {
                slot.insert(transition.action.clone(), i);
            }
        }

        debug!(
            protocol = %name,
            states = states.len(),
            transitions = transitions.len(),
            "protocol model constructed"
        );

        Ok(Self {
            table: Arc::new(ProtocolTable {
                name,
                states,
                index,
                transitions,
                outgoing,
                initial,
            }),
            position: initial,
        })
    }

    /// Protocol name.
    pub fn name(&self) -> &str {
        &self.table.name
    }

    /// Declared states in declaration order.
    pub fn states(&self) -> &[State] {
        &self.table.states
    }

    /// Declared transitions in declaration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.table.transitions
    }

    /// Number of declared states.
    pub fn state_count(&self) -> usize {
        self.table.states.len()
    }

    /// All declared state names in declaration order.
    pub fn state_names(&self) -> Vec<&str> {
        self.table.states.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up a state by name.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.table.index.get(name).copied()
    }

    /// Name of the state with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this protocol.
    pub fn state_name(&self, id: StateId) -> &str {
        &self.table.states[id.index()].name
    }

    /// The state a freshly built protocol starts in.
    pub fn initial_state(&self) -> &str {
        self.state_name(self.table.initial)
    }

    /// Id of the initial state.
    pub fn initial_id(&self) -> StateId {
        self.table.initial
    }

    /// Name of the state under the cursor.
    pub fn current_state(&self) -> &str {
        self.state_name(self.position)
    }

    /// Id of the state under the cursor.
    pub fn position(&self) -> StateId {
        self.position
    }

    /// Move the cursor directly to a named state.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::UnknownState`] if the state is not declared.
    pub fn set_position(&mut self, state: &str) -> Result<()> {
        self.position = self.require_state(state)?;
        Ok(())
    }

    /// The authoritative transition for `action` out of `state`, if any.
    pub fn transition_for(&self, state: StateId, action: &str) -> Option<&Transition> {
        self.table
            .outgoing
            .get(state.index())
            .and_then(|slot| slot.get(action))
            .map(|&i| &self.table.transitions[i])
    }

    /// Evaluate `action` at an explicit state without touching the cursor.
    ///
    /// # Panics
    ///
    /// Panics if `state` was not produced by this protocol.
    pub fn decide_at(&self, state: StateId, action: &str) -> ProtocolDecision {
        match self.transition_for(state, action) {
            Some(transition) => {
                let next_state_id = self.table.index[&transition.to_state];
                ProtocolDecision {
                    permitted: transition.permitted,
                    next_state: transition.to_state.clone(),
                    next_state_id,
                    protocol: self.table.name.clone(),
                    reason: (!transition.permitted).then(|| DenialReason::ExplicitDeny {
                        guard: transition.guard.clone(),
                    }),
                }
            }
            None => ProtocolDecision {
                permitted: false,
                next_state: self.state_name(state).to_string(),
                next_state_id: state,
                protocol: self.table.name.clone(),
                reason: Some(DenialReason::NoMatchingTransition),
            },
        }
    }

    /// Successor of `state` under `action`, or `None` when the action is denied.
    pub fn step_at(&self, state: StateId, action: &str) -> Option<StateId> {
        self.transition_for(state, action)
            .filter(|t| t.permitted)
            .map(|t| self.table.index[&t.to_state])
    }

    /// Evaluate `action` at the cursor. Never moves the cursor.
    pub fn decide(&self, action: &str) -> ProtocolDecision {
        self.decide_at(self.position, action)
    }

    /// Evaluate `action` and advance the cursor if it is permitted.
    pub fn apply_transition(&mut self, action: &str) -> ProtocolDecision {
        let decision = self.decide(action);
        if decision.permitted {
            self.position = decision.next_state_id;
        }
        decision
    }

    /// Return the cursor to the initial state.
    pub fn reset(&mut self) {
        self.position = self.table.initial;
    }

    /// Every action label used by any transition, sorted and de-duplicated.
    pub fn all_actions(&self) -> Vec<String> {
        self.table
            .transitions
            .iter()
            .map(|t| t.action.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Actions with any transition out of `state`, sorted and de-duplicated.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::UnknownState`] if the state is not declared.
    pub fn actions_from(&self, state: &str) -> Result<Vec<String>> {
        let id = self.require_state(state)?;
        Ok(self.table.outgoing[id.index()].keys().cloned().collect())
    }

    /// Actions with an explicitly permitting transition out of `state`,
    /// sorted and de-duplicated.
    ///
    /// Every declared transition counts here, including ones shadowed by an
    /// earlier declaration for the same action. An undeclared state has no
    /// transitions, so it yields an empty list.
    pub fn permitted_actions_from(&self, state: &str) -> Vec<String> {
        self.table
            .transitions
            .iter()
            .filter(|t| t.permitted && t.from_state == state)
            .map(|t| t.action.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn require_state(&self, state: &str) -> Result<StateId> {
        self.state_id(state).ok_or_else(|| ConcordError::UnknownState {
            protocol: self.table.name.clone(),
            state: state.to_string(),
        })
    }
}

fn lookup_endpoint(
    index: &HashMap<String, StateId>,
    protocol: &str,
    transition: &Transition,
    endpoint: &'static str,
    state: &str,
) -> Result<StateId> {
    index
        .get(state)
        .copied()
        .ok_or_else(|| ConcordError::UndeclaredTransitionState {
            protocol: protocol.to_string(),
            action: transition.action.clone(),
            endpoint,
            state: state.to_string(),
        })
}

impl std::fmt::Display for ProtocolModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] @ {}",
            self.name(),
            self.state_names().join(", "),
            self.current_state()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn demo() -> ProtocolModel {
        ProtocolModel::new(
            "demo",
            vec![State::new("low"), State::new("high")],
            vec![
                Transition::permit("low", "high", "elevate"),
                Transition::permit("low", "low", "read"),
                Transition::permit("high", "high", "read"),
                Transition::deny("high", "low", "elevate").with_guard("already_elevated"),
            ],
            "low",
        )
        .unwrap()
    }

    #[test]
    fn decide_is_read_only() {
        let model = demo();
        let decision = model.decide("elevate");
        assert!(decision.permitted);
        assert_eq!(decision.next_state, "high");
        assert_eq!(model.current_state(), "low");
    }

    #[test]
    fn missing_transition_is_denied_in_place() {
        let model = demo();
        let decision = model.decide("delete");
        assert!(!decision.permitted);
        assert_eq!(decision.next_state, "low");
        assert_eq!(decision.protocol, "demo");
        assert_eq!(decision.reason, Some(DenialReason::NoMatchingTransition));
        assert_eq!(
            decision.reason.unwrap().to_string(),
            "no matching transition"
        );
    }

    #[test]
    fn explicit_deny_reports_target_verbatim() {
        let mut model = demo();
        model.apply_transition("elevate");
        let decision = model.decide("elevate");
        assert!(!decision.permitted);
        assert_eq!(decision.next_state, "low");
        assert_matches!(
            decision.reason,
            Some(DenialReason::ExplicitDeny { guard: Some(ref g) }) if g == "already_elevated"
        );
    }

    #[test]
    fn apply_and_reset() {
        let mut model = demo();
        assert!(model.apply_transition("elevate").permitted);
        assert_eq!(model.current_state(), "high");

        // denied: cursor stays put
        assert!(!model.apply_transition("elevate").permitted);
        assert_eq!(model.current_state(), "high");

        model.reset();
        assert_eq!(model.current_state(), "low");
        model.reset();
        assert_eq!(model.current_state(), "low");
    }

    #[test]
    fn first_declared_transition_wins() {
        let model = ProtocolModel::new(
            "dup",
            vec![State::new("a"), State::new("b")],
            vec![
                Transition::deny("a", "a", "go"),
                Transition::permit("a", "b", "go"),
            ],
            "a",
        )
        .unwrap();

        let a = model.state_id("a").unwrap();
        assert!(!model.transition_for(a, "go").unwrap().permitted);
        assert!(!model.decide("go").permitted);
        assert_eq!(model.step_at(a, "go"), None);
        // the shadowed permit still counts as an explicit permission
        assert_eq!(model.permitted_actions_from("a"), vec!["go"]);
    }

    #[test]
    fn action_introspection_is_sorted() {
        let model = demo();
        assert_eq!(model.all_actions(), vec!["elevate", "read"]);
        assert_eq!(model.actions_from("high").unwrap(), vec!["elevate", "read"]);
        assert_eq!(model.permitted_actions_from("high"), vec!["read"]);
        assert!(model.permitted_actions_from("missing").is_empty());
        assert_matches!(
            model.actions_from("missing"),
            Err(ConcordError::UnknownState { .. })
        );
    }

    #[test]
    fn construction_rejects_undeclared_initial_state() {
        let err = ProtocolModel::new("p", vec![State::new("a")], vec![], "b").unwrap_err();
        assert_matches!(err, ConcordError::UndeclaredInitialState { ref state, .. } if state == "b");
        assert!(err.is_structural());
    }

    #[test]
    fn construction_rejects_undeclared_endpoints() {
        let err = ProtocolModel::new(
            "p",
            vec![State::new("a")],
            vec![Transition::permit("a", "z", "go")],
            "a",
        )
        .unwrap_err();
        assert_matches!(
            err,
            ConcordError::UndeclaredTransitionState { endpoint: "to", ref state, .. } if state == "z"
        );

        let err = ProtocolModel::new(
            "p",
            vec![State::new("a")],
            vec![Transition::permit("y", "a", "go")],
            "a",
        )
        .unwrap_err();
        assert_matches!(
            err,
            ConcordError::UndeclaredTransitionState { endpoint: "from", .. }
        );
    }

    #[test]
    fn construction_rejects_duplicate_states() {
        let err = ProtocolModel::new("p", vec![State::new("a"), State::new("a")], vec![], "a")
            .unwrap_err();
        assert_matches!(err, ConcordError::DuplicateState { .. });
    }

    #[test]
    fn clones_have_independent_cursors() {
        let mut original = demo();
        let copy = original.clone();
        original.apply_transition("elevate");
        assert_eq!(original.current_state(), "high");
        assert_eq!(copy.current_state(), "low");
    }

    #[test]
    fn set_position_validates() {
        let mut model = demo();
        model.set_position("high").unwrap();
        assert_eq!(model.current_state(), "high");
        assert!(model.set_position("nowhere").is_err());
        assert_eq!(model.current_state(), "high");
    }
}
