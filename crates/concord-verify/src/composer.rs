//! Synchronous product of protocol models
//!
//! Composition is lock-step AND: every protocol observes every action, and an
//! action is globally permitted only when each protocol permits it. The
//! composed system is therefore never more permissive than its most
//! restrictive component.
//!
//! All exploration works on explicit [`JointState`] values. The cursor-based
//! calls ([`ProtocolComposer::compose_decisions`],
//! [`ProtocolComposer::apply_composed_action`]) exist for interactive use and
//! are the only ones that read or move protocol cursors.

use concord_core::{
    ComposedState, ConcordError, JointState, ProtocolDecision, ProtocolModel, Result, StateId,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::debug;

/// Aggregate decision for one action across all composed protocols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedDecision {
    /// The evaluated action
    pub action: String,
    /// True when every protocol permits the action
    pub globally_permitted: bool,
    /// Per-protocol decisions in protocol order
    pub individual_decisions: Vec<ProtocolDecision>,
    /// Names of the protocols that denied, in protocol order
    pub blocking_protocols: Vec<String>,
}

impl ComposedDecision {
    /// Combine per-protocol decisions under the AND rule.
    pub fn conjunction(action: impl Into<String>, individual_decisions: Vec<ProtocolDecision>) -> Self {
        let blocking_protocols: Vec<String> = individual_decisions
            .iter()
            .filter(|d| !d.permitted)
            .map(|d| d.protocol.clone())
            .collect();
        Self {
            action: action.into(),
            globally_permitted: blocking_protocols.is_empty(),
            individual_decisions,
            blocking_protocols,
        }
    }

    /// Joint state every protocol would move to.
    pub fn next_joint(&self) -> JointState {
        self.individual_decisions
            .iter()
            .map(|d| d.next_state_id)
            .collect()
    }

    /// Decisions that permit the action.
    pub fn permitting(&self) -> impl Iterator<Item = &ProtocolDecision> {
        self.individual_decisions.iter().filter(|d| d.permitted)
    }

    /// Decisions that deny the action.
    pub fn denying(&self) -> impl Iterator<Item = &ProtocolDecision> {
        self.individual_decisions.iter().filter(|d| !d.permitted)
    }
}

/// Evaluation of an action at an explicit joint state.
///
/// [`ProtocolComposer`] is the production implementation; the verifier's
/// self-consistency checks are written against this trait.
pub trait DecisionComposer {
    /// Evaluate `action` at `joint` without side effects.
    fn compose_at(&self, joint: &JointState, action: &str) -> ComposedDecision;
}

/// Result of a bounded reachability search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exploration {
    /// Discovered states in BFS discovery order
    pub states: Vec<ComposedState>,
    /// Joint states matching `states` index for index
    pub joints: Vec<JointState>,
    /// Whether a reachable state was left undiscovered because of the bound
    pub truncated: bool,
}

/// Lazy Cartesian product of per-protocol state sets.
///
/// Odometer order: the first protocol varies slowest, the last fastest.
#[derive(Debug, Clone)]
pub struct JointStates {
    radices: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl JointStates {
    fn new(radices: Vec<usize>) -> Self {
        let next = if radices.iter().all(|&r| r > 0) {
            Some(vec![0; radices.len()])
        } else {
            None
        };
        Self { radices, next }
    }
}

impl Iterator for JointStates {
    type Item = JointState;

    fn next(&mut self) -> Option<JointState> {
        let current = self.next.take()?;

        let mut successor = current.clone();
        let mut digit = successor.len();
        while digit > 0 {
            digit -= 1;
            successor[digit] += 1;
            if successor[digit] < self.radices[digit] {
                self.next = Some(successor);
                break;
            }
            successor[digit] = 0;
        }

        Some(current.into_iter().map(StateId::from_index).collect())
    }
}

/// Product state machine over a fixed set of protocols.
#[derive(Debug, Clone)]
pub struct ProtocolComposer {
    protocols: Vec<ProtocolModel>,
    alphabet: Vec<String>,
}

impl ProtocolComposer {
    /// Compose `protocols` in the given order.
    ///
    /// # Errors
    ///
    /// Returns a usage error when `protocols` is empty or two protocols share
    /// a name.
    pub fn new(protocols: Vec<ProtocolModel>) -> Result<Self> {
        if protocols.is_empty() {
            return Err(ConcordError::empty_composition("ProtocolComposer::new"));
        }

        let mut seen = HashSet::with_capacity(protocols.len());
        for protocol in &protocols {
            if !seen.insert(protocol.name()) {
                return Err(ConcordError::DuplicateProtocol {
                    protocol: protocol.name().to_string(),
                });
            }
        }

        let alphabet = protocols
            .iter()
            .flat_map(ProtocolModel::all_actions)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            protocols,
            alphabet,
        })
    }

    /// Composed protocols in order.
    pub fn protocols(&self) -> &[ProtocolModel] {
        &self.protocols
    }

    /// Give the protocols back, cursors included.
    pub fn into_protocols(self) -> Vec<ProtocolModel> {
        self.protocols
    }

    /// Protocol names in order.
    pub fn protocol_names(&self) -> Vec<&str> {
        self.protocols.iter().map(ProtocolModel::name).collect()
    }

    /// Sorted union of every protocol's action labels.
    pub fn union_alphabet(&self) -> &[String] {
        &self.alphabet
    }

    /// Joint state where every protocol sits at its initial state.
    pub fn initial_joint_state(&self) -> JointState {
        self.protocols.iter().map(ProtocolModel::initial_id).collect()
    }

    /// Joint state under the protocols' cursors.
    pub fn current_joint_state(&self) -> JointState {
        self.protocols.iter().map(ProtocolModel::position).collect()
    }

    /// Named snapshot of `joint`, tagged with the actions that reached it.
    pub fn composed_state(&self, joint: &JointState, actions: Vec<String>) -> ComposedState {
        let states = self
            .protocols
            .iter()
            .zip(joint.positions())
            .map(|(protocol, &id)| (protocol.name().to_string(), protocol.state_name(id).to_string()))
            .collect();
        ComposedState::new(states, actions)
    }

    /// Named snapshot of the cursors.
    pub fn current_composed_state(&self, action_history: Vec<String>) -> ComposedState {
        self.composed_state(&self.current_joint_state(), action_history)
    }

    /// Evaluate `action` at the current cursors. Never moves a cursor.
    pub fn compose_decisions(&self, action: &str) -> ComposedDecision {
        self.compose_at(&self.current_joint_state(), action)
    }

    /// Evaluate `action` and advance every protocol if, and only if, all of
    /// them permit it.
    pub fn apply_composed_action(&mut self, action: &str) -> ComposedDecision {
        let decision = self.compose_decisions(action);
        if decision.globally_permitted {
            for protocol in &mut self.protocols {
                protocol.apply_transition(action);
            }
        }
        decision
    }

    /// Move every cursor back to its initial state.
    pub fn reset_all(&mut self) {
        for protocol in &mut self.protocols {
            protocol.reset();
        }
    }

    /// Number of joint states in the full Cartesian product, saturating.
    pub fn state_space_size(&self) -> usize {
        self.protocols
            .iter()
            .fold(1usize, |acc, p| acc.saturating_mul(p.state_count()))
    }

    /// Lazy iterator over the full Cartesian product, reachable or not.
    pub fn joint_states(&self) -> JointStates {
        JointStates::new(self.protocols.iter().map(ProtocolModel::state_count).collect())
    }

    /// Materialise the full Cartesian product by name.
    ///
    /// The product grows with the product of all per-protocol state counts,
    /// so the caller must supply the largest size it is prepared to hold.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::StateSpaceTooLarge`] when the product exceeds
    /// `ceiling`.
    pub fn enumerate_all_joint_states(&self, ceiling: usize) -> Result<Vec<IndexMap<String, String>>> {
        let size = self.state_space_size();
        if size > ceiling {
            return Err(ConcordError::StateSpaceTooLarge { size, ceiling });
        }
        Ok(self
            .joint_states()
            .map(|joint| self.composed_state(&joint, Vec::new()).states)
            .collect())
    }

    /// Reachable joint states by bounded BFS, at most `max_states` of them.
    pub fn enumerate_states(&self, max_states: usize) -> Vec<ComposedState> {
        self.explore(max_states).states
    }

    /// Bounded BFS over the product from the joint initial state.
    ///
    /// Candidate actions are the union alphabet in sorted order; an edge is
    /// followed only when globally permitted, and each joint state is
    /// recorded once. Once `max_states` states are recorded the search keeps
    /// expanding the frontier only to learn whether anything was left out.
    pub fn explore(&self, max_states: usize) -> Exploration {
        let initial = self.initial_joint_state();
        if max_states == 0 {
            return Exploration {
                states: Vec::new(),
                joints: Vec::new(),
                truncated: true,
            };
        }

        let mut visited: HashSet<JointState> = HashSet::from([initial.clone()]);
        let mut states = vec![self.composed_state(&initial, Vec::new())];
        let mut joints = vec![initial.clone()];
        let mut queue: VecDeque<(JointState, Vec<String>)> = VecDeque::from([(initial, Vec::new())]);
        let mut truncated = false;

        'search: while let Some((joint, path)) = queue.pop_front() {
            for action in &self.alphabet {
                let decision = self.compose_at(&joint, action);
                if !decision.globally_permitted {
                    continue;
                }

                let next = decision.next_joint();
                if visited.contains(&next) {
                    continue;
                }
                if states.len() >= max_states {
                    truncated = true;
                    break 'search;
                }

                visited.insert(next.clone());
                let mut next_path = path.clone();
                next_path.push(action.clone());
                states.push(self.composed_state(&next, next_path.clone()));
                joints.push(next.clone());
                queue.push_back((next, next_path));
            }
        }

        debug!(
            protocols = ?self.protocol_names(),
            discovered = states.len(),
            max_states,
            truncated,
            "reachability search finished"
        );

        Exploration {
            states,
            joints,
            truncated,
        }
    }
}

impl DecisionComposer for ProtocolComposer {
    fn compose_at(&self, joint: &JointState, action: &str) -> ComposedDecision {
        debug_assert_eq!(joint.len(), self.protocols.len());
        let decisions = self
            .protocols
            .iter()
            .zip(joint.positions())
            .map(|(protocol, &state)| protocol.decide_at(state, action))
            .collect();
        ComposedDecision::conjunction(action, decisions)
    }
}

impl std::fmt::Display for ProtocolComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProtocolComposer[{}]", self.protocol_names().join(" & "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use concord_core::{State, Transition};
    use concord_testkit::{build_aeap, build_asp, build_atp, build_broken_deadlock_protocol};

    fn single(name: &str, permitted: bool) -> ProtocolModel {
        ProtocolModel::new(
            name,
            vec![State::new("s0")],
            vec![Transition::new("s0", "s0", "x", permitted)],
            "s0",
        )
        .unwrap()
    }

    #[test]
    fn single_denier_blocks_composition() {
        let composer = ProtocolComposer::new(vec![single("A", true), single("B", false)]).unwrap();
        let decision = composer.compose_decisions("x");
        assert!(!decision.globally_permitted);
        assert_eq!(decision.blocking_protocols, vec!["B"]);
        assert_eq!(decision.individual_decisions.len(), 2);
    }

    #[test]
    fn empty_and_duplicate_compositions_are_rejected() {
        assert_matches!(
            ProtocolComposer::new(Vec::new()),
            Err(ConcordError::EmptyComposition { .. })
        );
        assert_matches!(
            ProtocolComposer::new(vec![single("A", true), single("A", false)]),
            Err(ConcordError::DuplicateProtocol { ref protocol }) if protocol == "A"
        );
    }

    #[test]
    fn union_alphabet_is_sorted_and_deduplicated() {
        let composer = ProtocolComposer::new(vec![build_atp(), build_broken_deadlock_protocol()]).unwrap();
        assert_eq!(
            composer.union_alphabet(),
            &["delete", "escalate", "execute", "read", "write"]
        );
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut composer = ProtocolComposer::new(vec![build_atp(), build_asp()]).unwrap();

        // ATP low denies execute, so ASP must not move to elevated either
        let denied = composer.apply_composed_action("execute");
        assert!(!denied.globally_permitted);
        assert_eq!(denied.blocking_protocols, vec!["ATP"]);
        assert_eq!(composer.current_joint_state(), composer.initial_joint_state());

        let applied = composer.apply_composed_action("write");
        assert!(applied.globally_permitted);
        let snapshot = composer.current_composed_state(vec!["write".into()]);
        assert_eq!(snapshot.state_of("ATP"), Some("medium"));
        assert_eq!(snapshot.state_of("ASP"), Some("normal"));

        composer.reset_all();
        assert_eq!(composer.current_joint_state(), composer.initial_joint_state());
    }

    #[test]
    fn enumerate_states_bfs_order() {
        let composer = ProtocolComposer::new(vec![build_atp(), build_asp()]).unwrap();
        let states = composer.enumerate_states(100);

        let rendered: Vec<(Vec<&str>, Vec<&str>)> = states
            .iter()
            .map(|s| {
                (
                    s.states.values().map(String::as_str).collect(),
                    s.actions.iter().map(String::as_str).collect(),
                )
            })
            .collect();

        assert_eq!(
            rendered,
            vec![
                (vec!["low", "normal"], vec![]),
                (vec!["medium", "normal"], vec!["write"]),
                (vec!["high", "elevated"], vec!["write", "execute"]),
                (vec!["high", "normal"], vec!["write", "execute", "read"]),
            ]
        );
    }

    #[test]
    fn enumeration_leaves_cursors_alone() {
        let mut composer = ProtocolComposer::new(standard()).unwrap();
        composer.apply_composed_action("read");
        composer.apply_composed_action("write");
        let before = composer.current_joint_state();
        let _ = composer.enumerate_states(50);
        assert_eq!(composer.current_joint_state(), before);
    }

    #[test]
    fn bound_of_one_yields_initial_state() {
        let composer = ProtocolComposer::new(standard()).unwrap();
        let exploration = composer.explore(1);
        assert_eq!(exploration.states.len(), 1);
        assert!(exploration.states[0].is_initial());
        assert!(exploration.truncated);
        assert!(composer.enumerate_states(0).is_empty());
    }

    #[test]
    fn exact_bound_is_not_truncated() {
        let composer = ProtocolComposer::new(vec![build_atp(), build_asp()]).unwrap();
        assert!(!composer.explore(4).truncated);
        assert!(composer.explore(3).truncated);
    }

    #[test]
    fn cartesian_product_is_odometer_ordered() {
        let composer = ProtocolComposer::new(vec![build_atp(), build_broken_deadlock_protocol(), build_asp()]).unwrap();
        assert_eq!(composer.state_space_size(), 9);

        let all = composer.enumerate_all_joint_states(9).unwrap();
        assert_eq!(all.len(), 9);
        assert_eq!(all[0]["ATP"], "low");
        assert_eq!(all[0]["ASP"], "normal");
        assert_eq!(all[1]["ASP"], "elevated");
        assert_eq!(all[3]["ATP"], "medium");
        assert_eq!(all[8]["ATP"], "high");
        assert_eq!(all[8]["ASP"], "lockdown");
        assert!(all.iter().all(|j| j["BROKEN"] == "sink"));
    }

    #[test]
    fn cartesian_product_respects_ceiling() {
        let composer = ProtocolComposer::new(standard()).unwrap();
        assert_matches!(
            composer.enumerate_all_joint_states(26),
            Err(ConcordError::StateSpaceTooLarge { size: 27, ceiling: 26 })
        );
        assert_eq!(composer.joint_states().count(), 27);
    }

    fn standard() -> Vec<ProtocolModel> {
        vec![build_atp(), build_asp(), build_aeap()]
    }
}
