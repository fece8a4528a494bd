#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! Property tests for protocol models
//!
//! Random transition tables over a small fixed alphabet, checking that the
//! decision function honours the first-declared tie-break, never moves the
//! cursor, and that reset always returns to the initial state.

use concord_core::{ProtocolModel, State, Transition};
use proptest::prelude::*;

const STATES: [&str; 3] = ["s0", "s1", "s2"];
const ACTIONS: [&str; 3] = ["a", "b", "c"];

fn arb_transition() -> impl Strategy<Value = Transition> {
    (0..STATES.len(), 0..STATES.len(), 0..ACTIONS.len(), any::<bool>()).prop_map(
        |(from, to, action, permitted)| {
            Transition::new(STATES[from], STATES[to], ACTIONS[action], permitted)
        },
    )
}

fn build(transitions: Vec<Transition>) -> ProtocolModel {
    ProtocolModel::new(
        "random",
        STATES.iter().map(|s| State::new(*s)).collect(),
        transitions,
        "s0",
    )
    .unwrap()
}

proptest! {
    /// The decision always mirrors the first matching transition in declaration order.
    #[test]
    fn decision_matches_first_declared(transitions in prop::collection::vec(arb_transition(), 0..20)) {
        let model = build(transitions.clone());
        for state in STATES {
            let id = model.state_id(state).unwrap();
            for action in ACTIONS {
                let decision = model.decide_at(id, action);
                match transitions.iter().find(|t| t.from_state == state && t.action == action) {
                    Some(first) => {
                        prop_assert_eq!(decision.permitted, first.permitted);
                        prop_assert_eq!(&decision.next_state, &first.to_state);
                    }
                    None => {
                        prop_assert!(!decision.permitted);
                        prop_assert_eq!(decision.next_state.as_str(), state);
                    }
                }
            }
        }
    }

    /// Arbitrary apply sequences never leave the declared states and reset is exact.
    #[test]
    fn apply_then_reset(
        transitions in prop::collection::vec(arb_transition(), 0..20),
        script in prop::collection::vec(0..ACTIONS.len(), 0..30),
    ) {
        let mut model = build(transitions);
        for step in script {
            let before = model.current_state().to_string();
            let peek = model.decide(ACTIONS[step]);
            prop_assert_eq!(model.current_state(), before.as_str());

            let applied = model.apply_transition(ACTIONS[step]);
            prop_assert_eq!(&applied, &peek);
            if applied.permitted {
                prop_assert_eq!(model.current_state(), applied.next_state.as_str());
            } else {
                prop_assert_eq!(model.current_state(), before.as_str());
            }
        }
        model.reset();
        prop_assert_eq!(model.current_state(), "s0");
    }
}
