//! Property test strategies for Concord protocols
//!
//! Random protocols are kept tiny (one to three states, actions drawn from a
//! three-letter alphabet) so that full products stay enumerable inside a
//! single proptest case.

use concord_core::{ProtocolModel, State, Transition};
use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

/// Action alphabet used by the random protocols.
pub const ARB_ACTIONS: [&str; 3] = ["a", "b", "c"];

/// Strategy for a random protocol named `name`.
///
/// States are `s0..sN` with `s0` initial; transitions may repeat a
/// `(state, action)` pair, exercising the first-declared rule.
pub fn arb_protocol(name: impl Into<String>) -> impl Strategy<Value = ProtocolModel> {
    let name = name.into();
    (1usize..=3)
        .prop_flat_map(|state_count| {
            let transition = (
                0..state_count,
                0..state_count,
                0..ARB_ACTIONS.len(),
                any::<bool>(),
            );
            (Just(state_count), prop::collection::vec(transition, 0..10))
        })
        .prop_map(move |(state_count, raw)| {
            let states = (0..state_count).map(|i| State::new(format!("s{i}"))).collect();
            let transitions = raw
                .into_iter()
                .map(|(from, to, action, permitted)| {
                    Transition::new(format!("s{from}"), format!("s{to}"), ARB_ACTIONS[action], permitted)
                })
                .collect();
            ProtocolModel::new(name.clone(), states, transitions, "s0")
                .expect("generated protocols only reference declared states")
        })
}

/// Strategy for one to three uniquely named protocols `P0..Pn`.
pub fn arb_protocol_set() -> impl Strategy<Value = Vec<ProtocolModel>> {
    (1usize..=3).prop_flat_map(|count| {
        (0..count)
            .map(|i| arb_protocol(format!("P{i}")))
            .collect::<Vec<_>>()
    })
}

/// Strategy for an action from [`ARB_ACTIONS`].
pub fn arb_action() -> impl Strategy<Value = &'static str> {
    prop::sample::select(ARB_ACTIONS.to_vec())
}
