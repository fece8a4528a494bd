//! Synthetic governance protocols
//!
//! Three small protocols over a shared five-action alphabet, plus a
//! pathological sink that denies everything. They illustrate the composition
//! properties; none of them models a real system.

use concord_core::{ProtocolModel, State, Transition};

/// Read-only access.
pub const ACTION_READ: &str = "read";
/// Mutating access.
pub const ACTION_WRITE: &str = "write";
/// Running code.
pub const ACTION_EXECUTE: &str = "execute";
/// Destructive access.
pub const ACTION_DELETE: &str = "delete";
/// Privilege escalation.
pub const ACTION_ESCALATE: &str = "escalate";

/// The canonical action alphabet, in presentation order.
pub const ALL_ACTIONS: [&str; 5] = [
    ACTION_READ,
    ACTION_WRITE,
    ACTION_EXECUTE,
    ACTION_DELETE,
    ACTION_ESCALATE,
];

fn labelled(name: &str, key: &str, value: impl Into<serde_json::Value>, label: &str) -> State {
    State::new(name)
        .with_metadata(key, value)
        .with_metadata("label", label)
}

/// Adaptive Trust Protocol.
///
/// Trust rises from `low` to `medium` on a benign `write` and to `high` on
/// `execute`; `escalate` is always denied and drops trust back to `low`.
pub fn build_atp() -> ProtocolModel {
    let states = vec![
        labelled("low", "tier", 1, "Low Trust"),
        labelled("medium", "tier", 2, "Medium Trust"),
        labelled("high", "tier", 3, "High Trust"),
    ];
    let transitions = vec![
        Transition::permit("low", "low", ACTION_READ),
        Transition::permit("low", "medium", ACTION_WRITE).with_guard("first_benign_write_observed"),
        Transition::deny("low", "low", ACTION_EXECUTE),
        Transition::deny("low", "low", ACTION_DELETE),
        Transition::deny("low", "low", ACTION_ESCALATE),
        Transition::permit("medium", "medium", ACTION_READ),
        Transition::permit("medium", "medium", ACTION_WRITE),
        Transition::permit("medium", "high", ACTION_EXECUTE)
            .with_guard("two_or_more_successful_interactions"),
        Transition::deny("medium", "medium", ACTION_DELETE),
        Transition::deny("medium", "low", ACTION_ESCALATE),
        Transition::permit("high", "high", ACTION_READ),
        Transition::permit("high", "high", ACTION_WRITE),
        Transition::permit("high", "high", ACTION_EXECUTE),
        Transition::permit("high", "high", ACTION_DELETE),
        Transition::deny("high", "low", ACTION_ESCALATE),
    ];
    ProtocolModel::new("ATP", states, transitions, "low").expect("ATP is well formed")
}

/// Adaptive Security Protocol.
///
/// `execute` moves `normal` to `elevated` review, `read` clears it, and
/// `lockdown` denies everything.
pub fn build_asp() -> ProtocolModel {
    let states = vec![
        labelled("normal", "risk", "low", "Normal"),
        labelled("elevated", "risk", "med", "Elevated"),
        State::rejecting("lockdown")
            .with_metadata("risk", "high")
            .with_metadata("label", "Lockdown"),
    ];
    let transitions = vec![
        Transition::permit("normal", "normal", ACTION_READ),
        Transition::permit("normal", "normal", ACTION_WRITE),
        Transition::permit("normal", "elevated", ACTION_EXECUTE).with_guard("execute_triggers_review"),
        Transition::deny("normal", "lockdown", ACTION_DELETE),
        Transition::deny("normal", "elevated", ACTION_ESCALATE),
        Transition::permit("elevated", "normal", ACTION_READ).with_guard("read_clears_elevated_state"),
        Transition::deny("elevated", "elevated", ACTION_WRITE),
        Transition::deny("elevated", "lockdown", ACTION_EXECUTE),
        Transition::deny("elevated", "lockdown", ACTION_DELETE),
        Transition::deny("elevated", "lockdown", ACTION_ESCALATE),
        Transition::deny("lockdown", "lockdown", ACTION_READ),
        Transition::deny("lockdown", "lockdown", ACTION_WRITE),
        Transition::deny("lockdown", "lockdown", ACTION_EXECUTE),
        Transition::deny("lockdown", "lockdown", ACTION_DELETE),
        Transition::deny("lockdown", "lockdown", ACTION_ESCALATE),
    ];
    ProtocolModel::new("ASP", states, transitions, "normal").expect("ASP is well formed")
}

/// Adaptive Efficiency / Allocation Protocol.
///
/// `write` and `delete` consume budget, moving `available` to `warning`;
/// `exhausted` only allows `read`.
pub fn build_aeap() -> ProtocolModel {
    let states = vec![
        labelled("available", "budget", "full", "Budget Available"),
        labelled("warning", "budget", "partial", "Budget Warning"),
        labelled("exhausted", "budget", "none", "Budget Exhausted"),
    ];
    let transitions = vec![
        Transition::permit("available", "available", ACTION_READ),
        Transition::permit("available", "warning", ACTION_WRITE).with_guard("write_consumes_budget"),
        Transition::permit("available", "available", ACTION_EXECUTE),
        Transition::permit("available", "warning", ACTION_DELETE).with_guard("delete_consumes_budget"),
        Transition::deny("available", "available", ACTION_ESCALATE),
        Transition::permit("warning", "warning", ACTION_READ),
        Transition::deny("warning", "exhausted", ACTION_WRITE),
        Transition::permit("warning", "warning", ACTION_EXECUTE),
        Transition::deny("warning", "exhausted", ACTION_DELETE),
        Transition::deny("warning", "available", ACTION_ESCALATE),
        Transition::permit("exhausted", "exhausted", ACTION_READ),
        Transition::deny("exhausted", "exhausted", ACTION_WRITE),
        Transition::deny("exhausted", "exhausted", ACTION_EXECUTE),
        Transition::deny("exhausted", "exhausted", ACTION_DELETE),
        Transition::deny("exhausted", "available", ACTION_ESCALATE),
    ];
    ProtocolModel::new("AEAP", states, transitions, "available").expect("AEAP is well formed")
}

/// Single non-accepting `sink` state that denies every canonical action.
///
/// Any composition containing it deadlocks at the joint initial state.
pub fn build_broken_deadlock_protocol() -> ProtocolModel {
    let states = vec![State::rejecting("sink").with_metadata("label", "Deadlock Sink")];
    let transitions = ALL_ACTIONS
        .iter()
        .map(|action| Transition::deny("sink", "sink", *action))
        .collect();
    ProtocolModel::new("BROKEN", states, transitions, "sink").expect("BROKEN is well formed")
}

/// Fresh `[ATP, ASP, AEAP]`.
pub fn standard_composition() -> Vec<ProtocolModel> {
    vec![build_atp(), build_asp(), build_aeap()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_covers_the_alphabet() {
        for protocol in standard_composition()
            .into_iter()
            .chain([build_broken_deadlock_protocol()])
        {
            for state in protocol.state_names() {
                assert_eq!(
                    protocol.actions_from(state).unwrap().len(),
                    ALL_ACTIONS.len(),
                    "{} / {state}",
                    protocol.name()
                );
            }
        }
    }

    #[test]
    fn documented_behaviour() {
        let atp = build_atp();
        assert!(atp.decide(ACTION_READ).permitted);
        assert!(!atp.decide(ACTION_DELETE).permitted);

        let mut aeap = build_aeap();
        assert!(aeap.apply_transition(ACTION_WRITE).permitted);
        assert_eq!(aeap.current_state(), "warning");
        assert!(!aeap.decide(ACTION_WRITE).permitted);

        let asp = build_asp();
        assert!(!asp.states()[2].is_accepting);
        assert_eq!(asp.permitted_actions_from("lockdown"), Vec::<String>::new());
        assert_eq!(asp.states()[0].metadata["risk"], "low");
    }
}
