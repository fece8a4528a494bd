//! Bounded property checks over protocol compositions
//!
//! Monotonic restriction and priority ordering are checked over the full
//! Cartesian product of protocol states, streamed lazily and capped at
//! `max_states`. Deadlock freedom is checked over the states reachable from
//! the joint initial state. Hitting the cap is reported through
//! [`VerificationResult::bound_reached`], never as an error.
//!
//! Verification borrows protocols immutably and works on explicit joint
//! states, so caller cursors are never read or moved.

use crate::composer::{DecisionComposer, ProtocolComposer};
use crate::config::VerifierConfig;
use crate::priority::PriorityRanks;
use crate::properties::PropertyKind;
use crate::result::VerificationResult;
use concord_core::{ConcordError, Counterexample, ProtocolModel, Result};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Bounded model checker for composed protocols.
#[derive(Debug, Clone, Default)]
pub struct ProtocolCompositionVerifier {
    config: VerifierConfig,
}

impl ProtocolCompositionVerifier {
    /// Create a verifier from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::InvalidConfig`] when the configuration is invalid.
    pub fn new(config: VerifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a verifier with the given state bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::InvalidConfig`] when `max_states` is zero.
    pub fn with_max_states(max_states: usize) -> Result<Self> {
        Self::new(VerifierConfig::with_max_states(max_states))
    }

    /// Active configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Maximum joint states inspected per check.
    pub fn max_states(&self) -> usize {
        self.config.max_states
    }

    /// Check that the composition never permits what a component denies.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an empty or duplicate-named protocol list.
    pub fn verify_monotonic_restriction(&self, protocols: &[ProtocolModel]) -> Result<VerificationResult> {
        let composer = compose(protocols, "verify_monotonic_restriction")?;
        Ok(self.check_monotonic_restriction(&composer, &composer))
    }

    /// Check that every reachable joint state has a globally permitted action.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an empty or duplicate-named protocol list.
    pub fn verify_deadlock_freedom(&self, protocols: &[ProtocolModel]) -> Result<VerificationResult> {
        let composer = compose(protocols, "verify_deadlock_freedom")?;
        Ok(self.check_deadlock_freedom(&composer))
    }

    /// Check that no denial is overridden against `priority` (highest first).
    ///
    /// Only the first violation is reported. A pass-through permit is blamed
    /// on the highest-priority denier. A denial that overrides a
    /// higher-priority permit is blamed on the lowest-priority denier, which
    /// is not necessarily the protocol whose rank triggered the violation.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an empty or duplicate-named protocol list, or
    /// when `priority` names a protocol that is not being composed.
    pub fn verify_priority_ordering<S: AsRef<str>>(
        &self,
        protocols: &[ProtocolModel],
        priority: &[S],
    ) -> Result<VerificationResult> {
        let composer = compose(protocols, "verify_priority_ordering")?;
        let ranks = PriorityRanks::new(&composer, priority)?;
        Ok(self.check_priority_ordering(&composer, &composer, &ranks))
    }

    /// Run every check, keyed by property in the order monotonic restriction,
    /// deadlock freedom, priority ordering.
    ///
    /// `priority` defaults to protocol declaration order.
    ///
    /// # Errors
    ///
    /// Returns the usage errors of the individual checks before any check runs.
    pub fn verify_all(
        &self,
        protocols: &[ProtocolModel],
        priority: Option<&[String]>,
    ) -> Result<IndexMap<PropertyKind, VerificationResult>> {
        let composer = compose(protocols, "verify_all")?;
        let ranks = match priority {
            Some(priority) => PriorityRanks::new(&composer, priority)?,
            None => PriorityRanks::declaration_order(&composer),
        };

        let mut results = IndexMap::with_capacity(PropertyKind::ALL.len());
        results.insert(
            PropertyKind::MonotonicRestriction,
            self.check_monotonic_restriction(&composer, &composer),
        );
        results.insert(
            PropertyKind::DeadlockFreedom,
            self.check_deadlock_freedom(&composer),
        );
        results.insert(
            PropertyKind::PriorityOrdering,
            self.check_priority_ordering(&composer, &composer, &ranks),
        );
        Ok(results)
    }

    /// Monotonic restriction over the product of `composer`, judging each
    /// joint state with `rule`.
    pub fn check_monotonic_restriction<D: DecisionComposer>(
        &self,
        composer: &ProtocolComposer,
        rule: &D,
    ) -> VerificationResult {
        let property = PropertyKind::MonotonicRestriction;
        let mut states_checked = 0;

        for joint in composer.joint_states().take(self.config.max_states) {
            states_checked += 1;
            for action in composer.union_alphabet() {
                let decision = rule.compose_at(&joint, action);
                if !decision.globally_permitted {
                    continue;
                }
                let denier = decision.denying().next().map(|d| d.protocol.clone());
                if let Some(denier) = denier {
                    let counterexample =
                        Counterexample::for_action(composer.composed_state(&joint, Vec::new()), action);
                    return finish(VerificationResult::violated(
                        property,
                        states_checked,
                        counterexample,
                        Some(denier),
                    ));
                }
            }
        }

        let bound_reached = composer.state_space_size() > states_checked;
        finish(self.bounded(property, states_checked, bound_reached))
    }

    /// Deadlock freedom over the states reachable in `composer`.
    pub fn check_deadlock_freedom(&self, composer: &ProtocolComposer) -> VerificationResult {
        let property = PropertyKind::DeadlockFreedom;
        let exploration = composer.explore(self.config.max_states);

        for (index, (joint, state)) in exploration
            .joints
            .iter()
            .zip(&exploration.states)
            .enumerate()
        {
            let live = composer
                .union_alphabet()
                .iter()
                .any(|action| composer.compose_at(joint, action).globally_permitted);
            if !live {
                debug!(state = %state, "no globally permitted action");
                return finish(VerificationResult::violated(
                    property,
                    index + 1,
                    Counterexample::at_state(state.clone()),
                    None,
                ));
            }
        }

        finish(self.bounded(property, exploration.states.len(), exploration.truncated))
    }

    /// Priority ordering over the product of `composer`, judging each joint
    /// state with `rule`.
    pub fn check_priority_ordering<D: DecisionComposer>(
        &self,
        composer: &ProtocolComposer,
        rule: &D,
        ranks: &PriorityRanks,
    ) -> VerificationResult {
        let property = PropertyKind::PriorityOrdering;
        let mut states_checked = 0;

        for joint in composer.joint_states().take(self.config.max_states) {
            states_checked += 1;
            for action in composer.union_alphabet() {
                let decision = rule.compose_at(&joint, action);
                let Some(top_denier) = ranks.highest(decision.denying()) else {
                    continue;
                };

                let culprit = if decision.globally_permitted {
                    Some(top_denier)
                } else {
                    match ranks.highest(decision.permitting()) {
                        Some(top_permitter)
                            if ranks.rank(&top_denier.protocol) > ranks.rank(&top_permitter.protocol) =>
                        {
                            ranks.lowest(decision.denying())
                        }
                        _ => None,
                    }
                };

                if let Some(culprit) = culprit {
                    let counterexample =
                        Counterexample::for_action(composer.composed_state(&joint, Vec::new()), action);
                    return finish(VerificationResult::violated(
                        property,
                        states_checked,
                        counterexample,
                        Some(culprit.protocol.clone()),
                    ));
                }
            }
        }

        let bound_reached = composer.state_space_size() > states_checked;
        finish(self.bounded(property, states_checked, bound_reached))
    }

    fn bounded(&self, property: PropertyKind, states_checked: usize, bound_reached: bool) -> VerificationResult {
        if bound_reached {
            warn!(
                property = %property,
                max_states = self.config.max_states,
                states_checked,
                "state bound reached; result holds only within the checked states"
            );
        }
        VerificationResult::holding(property, states_checked, bound_reached)
    }
}

fn compose(protocols: &[ProtocolModel], operation: &str) -> Result<ProtocolComposer> {
    if protocols.is_empty() {
        return Err(ConcordError::empty_composition(operation));
    }
    ProtocolComposer::new(protocols.to_vec())
}

fn finish(result: VerificationResult) -> VerificationResult {
    info!(
        property = %result.property,
        holds = result.holds,
        states_checked = result.states_checked,
        bound_reached = result.bound_reached,
        violating_protocol = result.violating_protocol.as_deref().unwrap_or("-"),
        "property checked"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use concord_core::{State, Transition};
    use concord_testkit::{build_aeap, build_asp, build_atp, ProtocolBuilder};

    fn verifier() -> ProtocolCompositionVerifier {
        ProtocolCompositionVerifier::default()
    }

    #[test]
    fn zero_bound_is_rejected() {
        assert_matches!(
            ProtocolCompositionVerifier::with_max_states(0),
            Err(ConcordError::InvalidConfig { .. })
        );
        assert_eq!(verifier().max_states(), 10_000);
    }

    #[test]
    fn empty_input_is_a_usage_error() {
        let err = verifier().verify_deadlock_freedom(&[]).unwrap_err();
        assert_matches!(err, ConcordError::EmptyComposition { ref operation } if operation == "verify_deadlock_freedom");
        assert!(verifier().verify_all(&[], None).unwrap_err().is_usage());
    }

    #[test]
    fn self_loop_is_deadlock_free() {
        let protocol = ProtocolModel::new(
            "LOOP",
            vec![State::new("s0")],
            vec![Transition::permit("s0", "s0", "tick")],
            "s0",
        )
        .unwrap();
        let result = verifier().verify_deadlock_freedom(&[protocol]).unwrap();
        assert!(result.holds);
        assert_eq!(result.states_checked, 1);
        assert!(!result.bound_reached);
    }

    #[test]
    fn monotonic_restriction_bounded() {
        let verifier = ProtocolCompositionVerifier::with_max_states(5).unwrap();
        let result = verifier
            .verify_monotonic_restriction(&[build_atp(), build_asp(), build_aeap()])
            .unwrap();
        assert!(result.holds);
        assert_eq!(result.states_checked, 5);
        assert!(result.bound_reached);
    }

    #[test]
    fn priority_ordering_bounded() {
        let flip = |name: &str| {
            ProtocolBuilder::new(name)
                .states(["s0", "s1"])
                .permit("s0", "s1", "go")
                .permit("s1", "s0", "go")
                .build()
        };
        let verifier = ProtocolCompositionVerifier::with_max_states(3).unwrap();
        let result = verifier
            .verify_priority_ordering(&[flip("A"), flip("B")], &["A", "B"])
            .unwrap();
        assert!(result.holds);
        assert_eq!(result.states_checked, 3);
        assert!(result.bound_reached);
        assert!(!result.is_conclusive());

        let full = self::verifier()
            .verify_priority_ordering(&[flip("A"), flip("B")], &["B", "A"])
            .unwrap();
        assert_eq!(full.states_checked, 4);
        assert!(!full.bound_reached);
    }

    #[test]
    fn priority_violation_blames_lowest_denier() {
        // HI permits go, the two lower protocols deny it
        let hi = ProtocolBuilder::new("HI").state("s").permit("s", "s", "go").build();
        let mid = ProtocolBuilder::new("MID").state("s").deny("s", "s", "go").build();
        let lo = ProtocolBuilder::new("LO").state("s").deny("s", "s", "go").build();

        let result = verifier()
            .verify_priority_ordering(&[hi, mid, lo], &["HI", "MID", "LO"])
            .unwrap();
        assert!(!result.holds);
        assert_eq!(result.violating_protocol.as_deref(), Some("LO"));
        let cx = result.counterexample.unwrap();
        assert_eq!(cx.action.as_deref(), Some("go"));
        assert!(cx.state.actions.is_empty());
    }

    #[test]
    fn denial_by_top_priority_is_fine() {
        let hi = ProtocolBuilder::new("HI").state("s").deny("s", "s", "go").build();
        let lo = ProtocolBuilder::new("LO").state("s").permit("s", "s", "go").build();
        let result = verifier().verify_priority_ordering(&[hi, lo], &["HI", "LO"]).unwrap();
        assert!(result.holds);
        assert_eq!(result.states_checked, 1);
    }
}
