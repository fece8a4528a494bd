//! Outcome of a single property check

use crate::properties::{describe_violation, PropertyKind};
use concord_core::Counterexample;
use serde::{Deserialize, Serialize};

/// Result of checking one property over one composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Property that was checked
    pub property: PropertyKind,
    /// Whether the property held over every inspected state
    pub holds: bool,
    /// Joint states inspected before stopping
    pub states_checked: usize,
    /// Whether the state bound cut the check short
    ///
    /// A holding result with this flag set is only valid within the bound.
    pub bound_reached: bool,
    /// First violating state, when the property fails
    pub counterexample: Option<Counterexample>,
    /// Protocol blamed for the violation, when one can be named
    pub violating_protocol: Option<String>,
}

impl VerificationResult {
    /// The property held over `states_checked` states.
    pub fn holding(property: PropertyKind, states_checked: usize, bound_reached: bool) -> Self {
        Self {
            property,
            holds: true,
            states_checked,
            bound_reached,
            counterexample: None,
            violating_protocol: None,
        }
    }

    /// The property failed at `counterexample`.
    pub fn violated(
        property: PropertyKind,
        states_checked: usize,
        counterexample: Counterexample,
        violating_protocol: Option<String>,
    ) -> Self {
        Self {
            property,
            holds: false,
            states_checked,
            bound_reached: false,
            counterexample: Some(counterexample),
            violating_protocol,
        }
    }

    /// Stable name of the checked property.
    pub fn property_name(&self) -> &'static str {
        self.property.name()
    }

    /// Whether the verdict is definitive: a violation, or a pass that
    /// covered the whole state space.
    pub fn is_conclusive(&self) -> bool {
        !self.holds || !self.bound_reached
    }

    /// One-line human-readable verdict.
    pub fn summary(&self) -> String {
        match &self.counterexample {
            Some(cx) => {
                let mut text = describe_violation(self.property, &cx.state.actions);
                if let Some(protocol) = &self.violating_protocol {
                    text.push_str(&format!(" (protocol {protocol})"));
                }
                text
            }
            None if self.bound_reached => format!(
                "{} holds within the first {} states (bound reached)",
                self.property, self.states_checked
            ),
            None => format!("{} holds over {} states", self.property, self.states_checked),
        }
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}
