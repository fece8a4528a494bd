//! Serializable summary of a full verification run

use crate::composer::ProtocolComposer;
use crate::properties::{PropertyKind, PropertySpec};
use crate::result::VerificationResult;
use concord_core::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Everything `verify_all` found about one composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Composed protocol names, in order
    pub protocols: Vec<String>,
    /// Priority order used for the priority check
    pub priority: Vec<String>,
    /// State bound used for every check
    pub max_states: usize,
    /// Size of the full Cartesian product
    pub state_space_size: usize,
    /// Catalogue entries for the checked properties
    pub properties: Vec<PropertySpec>,
    /// Per-property results, in check order
    pub results: IndexMap<PropertyKind, VerificationResult>,
}

impl VerificationReport {
    /// Assemble a report from the results of a run over `composer`.
    pub fn new(
        composer: &ProtocolComposer,
        priority: Vec<String>,
        max_states: usize,
        results: IndexMap<PropertyKind, VerificationResult>,
    ) -> Self {
        let properties = results
            .keys()
            .map(|&kind| PropertySpec::for_kind(kind, priority.as_slice()))
            .collect();
        Self {
            protocols: composer
                .protocol_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            priority,
            max_states,
            state_space_size: composer.state_space_size(),
            properties,
            results,
        }
    }

    /// Whether every checked property held.
    pub fn all_hold(&self) -> bool {
        self.results.values().all(|r| r.holds)
    }

    /// Whether every verdict is definitive rather than bounded.
    pub fn is_complete(&self) -> bool {
        self.results.values().all(VerificationResult::is_conclusive)
    }

    /// Properties that failed.
    pub fn violations(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.values().filter(|r| !r.holds)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`concord_core::ConcordError::Serialization`] if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
