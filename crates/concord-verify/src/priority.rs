//! Protocol priority rankings

use crate::composer::ProtocolComposer;
use concord_core::{ConcordError, ProtocolDecision, Result};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Ranking of composed protocols, highest priority first.
///
/// A protocol's rank is its index in the priority list; protocols the list
/// leaves out rank below every listed one. Equal ranks fall back to protocol
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRanks {
    order: Vec<String>,
    ranks: HashMap<String, usize>,
}

impl PriorityRanks {
    /// Rank the protocols of `composer` by `priority`.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::UnknownPriorityProtocol`] when `priority`
    /// names a protocol that is not being composed.
    pub fn new<S: AsRef<str>>(composer: &ProtocolComposer, priority: &[S]) -> Result<Self> {
        let known = composer.protocol_names();
        let unknown: Vec<String> = priority
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !known.contains(name))
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(ConcordError::UnknownPriorityProtocol {
                unknown,
                known: known.into_iter().map(str::to_string).collect(),
            });
        }

        let order: Vec<String> = priority.iter().map(|n| n.as_ref().to_string()).collect();
        // A repeated name keeps its last position
        let ranks = order
            .iter()
            .enumerate()
            .map(|(rank, name)| (name.clone(), rank))
            .collect();
        Ok(Self { order, ranks })
    }

    /// Rank by declaration order.
    pub fn declaration_order(composer: &ProtocolComposer) -> Self {
        let order: Vec<String> = composer
            .protocol_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let ranks = order
            .iter()
            .enumerate()
            .map(|(rank, name)| (name.clone(), rank))
            .collect();
        Self { order, ranks }
    }

    /// The priority list as given.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Rank of `protocol`; lower is more authoritative.
    pub fn rank(&self, protocol: &str) -> usize {
        self.ranks.get(protocol).copied().unwrap_or(self.order.len())
    }

    /// Highest-priority decision, first in declaration order on ties.
    pub fn highest<'a>(
        &self,
        decisions: impl IntoIterator<Item = &'a ProtocolDecision>,
    ) -> Option<&'a ProtocolDecision> {
        decisions.into_iter().min_by_key(|d| self.rank(&d.protocol))
    }

    /// Lowest-priority decision, first in declaration order on ties.
    pub fn lowest<'a>(
        &self,
        decisions: impl IntoIterator<Item = &'a ProtocolDecision>,
    ) -> Option<&'a ProtocolDecision> {
        decisions
            .into_iter()
            .min_by_key(|d| Reverse(self.rank(&d.protocol)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use concord_testkit::standard_composition;

    #[test]
    fn unlisted_protocols_rank_last() {
        let composer = ProtocolComposer::new(standard_composition()).unwrap();
        let ranks = PriorityRanks::new(&composer, &["ASP"]).unwrap();
        assert_eq!(ranks.rank("ASP"), 0);
        assert_eq!(ranks.rank("ATP"), 1);
        assert_eq!(ranks.rank("AEAP"), 1);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let composer = ProtocolComposer::new(standard_composition()).unwrap();
        assert_matches!(
            PriorityRanks::new(&composer, &["ASP", "GHOST"]),
            Err(ConcordError::UnknownPriorityProtocol { ref unknown, .. }) if unknown == &["GHOST"]
        );
    }

    #[test]
    fn ties_prefer_declaration_order() {
        let composer = ProtocolComposer::new(standard_composition()).unwrap();
        let ranks = PriorityRanks::new(&composer, &["ASP"]).unwrap();
        // every protocol denies escalate from the joint initial state
        let decision = composer.compose_decisions("escalate");
        assert_eq!(ranks.highest(decision.denying()).unwrap().protocol, "ASP");
        assert_eq!(ranks.lowest(decision.denying()).unwrap().protocol, "ATP");

        let by_declaration = PriorityRanks::declaration_order(&composer);
        assert_eq!(by_declaration.order(), &["ATP", "ASP", "AEAP"]);
        assert_eq!(by_declaration.lowest(decision.denying()).unwrap().protocol, "AEAP");
    }
}
