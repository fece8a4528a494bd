//! Permission and denial summaries for compositions

use crate::composer::{DecisionComposer, ProtocolComposer};
use crate::priority::PriorityRanks;
use concord_core::{ConcordError, ProtocolModel, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Actions globally permitted at the joint initial state, sorted.
pub fn permitted_in_initial_state(composer: &ProtocolComposer) -> Vec<String> {
    let initial = composer.initial_joint_state();
    composer
        .union_alphabet()
        .iter()
        .filter(|action| composer.compose_at(&initial, action).globally_permitted)
        .cloned()
        .collect()
}

/// Number of explicitly permitting transitions declared by `protocol`.
pub fn permitted_transition_count(protocol: &ProtocolModel) -> usize {
    protocol.transitions().iter().filter(|t| t.permitted).count()
}

/// The protocol with the most permitting transitions, first on ties.
pub fn most_permissive(protocols: &[ProtocolModel]) -> Option<(&str, usize)> {
    protocols
        .iter()
        .map(|p| (p.name(), permitted_transition_count(p)))
        .fold(None, |best, (name, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((name, count)),
        })
}

/// Which protocol has the final say over each joint state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialDominance {
    /// Joint states where each protocol was the highest-priority denier,
    /// in priority order then declaration order
    pub counts: IndexMap<String, usize>,
    /// Joint states where no protocol denied any action
    pub none: usize,
    /// Joint states examined
    pub total: usize,
}

impl DenialDominance {
    /// Share of joint states dominated by `protocol`, in `[0, 1]`.
    pub fn share(&self, protocol: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.counts.get(protocol).copied().unwrap_or(0) as f64 / self.total as f64
    }
}

/// For every joint state of the full product, find the highest-priority
/// protocol that denies at least one action of the union alphabet.
///
/// # Errors
///
/// Returns [`ConcordError::StateSpaceTooLarge`] when the product exceeds
/// `ceiling`, or [`ConcordError::UnknownPriorityProtocol`] for an invalid
/// priority list.
pub fn denial_dominance<S: AsRef<str>>(
    composer: &ProtocolComposer,
    priority: &[S],
    ceiling: usize,
) -> Result<DenialDominance> {
    let size = composer.state_space_size();
    if size > ceiling {
        return Err(ConcordError::StateSpaceTooLarge { size, ceiling });
    }
    let ranks = PriorityRanks::new(composer, priority)?;

    let mut counts: IndexMap<String, usize> = ranks
        .order()
        .iter()
        .map(|name| (name.clone(), 0))
        .collect();
    for name in composer.protocol_names() {
        counts.entry(name.to_string()).or_insert(0);
    }

    let mut none = 0;
    let mut total = 0;
    for joint in composer.joint_states() {
        total += 1;
        let decisions: Vec<_> = composer
            .union_alphabet()
            .iter()
            .map(|action| composer.compose_at(&joint, action))
            .collect();
        let dominant = ranks
            .highest(decisions.iter().flat_map(|d| d.denying()))
            .map(|d| d.protocol.clone());
        match dominant {
            Some(protocol) => *counts.entry(protocol).or_insert(0) += 1,
            None => none += 1,
        }
    }

    Ok(DenialDominance {
        counts,
        none,
        total,
    })
}
