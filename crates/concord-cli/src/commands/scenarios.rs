//! `concord scenarios`
//!
//! Runs the synthetic ATP / ASP / AEAP compositions through each property:
//! monotonic restriction on two and three protocols, deadlock freedom on the
//! standard composition and on one containing the sink, and priority ordering
//! under a security-first ranking together with its denial dominance.

use super::{write_json_file, write_verdict};
use anyhow::Result;
use clap::Args;
use concord_testkit::{build_aeap, build_asp, build_atp, build_broken_deadlock_protocol, standard_composition};
use concord_verify::analysis::{self, DenialDominance};
use concord_verify::{
    ProtocolComposer, ProtocolCompositionVerifier, VerificationResult, VerifierConfig, DEFAULT_MAX_STATES,
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Ranking used by the priority scenario, highest first.
pub const SECURITY_FIRST: [&str; 3] = ["ASP", "ATP", "AEAP"];

/// Arguments for `concord scenarios`.
#[derive(Debug, Clone, Default, Args)]
pub struct ScenariosArgs {
    /// State bound for every check
    #[arg(long)]
    pub max_states: Option<usize>,

    /// Also write the results as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// Monotonic restriction on growing compositions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonotonicScenario {
    /// ATP + ASP
    pub two_protocol: VerificationResult,
    /// ATP + ASP + AEAP
    pub three_protocol: VerificationResult,
    /// Actions permitted at the joint initial state of ATP + ASP
    pub initial_permitted_two: Vec<String>,
    /// Actions permitted at the joint initial state of ATP + ASP + AEAP
    pub initial_permitted_three: Vec<String>,
    /// Protocol declaring the most permitting transitions
    pub most_permissive: Option<String>,
    /// Its permitting transition count
    pub most_permissive_count: usize,
}

/// Deadlock freedom with and without the sink protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlockScenario {
    /// ATP + ASP + AEAP
    pub standard: VerificationResult,
    /// ATP + BROKEN
    pub broken: VerificationResult,
}

/// Priority ordering under a fixed ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityScenario {
    /// Ranking, highest first
    pub priority_order: Vec<String>,
    /// Priority ordering result over ATP + ASP + AEAP
    pub result: VerificationResult,
    /// Highest-priority denier per joint state
    pub dominance: DenialDominance,
}

/// Results of the whole scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSuite {
    /// State bound used
    pub max_states: usize,
    /// Monotonic restriction scenario
    pub monotonic: MonotonicScenario,
    /// Deadlock freedom scenario
    pub deadlock: DeadlockScenario,
    /// Priority ordering scenario
    pub priority: PriorityScenario,
}

impl ScenarioSuite {
    /// Every result with its display label.
    pub fn labelled_results(&self) -> Vec<(&'static str, &VerificationResult)> {
        vec![
            ("monotonic_restriction (ATP + ASP)", &self.monotonic.two_protocol),
            ("monotonic_restriction (ATP + ASP + AEAP)", &self.monotonic.three_protocol),
            ("deadlock_freedom (standard)", &self.deadlock.standard),
            ("deadlock_freedom (with BROKEN)", &self.deadlock.broken),
            ("priority_ordering (ASP > ATP > AEAP)", &self.priority.result),
        ]
    }
}

/// Run every scenario with `verifier`.
pub fn run_suite(verifier: &ProtocolCompositionVerifier) -> concord_core::Result<ScenarioSuite> {
    let two = vec![build_atp(), build_asp()];
    let three = standard_composition();

    let leader = analysis::most_permissive(&three).map(|(name, count)| (name.to_string(), count));
    let monotonic = MonotonicScenario {
        two_protocol: verifier.verify_monotonic_restriction(&two)?,
        three_protocol: verifier.verify_monotonic_restriction(&three)?,
        initial_permitted_two: analysis::permitted_in_initial_state(&ProtocolComposer::new(two)?),
        initial_permitted_three: analysis::permitted_in_initial_state(&ProtocolComposer::new(three.clone())?),
        most_permissive_count: leader.as_ref().map_or(0, |(_, count)| *count),
        most_permissive: leader.map(|(name, _)| name),
    };
    info!(
        two = monotonic.initial_permitted_two.len(),
        three = monotonic.initial_permitted_three.len(),
        "initial permissions"
    );

    let deadlock = DeadlockScenario {
        standard: verifier.verify_deadlock_freedom(&three)?,
        broken: verifier.verify_deadlock_freedom(&[build_atp(), build_broken_deadlock_protocol()])?,
    };

    // Dominance always covers the full product; a small check bound must not
    // shrink it below the default ceiling.
    let composer = ProtocolComposer::new(vec![build_atp(), build_asp(), build_aeap()])?;
    let ceiling = verifier.max_states().max(DEFAULT_MAX_STATES);
    let priority = PriorityScenario {
        priority_order: SECURITY_FIRST.iter().map(|s| s.to_string()).collect(),
        result: verifier.verify_priority_ordering(composer.protocols(), &SECURITY_FIRST)?,
        dominance: analysis::denial_dominance(&composer, &SECURITY_FIRST, ceiling)?,
    };

    Ok(ScenarioSuite {
        max_states: verifier.max_states(),
        monotonic,
        deadlock,
        priority,
    })
}

/// Run the scenarios and print a summary.
pub fn handle_scenarios(args: &ScenariosArgs, out: &mut impl Write) -> Result<ScenarioSuite> {
    let config = args
        .max_states
        .map_or_else(VerifierConfig::default, VerifierConfig::with_max_states);
    let verifier = ProtocolCompositionVerifier::new(config)?;
    let suite = run_suite(&verifier)?;

    writeln!(out, "Governance scenarios (bound {})", suite.max_states)?;
    for (label, result) in suite.labelled_results() {
        write_verdict(out, label, result)?;
    }

    writeln!(
        out,
        "Initial permissions: {} actions for ATP + ASP, {} for ATP + ASP + AEAP",
        suite.monotonic.initial_permitted_two.len(),
        suite.monotonic.initial_permitted_three.len()
    )?;
    if let Some(name) = &suite.monotonic.most_permissive {
        writeln!(
            out,
            "Most permissive protocol: {name} ({} permitting transitions)",
            suite.monotonic.most_permissive_count
        )?;
    }

    let dominance = &suite.priority.dominance;
    writeln!(out, "Denial dominance over {} joint states:", dominance.total)?;
    for (protocol, count) in &dominance.counts {
        writeln!(
            out,
            "  {protocol:<6} {count:>4} ({:.1}%)",
            dominance.share(protocol) * 100.0
        )?;
    }
    writeln!(out, "  none   {:>4}", dominance.none)?;

    if let Some(path) = &args.json {
        write_json_file(path, &serde_json::to_string_pretty(&suite)?)?;
        writeln!(out, "JSON summary written to {}", path.display())?;
    }

    Ok(suite)
}
