//! `concord verify`

use super::{write_json_file, write_verdict};
use anyhow::{Context, Result};
use clap::Args;
use concord_verify::{CompositionFile, ProtocolComposer, ProtocolCompositionVerifier, VerificationReport};
use std::io::Write;
use std::path::PathBuf;

/// Arguments for `concord verify`.
#[derive(Debug, Clone, Args)]
pub struct VerifyArgs {
    /// Composition file (TOML)
    pub file: PathBuf,

    /// Override the state bound set in the file
    #[arg(long)]
    pub max_states: Option<usize>,

    /// Also write the report as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// Load a composition file, run every check and print the verdicts.
///
/// Violations are results, not failures: the report is returned either way.
pub fn handle_verify(args: &VerifyArgs, out: &mut impl Write) -> Result<VerificationReport> {
    let file = CompositionFile::load(&args.file)
        .with_context(|| format!("loading composition {}", args.file.display()))?;

    let mut config = file.verifier.clone();
    if let Some(max_states) = args.max_states {
        config.max_states = max_states;
    }
    let priority = file.effective_priority();
    let protocols = file.into_protocols().context("building protocols")?;

    let verifier = ProtocolCompositionVerifier::new(config)?;
    let results = verifier.verify_all(&protocols, Some(priority.as_slice()))?;
    let composer = ProtocolComposer::new(protocols)?;
    let report = VerificationReport::new(&composer, priority, verifier.max_states(), results);

    writeln!(
        out,
        "Composition: {} ({} joint states, bound {})",
        report.protocols.join(" & "),
        report.state_space_size,
        report.max_states
    )?;
    writeln!(out, "Priority:    {}", report.priority.join(" > "))?;
    for (property, result) in &report.results {
        write_verdict(out, property.name(), result)?;
    }
    if !report.is_complete() {
        writeln!(out, "Some checks stopped at the state bound; raise --max-states for full coverage.")?;
    }

    if let Some(path) = &args.json {
        write_json_file(path, &report.to_json_pretty()?)?;
        writeln!(out, "JSON report written to {}", path.display())?;
    }

    Ok(report)
}
