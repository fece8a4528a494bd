//! Subcommand handlers

pub mod enumerate;
pub mod scenarios;
pub mod verify;

use anyhow::{Context, Result};
use concord_verify::VerificationResult;
use std::io::Write;
use std::path::Path;

/// One verdict line, plus the violation detail when there is one.
pub(crate) fn write_verdict(out: &mut impl Write, label: &str, result: &VerificationResult) -> Result<()> {
    let verdict = match (result.holds, result.bound_reached) {
        (false, _) => "VIOLATED",
        (true, true) => "BOUNDED",
        (true, false) => "HOLDS",
    };
    writeln!(
        out,
        "  {verdict:<9} {label:<40} {} states checked",
        result.states_checked
    )?;
    if let Some(cx) = &result.counterexample {
        writeln!(out, "            {}", result.summary())?;
        writeln!(out, "            at {cx}")?;
    }
    Ok(())
}

pub(crate) fn write_json_file(path: &Path, json: &str) -> Result<()> {
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
