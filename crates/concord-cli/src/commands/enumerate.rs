//! `concord enumerate`

use anyhow::{Context, Result};
use clap::Args;
use concord_verify::{CompositionFile, Exploration, ProtocolComposer, DEFAULT_MAX_STATES};
use std::io::Write;
use std::path::PathBuf;

/// Arguments for `concord enumerate`.
#[derive(Debug, Clone, Args)]
pub struct EnumerateArgs {
    /// Composition file (TOML)
    pub file: PathBuf,

    /// Stop after this many joint states
    #[arg(long, default_value_t = DEFAULT_MAX_STATES)]
    pub max_states: usize,
}

/// Print the reachable joint states in discovery order.
pub fn handle_enumerate(args: &EnumerateArgs, out: &mut impl Write) -> Result<Exploration> {
    let protocols = CompositionFile::load(&args.file)
        .and_then(CompositionFile::into_protocols)
        .with_context(|| format!("loading composition {}", args.file.display()))?;
    let composer = ProtocolComposer::new(protocols)?;
    let exploration = composer.explore(args.max_states);

    for (index, state) in exploration.states.iter().enumerate() {
        writeln!(out, "{:>4}. {state}", index + 1)?;
    }
    if exploration.truncated {
        writeln!(
            out,
            "Stopped at {} states; more joint states are reachable.",
            exploration.states.len()
        )?;
    } else {
        writeln!(out, "{} reachable joint states.", exploration.states.len())?;
    }

    Ok(exploration)
}
