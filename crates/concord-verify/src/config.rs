//! Verifier configuration and composition files
//!
//! A composition file bundles the protocols to compose, an optional priority
//! list and an optional `[verifier]` table:
//!
//! ```toml
//! priority = ["ASP", "ATP"]
//!
//! [verifier]
//! max_states = 500
//!
//! [[protocols]]
//! name = "ATP"
//! initial_state = "low"
//! states = [{ name = "low" }]
//! transitions = [{ from = "low", to = "low", action = "read", permitted = true }]
//! ```

use concord_core::{ConcordError, ProtocolDefinition, ProtocolModel, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default upper bound on joint states inspected per check.
pub const DEFAULT_MAX_STATES: usize = 10_000;

/// Verifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Maximum joint states inspected per check
    pub max_states: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_states: DEFAULT_MAX_STATES,
        }
    }
}

impl VerifierConfig {
    /// Configuration with the given state bound.
    pub fn with_max_states(max_states: usize) -> Self {
        Self { max_states }
    }

    /// Check the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::InvalidConfig`] when `max_states` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_states == 0 {
            return Err(ConcordError::invalid_config("max_states must be at least 1"));
        }
        Ok(())
    }
}

/// A set of protocols to compose, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionFile {
    /// Verifier settings
    #[serde(default)]
    pub verifier: VerifierConfig,
    /// Highest to lowest priority; declaration order when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,
    /// Protocols in composition order
    pub protocols: Vec<ProtocolDefinition>,
}

impl CompositionFile {
    /// Parse a composition from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::Definition`] on malformed input.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a composition file.
    ///
    /// # Errors
    ///
    /// Returns [`ConcordError::Definition`] when the file cannot be read or
    /// parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|err| {
            ConcordError::definition(format!("{}: {err}", path.display()))
        })
    }

    /// Build every protocol model.
    ///
    /// # Errors
    ///
    /// Returns the first structural error encountered.
    pub fn into_protocols(self) -> Result<Vec<ProtocolModel>> {
        self.protocols
            .into_iter()
            .map(ProtocolDefinition::into_model)
            .collect()
    }

    /// The explicit priority list, or protocol declaration order.
    pub fn effective_priority(&self) -> Vec<String> {
        match &self.priority {
            Some(priority) => priority.clone(),
            None => self.protocols.iter().map(|p| p.name.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const PAIR: &str = r#"
priority = ["B", "A"]

[verifier]
max_states = 50

[[protocols]]
name = "A"
initial_state = "s0"
states = [{ name = "s0" }]
transitions = [{ from = "s0", to = "s0", action = "x", permitted = true }]

[[protocols]]
name = "B"
initial_state = "s0"
states = [{ name = "s0" }]
transitions = [{ from = "s0", to = "s0", action = "x", permitted = false }]
"#;

    #[test]
    fn default_config_is_valid() {
        let config = VerifierConfig::default();
        assert_eq!(config.max_states, DEFAULT_MAX_STATES);
        assert!(config.validate().is_ok());
        assert_matches!(
            VerifierConfig::with_max_states(0).validate(),
            Err(ConcordError::InvalidConfig { .. })
        );
    }

    #[test]
    fn parses_composition() {
        let file = CompositionFile::from_toml_str(PAIR).unwrap();
        assert_eq!(file.verifier.max_states, 50);
        assert_eq!(file.effective_priority(), vec!["B", "A"]);

        let protocols = file.into_protocols().unwrap();
        assert_eq!(protocols.len(), 2);
        assert!(!protocols[1].decide("x").permitted);
    }

    #[test]
    fn verifier_table_is_optional() {
        let trimmed = PAIR.replace("[verifier]\nmax_states = 50\n", "").replace("priority = [\"B\", \"A\"]\n", "");
        let file = CompositionFile::from_toml_str(&trimmed).unwrap();
        assert_eq!(file.verifier, VerifierConfig::default());
        assert_eq!(file.effective_priority(), vec!["A", "B"]);
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "protocols = 3").unwrap();
        let err = CompositionFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));

        assert_matches!(
            CompositionFile::load(dir.path().join("missing.toml")),
            Err(ConcordError::Definition { .. })
        );
    }
}
