//! Declarative protocol definitions
//!
//! Protocols can be described in TOML instead of code:
//!
//! ```toml
//! name = "ATP"
//! initial_state = "low"
//!
//! [[states]]
//! name = "low"
//! metadata = { tier = 1 }
//!
//! [[transitions]]
//! from = "low"
//! to = "low"
//! action = "read"
//! permitted = true
//! ```

use crate::errors::Result;
use crate::model::{ProtocolModel, State, Transition};
use serde::{Deserialize, Serialize};

/// Serializable description of a protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDefinition {
    /// Protocol name
    pub name: String,
    /// Name of the starting state
    pub initial_state: String,
    /// Declared states
    pub states: Vec<State>,
    /// Declared transitions, first declaration wins on duplicates
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl ProtocolDefinition {
    /// Parse a single protocol definition from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConcordError::Definition`] on malformed input.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Validate and build the protocol model.
    ///
    /// # Errors
    ///
    /// Returns the structural errors of [`ProtocolModel::new`].
    pub fn into_model(self) -> Result<ProtocolModel> {
        ProtocolModel::new(self.name, self.states, self.transitions, &self.initial_state)
    }
}

impl From<&ProtocolModel> for ProtocolDefinition {
    fn from(model: &ProtocolModel) -> Self {
        Self {
            name: model.name().to_string(),
            initial_state: model.initial_state().to_string(),
            states: model.states().to_vec(),
            transitions: model.transitions().to_vec(),
        }
    }
}

impl TryFrom<ProtocolDefinition> for ProtocolModel {
    type Error = crate::errors::ConcordError;

    fn try_from(definition: ProtocolDefinition) -> Result<Self> {
        definition.into_model()
    }
}
