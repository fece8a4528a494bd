//! Fluent construction of ad-hoc protocols

use concord_core::{ProtocolModel, Result, State, Transition};

/// Builder for small test protocols.
///
/// The first declared state is the initial state unless [`Self::initial`]
/// says otherwise.
///
/// ```rust
/// use concord_testkit::ProtocolBuilder;
///
/// let gate = ProtocolBuilder::new("GATE")
///     .states(["open", "closed"])
///     .permit("open", "closed", "close")
///     .deny("closed", "closed", "close")
///     .build();
/// assert!(gate.decide("close").permitted);
/// ```
#[derive(Debug, Clone)]
pub struct ProtocolBuilder {
    name: String,
    states: Vec<State>,
    transitions: Vec<Transition>,
    initial: Option<String>,
}

impl ProtocolBuilder {
    /// Start a protocol called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            transitions: Vec::new(),
            initial: None,
        }
    }

    /// Declare an accepting state.
    pub fn state(mut self, name: impl Into<String>) -> Self {
        self.states.push(State::new(name));
        self
    }

    /// Declare several accepting states in order.
    pub fn states<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states.extend(names.into_iter().map(State::new));
        self
    }

    /// Declare a fully specified state.
    pub fn with_state(mut self, state: State) -> Self {
        self.states.push(state);
        self
    }

    /// Add a permitting transition.
    pub fn permit(self, from: &str, to: &str, action: &str) -> Self {
        self.transition(Transition::permit(from, to, action))
    }

    /// Add an explicitly denying transition.
    pub fn deny(self, from: &str, to: &str, action: &str) -> Self {
        self.transition(Transition::deny(from, to, action))
    }

    /// Add an arbitrary transition.
    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Override the initial state.
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Build, surfacing structural errors.
    pub fn try_build(self) -> Result<ProtocolModel> {
        let initial = self
            .initial
            .or_else(|| self.states.first().map(|s| s.name.clone()))
            .unwrap_or_default();
        ProtocolModel::new(self.name, self.states, self.transitions, &initial)
    }

    /// Build, panicking on structural errors.
    pub fn build(self) -> ProtocolModel {
        let name = self.name.clone();
        self.try_build()
            .unwrap_or_else(|err| panic!("invalid test protocol {name}: {err}"))
    }
}
