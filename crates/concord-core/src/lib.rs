//! # Concord Core - Protocol Models
//!
//! Finite-state governance protocols and the values shared by composition and
//! verification: state ids, joint states, composed-state snapshots,
//! counterexamples, and the unified [`ConcordError`].
//!
//! Protocols are deliberately tiny (single-digit state counts). Nothing here
//! is a general model checker; see `concord-verify` for the product
//! construction and the property checks built on these types.

pub mod definition;
pub mod errors;
pub mod joint;
pub mod model;

pub use definition::ProtocolDefinition;
pub use errors::{ConcordError, Result};
pub use joint::{ComposedState, Counterexample, JointState};
pub use model::{DenialReason, ProtocolDecision, ProtocolModel, State, StateId, Transition};
