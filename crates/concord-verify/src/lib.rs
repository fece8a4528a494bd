//! # Concord Verify - Composition Checking
//!
//! Lock-step AND composition of [`concord_core::ProtocolModel`]s and a bounded
//! model checker for three properties of the composed system:
//!
//! - **Monotonic restriction**: the composition never permits an action a
//!   component denies
//! - **Deadlock freedom**: every reachable joint state has a globally
//!   permitted action
//! - **Priority ordering**: no denial is overridden against a protocol ranking
//!
//! Checks are exhaustive up to a configurable state bound. A pass that hit
//! the bound is flagged on the result and logged, since it only covers the
//! states that were inspected.
//!
//! ```rust,no_run
//! use concord_verify::ProtocolCompositionVerifier;
//! # fn run(protocols: Vec<concord_core::ProtocolModel>) -> concord_core::Result<()> {
//! let verifier = ProtocolCompositionVerifier::with_max_states(500)?;
//! for (property, result) in verifier.verify_all(&protocols, None)? {
//!     println!("{property}: {result}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod composer;
pub mod config;
pub mod priority;
pub mod properties;
pub mod report;
pub mod result;
pub mod verifier;

pub use composer::{ComposedDecision, DecisionComposer, Exploration, JointStates, ProtocolComposer};
pub use config::{CompositionFile, VerifierConfig, DEFAULT_MAX_STATES};
pub use priority::PriorityRanks;
pub use properties::{describe_violation, PropertyKind, PropertySpec};
pub use report::VerificationReport;
pub use result::VerificationResult;
pub use verifier::ProtocolCompositionVerifier;
