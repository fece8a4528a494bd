//! Concord Testing Infrastructure
//!
//! Synthetic protocols, a fluent protocol builder, and proptest strategies
//! shared by the Concord crates' tests and the `concord scenarios` command.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```rust,no_run
//! use concord_testkit::*;
//!
//! let protocols = standard_composition();
//! assert_eq!(protocols.len(), 3);
//! ```

pub mod builder;
pub mod scenarios;
pub mod strategies;

pub use builder::ProtocolBuilder;
pub use scenarios::*;
