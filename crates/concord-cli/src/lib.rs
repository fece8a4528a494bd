//! Command-line front end for Concord
//!
//! The `concord` binary verifies composition files, runs the built-in
//! governance scenarios and lists reachable joint states. Command handlers
//! live here so they can be driven from tests with an in-memory writer.

pub mod commands;

pub use commands::enumerate::{handle_enumerate, EnumerateArgs};
pub use commands::scenarios::{handle_scenarios, run_suite, ScenarioSuite, ScenariosArgs};
pub use commands::verify::{handle_verify, VerifyArgs};
