#![warn(unreachable_pub, missing_debug_implementations)]

//! `netsim-scenario`: the declarative scenario engine built on top of `netsim-core`. A scenario
//! document describes a network to build from scratch, an ordered list of steps to run against
//! it, and an unordered list of property validations to check afterward.

pub mod document;
pub mod error;
pub mod executor;
pub mod parse;
#[cfg(test)]
pub(crate) mod testing;
pub mod validators;

pub use document::{NodeConfigPatch, Scenario, Setup, SetupLink, SetupNode, Step, Validation};
pub use error::ScenarioError;
pub use executor::{run_scenario, ScenarioResult, ScenarioRunConfig, StepResult, ValidationResult};
pub use parse::{parse_auto, parse_json, parse_yaml};
