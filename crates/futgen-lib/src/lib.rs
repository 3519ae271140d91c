//! futgen: capability-driven test configuration generation for OpenSync
//! functional tests.
//!
//! Declarative test templates are resolved against two device capability
//! snapshots (DUT and reference) and a regulatory rule table, producing flat
//! parameter sets per test case.

pub mod assembler;
pub mod capabilities;
pub mod compare;
pub mod config;
pub mod error;
pub mod expand;
pub mod generator;
pub mod regulatory;
pub mod roles;
pub mod template;
pub mod wifi;

pub use error::FutgenError;
