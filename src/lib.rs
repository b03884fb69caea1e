//! barledger — technical-analysis indicator engine and strategy evaluator.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod domain;
pub mod ports;
