//! Core of a hybrid portfolio SAT solver: a CDCL engine, a WalkSAT engine and a
//! brute-force enumerator composed by a [`controller::Controller`] around a
//! [`store::SharedStore`] that persists learned clauses, activity scores and
//! assignment hints across runs.

/// Bounded truth-table search used for small variable scopes.
pub mod brute;
/// Conflict-driven clause-learning engine.
pub mod cdcl;
/// A disjunction of literals.
pub mod clause;
/// Portfolio escalation policy over the three engines.
pub mod controller;
/// Capability every solver engine offers to the controller.
pub mod engine;
/// Typed error enum shared by every fallible operation in the crate.
pub mod error;
/// A CNF formula: a set of clauses over a derived variable universe.
pub mod formula;
/// Validates a parser's `(clauses, variables)` pair into a [`formula::Formula`].
pub mod ingest;
/// Signed literals and the variable ids they carry.
pub mod literal;
/// Concurrency-safe knowledge store, persisted as JSON.
pub mod store;
/// Stochastic local-search engine.
pub mod walksat;

pub use brute::{BruteForceConfig, BruteForceEngine, BruteStats};
pub use cdcl::{CdclEngine, CdclStats};
pub use clause::Clause;
pub use controller::{Controller, ControllerConfig, ControllerResult, RunRecord, Winner};
pub use engine::{Engine, StatValue};
pub use error::SolverError;
pub use formula::Formula;
pub use literal::{Literal, Variable};
pub use store::{SharedStore, StoreConfig, StoreState};
pub use walksat::{WalkSatConfig, WalkSatEngine};
