use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::literal::Variable;

/// A single statistic value. Engines report heterogeneous stats (counts, ratios,
/// booleans); the controller flattens these into the run record without caring
/// which engine produced them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{}", v),
            StatValue::Float(v) => write!(f, "{}", v),
            StatValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Capability every solver engine offers. The controller is polymorphic over this
/// trait rather than inspecting concrete engine types.
pub trait Engine {
    /// Runs the engine to completion (or to its own internal bound) and reports
    /// whether it found a satisfying assignment.
    fn solve(&mut self) -> bool;

    /// The assignment found, if any. Undefined (may be partial or stale) before
    /// `solve` has been called, or after a failed `solve`.
    fn assignment(&self) -> HashMap<Variable, bool>;

    /// A flattened view of this engine's statistics, keyed by stat name.
    fn stats(&self) -> HashMap<String, StatValue>;
}
