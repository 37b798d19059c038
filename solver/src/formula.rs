use itertools::Itertools;

use crate::clause::Clause;
use crate::literal::Variable;

/// A CNF formula: a conjunction of clauses over a fixed variable set.
///
/// `variables` is always the sorted, deduplicated set of variables mentioned by
/// `clauses` (the definition of V used throughout the solver engines and the store).
#[derive(Debug, Clone)]
pub struct Formula {
    clauses: Vec<Clause>,
    variables: Vec<Variable>,
}

impl Formula {
    pub fn new(clauses: Vec<Clause>) -> Self {
        let mut variables: Vec<Variable> = clauses
            .iter()
            .flat_map(|c| c.variables())
            .unique()
            .collect();
        variables.sort_unstable();
        Formula { clauses, variables }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Appends clauses learned elsewhere (e.g. read back from the shared store) and
    /// recomputes the variable set, since a learned clause may in principle reference
    /// a variable not present in the original input.
    pub fn with_extra_clauses(&self, extra: impl IntoIterator<Item = Clause>) -> Formula {
        let mut clauses = self.clauses.clone();
        clauses.extend(extra);
        Formula::new(clauses)
    }

    /// True when every clause evaluates to `Some(true)` under the given assignment.
    pub fn is_satisfied_by(&self, assignment: &impl Fn(Variable) -> Option<bool>) -> bool {
        self.clauses
            .iter()
            .all(|c| c.evaluate(assignment) == Some(true))
    }
}
