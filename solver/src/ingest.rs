//! Bridge between an already-parsed clause list (as a collaborator's DIMACS parser
//! would hand back) and this crate's [`Formula`] type.

use crate::clause::Clause;
use crate::error::SolverError;
use crate::formula::Formula;
use crate::literal::{Literal, Variable};

/// Validates and assembles a `(clauses, variables)` pair into a [`Formula`].
///
/// `variables` must be sorted ascending with no duplicates and must contain exactly
/// the variables mentioned by `clauses` (no more, no fewer). Every literal must be
/// nonzero. Any violation is reported as [`SolverError::MalformedFormula`].
pub fn ingest(clauses: Vec<Vec<i64>>, variables: Vec<Variable>) -> Result<Formula, SolverError> {
    if variables.windows(2).any(|w| w[0] >= w[1]) {
        return Err(SolverError::MalformedFormula(
            "variables list must be sorted ascending with no duplicates".into(),
        ));
    }

    let mut built = Vec::with_capacity(clauses.len());
    for raw_clause in &clauses {
        let mut literals = Vec::with_capacity(raw_clause.len());
        for &raw_lit in raw_clause {
            if raw_lit == 0 {
                return Err(SolverError::MalformedFormula(
                    "literal 0 is not permitted (reserved as clause terminator)".into(),
                ));
            }
            let lit = Literal::new(raw_lit);
            if variables.binary_search(&lit.variable()).is_err() {
                return Err(SolverError::MalformedFormula(format!(
                    "literal {} references variable {} not present in the declared variable list",
                    raw_lit,
                    lit.variable()
                )));
            }
            literals.push(lit);
        }
        built.push(Clause::new(literals));
    }

    let formula = Formula::new(built);
    if formula.variables() != variables.as_slice() {
        return Err(SolverError::MalformedFormula(
            "declared variable list does not match the variables actually used by the clauses"
                .into(),
        ));
    }

    Ok(formula)
}
