use std::fmt;

use crate::literal::{Literal, Variable};

/// A disjunction of literals. Clauses never own duplicate literals with the same
/// variable and opposite polarity would make the clause trivially true; the ingest
/// pipeline does not filter for that, matching DIMACS convention of taking clauses
/// at face value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Clause { literals }
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.literals.iter().map(|l| l.variable())
    }

    /// Raw DIMACS-style signed integers, the representation stored in the shared
    /// store's learned-clause list.
    pub fn to_raw(&self) -> Vec<i64> {
        self.literals.iter().map(|l| l.value()).collect()
    }

    pub fn from_raw(raw: &[i64]) -> Self {
        Clause::new(raw.iter().map(|&v| Literal::new(v)).collect())
    }

    /// Evaluates the clause under a total or partial assignment. `None` means the
    /// variable is unassigned. Returns `Some(true)`/`Some(false)` when the clause is
    /// already decided, `None` while it remains undetermined.
    pub fn evaluate(&self, assignment: &impl Fn(Variable) -> Option<bool>) -> Option<bool> {
        let mut saw_unassigned = false;
        for &lit in &self.literals {
            match assignment(lit.variable()) {
                Some(value) if value == lit.is_positive() => return Some(true),
                Some(_) => {}
                None => saw_unassigned = true,
            }
        }
        if saw_unassigned {
            None
        } else {
            Some(false)
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.literals.iter().map(|l| l.to_string()).collect();
        write!(f, "({})", parts.join(" \u{2228} "))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lit(v: i64) -> Literal {
        Literal::new(v)
    }

    #[test]
    fn raw_roundtrip_preserves_order_and_sign() {
        let clause = Clause::new(vec![lit(1), lit(-2), lit(3)]);
        let raw = clause.to_raw();
        assert_eq!(raw, vec![1, -2, 3]);
        assert_eq!(Clause::from_raw(&raw), clause);
    }

    #[test]
    fn evaluate_true_when_any_literal_satisfied() {
        let clause = Clause::new(vec![lit(1), lit(-2)]);
        let assign = |v: Variable| if v == 2 { Some(false) } else { None };
        assert_eq!(clause.evaluate(&assign), Some(true));
    }

    #[test]
    fn evaluate_false_only_when_fully_assigned_and_unsatisfied() {
        let clause = Clause::new(vec![lit(1), lit(-2)]);
        let assign = |v: Variable| match v {
            1 => Some(false),
            2 => Some(true),
            _ => None,
        };
        assert_eq!(clause.evaluate(&assign), Some(false));
    }

    #[test]
    fn evaluate_none_while_undetermined() {
        let clause = Clause::new(vec![lit(1), lit(-2)]);
        let assign = |v: Variable| if v == 1 { Some(false) } else { None };
        assert_eq!(clause.evaluate(&assign), None);
    }
}
