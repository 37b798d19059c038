use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{Engine, StatValue};
use crate::error::SolverError;
use crate::formula::Formula;
use crate::literal::Variable;
use crate::store::SharedStore;

#[derive(Debug, Clone, Copy)]
pub struct BruteForceConfig {
    pub scope_limit: usize,
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        BruteForceConfig { scope_limit: 14 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BruteStats {
    pub evaluations: u64,
    pub assignments_tested: u64,
    pub solved: bool,
}

impl BruteStats {
    fn to_map(self) -> HashMap<String, StatValue> {
        let mut map = HashMap::new();
        map.insert(
            "evaluations".to_string(),
            StatValue::Int(self.evaluations as i64),
        );
        map.insert(
            "assignments_tested".to_string(),
            StatValue::Int(self.assignments_tested as i64),
        );
        map.insert("solved".to_string(), StatValue::Bool(self.solved));
        map
    }
}

/// Exhaustive enumeration over a bounded variable scope. Enumerates assignments in
/// lexicographic order over the sorted variable list: bit `i` of the counter (from
/// the high end) selects the polarity of `variables[i]`.
pub struct BruteForceEngine<'f> {
    formula: &'f Formula,
    store: Arc<SharedStore>,
    stats: BruteStats,
    assignment: HashMap<Variable, bool>,
}

impl<'f> BruteForceEngine<'f> {
    pub fn new(
        formula: &'f Formula,
        store: Arc<SharedStore>,
        config: BruteForceConfig,
    ) -> Result<Self, SolverError> {
        let num_variables = formula.num_variables();
        if num_variables > config.scope_limit {
            return Err(SolverError::ScopeExceeded {
                num_variables,
                limit: config.scope_limit,
            });
        }
        Ok(BruteForceEngine {
            formula,
            store,
            stats: BruteStats::default(),
            assignment: HashMap::new(),
        })
    }

    pub fn brute_stats(&self) -> BruteStats {
        self.stats
    }
}

impl<'f> Engine for BruteForceEngine<'f> {
    fn solve(&mut self) -> bool {
        log::debug!(
            "brute force engine starting over {} variables",
            self.formula.num_variables()
        );
        let variables = self.formula.variables();
        let n = variables.len();
        let total: u64 = 1u64.checked_shl(n as u32).unwrap_or(u64::MAX);

        for counter in 0..total {
            let mut candidate: HashMap<Variable, bool> = HashMap::with_capacity(n);
            for (i, &var) in variables.iter().enumerate() {
                let bit = (counter >> (n - 1 - i)) & 1;
                candidate.insert(var, bit == 1);
            }
            self.stats.assignments_tested += 1;

            let mut all_satisfied = true;
            for clause in self.formula.clauses() {
                self.stats.evaluations += 1;
                if clause.evaluate(&|v| candidate.get(&v).copied()) != Some(true) {
                    all_satisfied = false;
                    break;
                }
            }

            if all_satisfied {
                self.assignment = candidate;
                self.stats.solved = true;
                log::info!("brute force found a satisfying assignment");
                return true;
            }
        }

        let mut scope: Vec<Variable> = variables.to_vec();
        scope.sort_unstable();
        self.store.add_unsat_scope(scope);
        self.stats.solved = false;
        log::info!("brute force exhausted the search space without success");
        false
    }

    fn assignment(&self) -> HashMap<Variable, bool> {
        self.assignment.clone()
    }

    fn stats(&self) -> HashMap<String, StatValue> {
        self.stats.to_map()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clause::Clause;
    use crate::literal::Literal;
    use crate::store::StoreConfig;

    fn clause(lits: &[i64]) -> Clause {
        Clause::new(lits.iter().map(|&v| Literal::new(v)).collect())
    }

    #[test]
    fn scope_exceeded_is_rejected_at_construction() {
        let formula = Formula::new(vec![clause(&[1])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let result = BruteForceEngine::new(
            &formula,
            store,
            BruteForceConfig { scope_limit: 0 },
        );
        assert!(matches!(result, Err(SolverError::ScopeExceeded { .. })));
    }

    #[test]
    fn finds_satisfying_assignment_for_unit_clause() {
        let formula = Formula::new(vec![clause(&[1])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = BruteForceEngine::new(&formula, store, BruteForceConfig::default())
            .unwrap();
        assert!(engine.solve());
        assert_eq!(engine.assignment().get(&1), Some(&true));
    }

    #[test]
    fn records_unsat_scope_on_failure() {
        let formula = Formula::new(vec![clause(&[1]), clause(&[-1])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = BruteForceEngine::new(&formula, store.clone(), BruteForceConfig::default())
            .unwrap();
        assert!(!engine.solve());
        assert_eq!(store.get_unsat_scopes(), vec![vec![1]]);
    }

    #[test]
    fn unsatisfiable_two_variable_xor_like_formula() {
        let formula = Formula::new(vec![
            clause(&[1, 2]),
            clause(&[-1, 2]),
            clause(&[1, -2]),
            clause(&[-1, -2]),
        ]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = BruteForceEngine::new(&formula, store.clone(), BruteForceConfig::default())
            .unwrap();
        assert!(!engine.solve());
        assert_eq!(store.get_unsat_scopes(), vec![vec![1, 2]]);
    }
}
