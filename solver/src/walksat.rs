use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::{Engine, StatValue};
use crate::formula::Formula;
use crate::literal::Variable;
use crate::store::SharedStore;

#[derive(Debug, Clone, Copy)]
pub struct WalkSatConfig {
    pub max_flips: usize,
    pub p_random_flip: f64,
    /// Fixed seed for deterministic runs (tests, reproducible benchmarks). `None`
    /// seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for WalkSatConfig {
    fn default() -> Self {
        WalkSatConfig {
            max_flips: 10_000,
            p_random_flip: 0.5,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkSatStats {
    pub flips: u64,
    pub solved: bool,
}

impl WalkSatStats {
    fn to_map(self) -> HashMap<String, StatValue> {
        let mut map = HashMap::new();
        map.insert("flips".to_string(), StatValue::Int(self.flips as i64));
        map.insert("solved".to_string(), StatValue::Bool(self.solved));
        map
    }
}

pub struct WalkSatEngine<'f> {
    formula: &'f Formula,
    store: Arc<SharedStore>,
    config: WalkSatConfig,
    rng: StdRng,
    assignment: HashMap<Variable, bool>,
    stats: WalkSatStats,
}

impl<'f> WalkSatEngine<'f> {
    pub fn new(formula: &'f Formula, store: Arc<SharedStore>, config: WalkSatConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        WalkSatEngine {
            formula,
            store,
            config,
            rng,
            assignment: HashMap::new(),
            stats: WalkSatStats::default(),
        }
    }

    pub fn walksat_stats(&self) -> WalkSatStats {
        self.stats
    }

    fn value_of(&self, var: Variable) -> Option<bool> {
        self.assignment.get(&var).copied()
    }

    fn unsatisfied_clause_indices(&self) -> Vec<usize> {
        self.formula
            .clauses()
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty() && c.evaluate(&|v| self.value_of(v)) != Some(true))
            .map(|(i, _)| i)
            .collect()
    }

    fn satisfied_count(&self) -> usize {
        self.formula
            .clauses()
            .iter()
            .filter(|c| c.evaluate(&|v| self.value_of(v)) == Some(true))
            .count()
    }

    fn flip(&mut self, var: Variable) {
        let current = self.assignment.get(&var).copied().unwrap_or(false);
        self.assignment.insert(var, !current);
        self.store.increment_flip_count(var);
        self.stats.flips += 1;
    }

    /// Picks, among the variables appearing in `clause_idx`, the one whose flip
    /// satisfies the most clauses formula-wide. Ties go to whichever appears first
    /// in the clause.
    fn best_flip_in_clause(&mut self, clause_idx: usize) -> Variable {
        let candidates: Vec<Variable> = self.formula.clauses()[clause_idx]
            .literals()
            .iter()
            .map(|l| l.variable())
            .collect();

        let mut best_var = candidates[0];
        let mut best_score = None;
        for &var in &candidates {
            let before = self.assignment.get(&var).copied().unwrap_or(false);
            self.assignment.insert(var, !before);
            let score = self.satisfied_count();
            self.assignment.insert(var, before);

            if best_score.map_or(true, |b| score > b) {
                best_score = Some(score);
                best_var = var;
            }
        }
        best_var
    }
}

impl<'f> Engine for WalkSatEngine<'f> {
    fn solve(&mut self) -> bool {
        log::debug!(
            "walksat engine starting over {} variables, max_flips={}",
            self.formula.num_variables(),
            self.config.max_flips
        );

        for &var in self.formula.variables() {
            let value: bool = self.rng.gen();
            self.assignment.insert(var, value);
        }

        if self.formula.variables().is_empty() {
            self.stats.solved = true;
            return true;
        }

        for _ in 0..self.config.max_flips {
            let unsatisfied = self.unsatisfied_clause_indices();
            if unsatisfied.is_empty() {
                self.stats.solved = true;
                log::info!("walksat found a satisfying assignment after {} flips", self.stats.flips);
                return true;
            }

            let clause_idx = unsatisfied[self.rng.gen_range(0..unsatisfied.len())];

            let chosen_var = if self.rng.gen_bool(self.config.p_random_flip) {
                let literals = self.formula.clauses()[clause_idx].literals();
                let pick = literals[self.rng.gen_range(0..literals.len())];
                pick.variable()
            } else {
                self.best_flip_in_clause(clause_idx)
            };

            self.flip(chosen_var);
        }

        self.stats.solved = false;
        log::info!("walksat exhausted {} flips without success", self.config.max_flips);
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
    fn empty_formula_trivially_succeeds() {
        let formula = Formula::new(vec![]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = WalkSatEngine::new(&formula, store, WalkSatConfig::default());
        assert!(engine.solve());
    }

    #[test]
    fn finds_satisfying_assignment_with_fixed_seed() {
        let formula = Formula::new(vec![clause(&[1, 2]), clause(&[-1, 2]), clause(&[1, -2])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let config = WalkSatConfig {
            max_flips: 1000,
            p_random_flip: 0.5,
            seed: Some(42),
        };
        let mut engine = WalkSatEngine::new(&formula, store, config);
        assert!(engine.solve());
        let assignment = engine.assignment();
        assert!(formula.is_satisfied_by(&|v| assignment.get(&v).copied()));
    }

    #[test]
    fn flip_history_increments_strictly_by_one_per_flip() {
        let formula = Formula::new(vec![clause(&[1, 2]), clause(&[-1, -2])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let config = WalkSatConfig {
            max_flips: 50,
            p_random_flip: 0.3,
            seed: Some(7),
        };
        let mut engine = WalkSatEngine::new(&formula, store.clone(), config);
        engine.solve();
        let total_flips: u64 = store.get_flip_history().values().sum();
        assert_eq!(total_flips, engine.walksat_stats().flips);
    }
}
