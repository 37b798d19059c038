use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::clause::Clause;
use crate::engine::{Engine, StatValue};
use crate::formula::Formula;
use crate::literal::{Literal, Variable};
use crate::store::SharedStore;

/// A single entry on the decision stack. `Implied` frames come from unit
/// propagation; `Decision` frames are branching points, and carry a `tried_both`
/// flag so chronological backtracking visits each polarity at most once before
/// abandoning the frame for good.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Decision {
        var: Variable,
        value: bool,
        tried_both: bool,
    },
    Implied {
        var: Variable,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CdclStats {
    pub conflicts: u64,
    pub decisions: u64,
    pub unit_propagations: u64,
    pub learned_clauses: u64,
    pub restarts: u64,
    pub solved: bool,
}

impl CdclStats {
    fn to_map(self) -> HashMap<String, StatValue> {
        let mut map = HashMap::new();
        map.insert("conflicts".to_string(), StatValue::Int(self.conflicts as i64));
        map.insert("decisions".to_string(), StatValue::Int(self.decisions as i64));
        map.insert(
            "unit_propagations".to_string(),
            StatValue::Int(self.unit_propagations as i64),
        );
        map.insert(
            "learned_clauses".to_string(),
            StatValue::Int(self.learned_clauses as i64),
        );
        map.insert("restarts".to_string(), StatValue::Int(self.restarts as i64));
        map.insert("solved".to_string(), StatValue::Bool(self.solved));
        map
    }
}

/// Conflict-driven clause learning engine. The control flow here is an explicit
/// loop over the decision stack rather than the naturally recursive formulation —
/// each decision frame is visited at most twice (once per polarity) before being
/// abandoned, so the loop terminates on the same bound a recursive version would.
pub struct CdclEngine<'f> {
    formula: &'f Formula,
    store: Arc<SharedStore>,
    deadline: Option<Instant>,
    assignment: FxHashMap<Variable, bool>,
    decision_stack: Vec<Frame>,
    learned: Vec<Clause>,
    learned_seen: FxHashSet<Vec<i64>>,
    hints: HashMap<Variable, bool>,
    last_restart_at: u64,
    last_decay_at: u64,
    stats: CdclStats,
}

impl<'f> CdclEngine<'f> {
    pub fn new(formula: &'f Formula, store: Arc<SharedStore>, deadline: Option<Instant>) -> Self {
        let learned_raw = store.get_learned_clauses();
        let learned: Vec<Clause> = learned_raw.iter().map(|raw| Clause::from_raw(raw)).collect();
        let learned_seen: FxHashSet<Vec<i64>> = learned_raw.into_iter().collect();
        let hints = store.get_assignment_hints();

        CdclEngine {
            formula,
            store,
            deadline,
            assignment: FxHashMap::default(),
            decision_stack: Vec::new(),
            learned,
            learned_seen,
            hints,
            last_restart_at: 0,
            last_decay_at: 0,
            stats: CdclStats::default(),
        }
    }

    pub fn cdcl_stats(&self) -> CdclStats {
        self.stats
    }

    fn value_of(&self, var: Variable) -> Option<bool> {
        self.assignment.get(&var).copied()
    }

    fn combined_clauses(&self) -> Vec<Clause> {
        let mut all = self.formula.clauses().to_vec();
        all.extend(self.learned.clone());
        all
    }

    fn deadline_exceeded(&self) -> bool {
        self.deadline.map_or(false, |dl| Instant::now() >= dl)
    }

    /// Runs unit propagation to a fixpoint. Returns `true` on a clean fixpoint with
    /// no conflict, `false` the moment a conflict is recorded.
    fn propagate(&mut self) -> bool {
        let working = self.combined_clauses();
        loop {
            if self.deadline_exceeded() {
                return true;
            }

            let mut changed = false;
            for clause in &working {
                if clause.evaluate(&|v| self.value_of(v)) == Some(true) {
                    continue;
                }

                let unassigned: Vec<Literal> = clause
                    .literals()
                    .iter()
                    .copied()
                    .filter(|l| self.value_of(l.variable()).is_none())
                    .collect();

                if unassigned.is_empty() {
                    self.record_conflict(clause);
                    return false;
                }

                if unassigned.len() == 1 {
                    let lit = unassigned[0];
                    self.assignment.insert(lit.variable(), lit.is_positive());
                    self.decision_stack.push(Frame::Implied { var: lit.variable() });
                    self.stats.unit_propagations += 1;
                    changed = true;
                }
            }

            if !changed {
                return true;
            }
        }
    }

    fn record_conflict(&mut self, clause: &Clause) {
        self.stats.conflicts += 1;
        for lit in clause.literals() {
            self.store.update_variable_score(lit.variable(), 1.0);
        }

        let raw = clause.to_raw();
        if self.learned_seen.insert(raw.clone()) {
            self.learned.push(clause.clone());
            self.store.add_learned_clause(raw);
            self.stats.learned_clauses += 1;
        }
        log::trace!("cdcl conflict #{}", self.stats.conflicts);
    }

    /// Fires restart and/or decay exactly once per threshold crossing, returns
    /// whether a restart happened (in which case the caller should resume the
    /// search loop rather than attempt a backtrack on an now-empty stack).
    fn maybe_restart_and_decay(&mut self) -> bool {
        let conflicts = self.stats.conflicts;
        let mut restarted = false;

        if conflicts > 0 && conflicts % 100 == 0 && conflicts != self.last_restart_at {
            self.last_restart_at = conflicts;
            self.assignment.clear();
            self.decision_stack.clear();
            self.stats.restarts += 1;
            restarted = true;
            log::trace!("cdcl restart at {} conflicts", conflicts);
        }

        if conflicts > 0 && conflicts % 50 == 0 && conflicts != self.last_decay_at {
            self.last_decay_at = conflicts;
            for &var in self.formula.variables() {
                self.store.update_variable_score(var, -0.1);
            }
            log::trace!("cdcl score decay at {} conflicts", conflicts);
        }

        restarted
    }

    /// Pops implied frames, then flips an untried decision in place, or keeps
    /// popping past exhausted decisions looking for one. Returns `false` once the
    /// stack is drained with no untried decision left.
    fn backtrack(&mut self) -> bool {
        while let Some(frame) = self.decision_stack.last_mut() {
            match frame {
                Frame::Implied { var } => {
                    let var = *var;
                    self.assignment.remove(&var);
                    self.decision_stack.pop();
                }
                Frame::Decision {
                    var,
                    value,
                    tried_both,
                } => {
                    if !*tried_both {
                        *tried_both = true;
                        let var = *var;
                        let flipped = !*value;
                        *value = flipped;
                        self.assignment.insert(var, flipped);
                        return true;
                    }
                    let var = *var;
                    self.assignment.remove(&var);
                    self.decision_stack.pop();
                }
            }
        }
        false
    }

    fn pick_variable(&self) -> Option<Variable> {
        let unassigned: Vec<Variable> = self
            .formula
            .variables()
            .iter()
            .copied()
            .filter(|&v| self.value_of(v).is_none())
            .collect();

        if unassigned.is_empty() {
            return None;
        }

        if let Some(&hinted) = unassigned.iter().find(|v| self.hints.contains_key(v)) {
            return Some(hinted);
        }

        let scores = self.store.get_variable_scores();
        if !scores.is_empty() {
            let mut best: Option<(Variable, f64)> = None;
            for &v in &unassigned {
                let score = scores.get(&v).copied().unwrap_or(0.0);
                best = match best {
                    None => Some((v, score)),
                    Some((bv, bs)) if score > bs || (score == bs && v < bv) => Some((v, score)),
                    existing => existing,
                };
            }
            return best.map(|(v, _)| v);
        }

        unassigned.into_iter().min()
    }

    fn polarity_order(&self, var: Variable) -> (bool, bool) {
        match self.hints.get(&var) {
            Some(&hint) => (hint, !hint),
            None => (true, false),
        }
    }

    fn run(&mut self) -> bool {
        log::debug!("cdcl engine starting over {} variables", self.formula.num_variables());
        loop {
            if self.deadline_exceeded() {
                self.stats.solved = false;
                log::info!("cdcl aborting: deadline exceeded");
                return false;
            }

            if !self.propagate() {
                let restarted = self.maybe_restart_and_decay();
                if restarted {
                    continue;
                }
                if !self.backtrack() {
                    self.stats.solved = false;
                    log::info!("cdcl exhausted the search space without success");
                    return false;
                }
                continue;
            }

            if self.assignment.len() == self.formula.num_variables() {
                self.stats.solved = true;
                log::info!(
                    "cdcl found a satisfying assignment in {} decisions",
                    self.stats.decisions
                );
                return true;
            }

            match self.pick_variable() {
                None => {
                    self.stats.solved = true;
                    return true;
                }
                Some(var) => {
                    let (polarity, _) = self.polarity_order(var);
                    self.assignment.insert(var, polarity);
                    self.decision_stack.push(Frame::Decision {
                        var,
                        value: polarity,
                        tried_both: false,
                    });
                    self.stats.decisions += 1;
                }
            }
        }
    }
}

impl<'f> Engine for CdclEngine<'f> {
    fn solve(&mut self) -> bool {
        self.run()
    }

    fn assignment(&self) -> HashMap<Variable, bool> {
        self.assignment.iter().map(|(&k, &v)| (k, v)).collect()
    }

    fn stats(&self) -> HashMap<String, StatValue> {
        self.stats.to_map()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::literal::Literal;
    use crate::store::StoreConfig;

    fn clause(lits: &[i64]) -> Clause {
        Clause::new(lits.iter().map(|&v| Literal::new(v)).collect())
    }

    #[test]
    fn already_elapsed_deadline_aborts_before_any_decision() {
        let formula = Formula::new(vec![
            clause(&[1, 2, 3]),
            clause(&[-1, -2]),
            clause(&[-1, -3]),
            clause(&[-2, -3]),
        ]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let past = Instant::now() - std::time::Duration::from_secs(1);
        let mut engine = CdclEngine::new(&formula, store, Some(past));
        assert!(!engine.solve());
        assert_eq!(engine.cdcl_stats().decisions, 0);
        assert!(!engine.cdcl_stats().solved);
    }

    #[test]
    fn unit_clause_is_solved_with_zero_decisions() {
        let formula = Formula::new(vec![clause(&[1])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = CdclEngine::new(&formula, store, None);
        assert!(engine.solve());
        assert_eq!(engine.assignment().get(&1), Some(&true));
        assert_eq!(engine.cdcl_stats().decisions, 0);
    }

    #[test]
    fn empty_formula_is_solved_with_zero_decisions() {
        let formula = Formula::new(vec![]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = CdclEngine::new(&formula, store, None);
        assert!(engine.solve());
        assert_eq!(engine.cdcl_stats().decisions, 0);
        assert!(engine.assignment().is_empty());
    }

    #[test]
    fn contradiction_fails_with_no_assignment() {
        let formula = Formula::new(vec![clause(&[1]), clause(&[-1])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = CdclEngine::new(&formula, store, None);
        assert!(!engine.solve());
    }

    #[test]
    fn solves_a_small_satisfiable_formula() {
        let formula = Formula::new(vec![
            clause(&[1, 2, 3]),
            clause(&[-1, -2]),
            clause(&[-1, -3]),
            clause(&[-2, -3]),
        ]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = CdclEngine::new(&formula, store, None);
        assert!(engine.solve());
        let assignment = engine.assignment();
        assert!(formula.is_satisfied_by(&|v| assignment.get(&v).copied()));
    }

    #[test]
    fn learned_clause_is_a_sub_multiset_of_an_observed_conflict() {
        let formula = Formula::new(vec![clause(&[1]), clause(&[-1])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        let mut engine = CdclEngine::new(&formula, store.clone(), None);
        engine.solve();
        for learned in store.get_learned_clauses() {
            assert!(
                learned == vec![1] || learned == vec![-1],
                "unexpected learned clause {:?}",
                learned
            );
        }
    }

    #[test]
    fn hinted_polarity_is_tried_first() {
        let formula = Formula::new(vec![clause(&[1, 2])]);
        let store = Arc::new(SharedStore::new(StoreConfig::default()));
        store.set_assignment_hint(1, false);
        store.set_assignment_hint(2, true);
        let mut engine = CdclEngine::new(&formula, store, None);
        assert!(engine.solve());
        let assignment = engine.assignment();
        assert!(formula.is_satisfied_by(&|v| assignment.get(&v).copied()));
    }
}
