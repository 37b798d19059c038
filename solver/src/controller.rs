use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::brute::{BruteForceConfig, BruteForceEngine};
use crate::cdcl::CdclEngine;
use crate::engine::{Engine, StatValue};
use crate::formula::Formula;
use crate::literal::Variable;
use crate::store::SharedStore;
use crate::walksat::{WalkSatConfig, WalkSatEngine};

/// Which engine, if any, produced the winning assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Cdcl,
    WalkSat,
    Brute,
    None,
}

impl Winner {
    fn as_str(self) -> &'static str {
        match self {
            Winner::Cdcl => "cdcl",
            Winner::WalkSat => "walksat",
            Winner::Brute => "brute",
            Winner::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub brute_scope_limit: usize,
    pub debug: bool,
    pub source_file: Option<String>,
    pub walksat_max_flips: Option<usize>,
    pub walksat_p_random_flip: Option<f64>,
    pub deadline: Option<Instant>,
    pub walksat_seed: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            brute_scope_limit: 10,
            debug: false,
            source_file: None,
            walksat_max_flips: None,
            walksat_p_random_flip: None,
            deadline: None,
            walksat_seed: None,
        }
    }
}

/// Everything a collaborator's run-log writer needs about one controller
/// invocation. The controller only builds this value; writing it out to CSV (or
/// anywhere else) is left to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub source_file: Option<String>,
    pub solver: String,
    pub status: String,
    pub runtime_sec: f64,
    pub variables: usize,
    pub clauses: usize,
    pub clause_var_ratio: f64,
    pub assignment_found: bool,
    pub stats: HashMap<String, StatValue>,
}

/// Everything one `Controller::run` invocation produces: whether a solver
/// succeeded, the winning assignment (empty on failure), and the run record a
/// collaborator would append to its log.
#[derive(Debug, Clone)]
pub struct ControllerResult {
    pub solved: bool,
    pub assignment: HashMap<Variable, bool>,
    pub record: RunRecord,
}

/// Orchestrates the CDCL -> WalkSAT -> brute-force escalation over a single
/// formula, sharing one knowledge store across every engine it runs.
pub struct Controller {
    config: ControllerConfig,
    store: Arc<SharedStore>,
}

impl Controller {
    pub fn new(store_path: PathBuf, config: ControllerConfig) -> Self {
        let store = Arc::new(SharedStore::new(crate::store::StoreConfig { path: store_path }));
        store.load();
        Controller { config, store }
    }

    pub fn with_store(store: Arc<SharedStore>, config: ControllerConfig) -> Self {
        Controller { config, store }
    }

    pub fn store(&self) -> Arc<SharedStore> {
        self.store.clone()
    }

    /// Runs the escalation policy to completion: CDCL, then WalkSAT, then (scope
    /// permitting) brute force, stopping at the first success. Persists the store
    /// once at the end regardless of outcome; persistence errors are logged, never
    /// surfaced — a successful solve is never undone by a disk failure.
    pub fn run(&self, formula: &Formula) -> ControllerResult {
        let start = Instant::now();
        let mut winner = Winner::None;
        let mut assignment: HashMap<Variable, bool> = HashMap::new();
        let mut stats: HashMap<String, StatValue> = HashMap::new();
        let mut solved = false;

        log::info!(
            "controller starting run over {} variables, {} clauses",
            formula.num_variables(),
            formula.clauses().len()
        );

        {
            let mut cdcl = CdclEngine::new(formula, self.store.clone(), self.config.deadline);
            solved = cdcl.solve();
            stats = cdcl.stats();
            if solved {
                winner = Winner::Cdcl;
                assignment = cdcl.assignment();
            } else {
                log::info!("cdcl did not find a solution, escalating to walksat");
            }
        }

        if !solved {
            let mut walksat_config = WalkSatConfig::default();
            if let Some(max_flips) = self.config.walksat_max_flips {
                walksat_config.max_flips = max_flips;
            }
            if let Some(p) = self.config.walksat_p_random_flip {
                walksat_config.p_random_flip = p;
            }
            walksat_config.seed = self.config.walksat_seed;

            let mut walksat = WalkSatEngine::new(formula, self.store.clone(), walksat_config);
            solved = walksat.solve();
            stats = walksat.stats();
            if solved {
                winner = Winner::WalkSat;
                assignment = walksat.assignment();
                for (&var, &value) in &assignment {
                    self.store.set_assignment_hint(var, value);
                }
            } else {
                log::info!("walksat did not find a solution");
            }
        }

        if !solved && formula.num_variables() <= self.config.brute_scope_limit {
            match BruteForceEngine::new(
                formula,
                self.store.clone(),
                BruteForceConfig {
                    scope_limit: self.config.brute_scope_limit,
                },
            ) {
                Ok(mut brute) => {
                    solved = brute.solve();
                    stats = brute.stats();
                    if solved {
                        winner = Winner::Brute;
                        assignment = brute.assignment();
                    }
                }
                Err(err) => {
                    log::warn!("brute force engine could not be constructed: {}", err);
                }
            }
        }

        let runtime_sec = start.elapsed().as_secs_f64();
        let record = self.build_run_record(formula, winner, solved, runtime_sec, stats);
        if self.config.debug {
            log::debug!("run record: {:?}", record);
        }
        log::info!(
            "controller finished: solver={} status={} runtime={:.4}s",
            winner.as_str(),
            if solved { "sat" } else { "unsat" },
            runtime_sec
        );

        if let Err(err) = self.store.save() {
            log::warn!("failed to persist shared store: {}", err);
        }

        ControllerResult {
            solved,
            assignment,
            record,
        }
    }

    fn build_run_record(
        &self,
        formula: &Formula,
        winner: Winner,
        solved: bool,
        runtime_sec: f64,
        stats: HashMap<String, StatValue>,
    ) -> RunRecord {
        let variables = formula.num_variables();
        let clauses = formula.clauses().len();
        let clause_var_ratio = if variables == 0 {
            0.0
        } else {
            clauses as f64 / variables as f64
        };

        RunRecord {
            source_file: self.config.source_file.clone(),
            solver: winner.as_str().to_string(),
            status: if solved { "sat".to_string() } else { "unsat".to_string() },
            runtime_sec,
            variables,
            clauses,
            clause_var_ratio,
            assignment_found: solved,
            stats,
        }
    }
}

/// Convenience constructor mirroring the deadline-from-duration pattern used by
/// callers that want a wall-clock budget rather than an absolute `Instant`.
pub fn deadline_from_now(duration: Duration) -> Instant {
    Instant::now() + duration
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clause::Clause;
    use crate::literal::Literal;

    fn clause(lits: &[i64]) -> Clause {
        Clause::new(lits.iter().map(|&v| Literal::new(v)).collect())
    }

    fn in_memory_controller(config: ControllerConfig) -> Controller {
        let store = Arc::new(SharedStore::new(crate::store::StoreConfig::default()));
        Controller::with_store(store, config)
    }

    #[test]
    fn unit_clause_is_solved_by_cdcl() {
        let formula = Formula::new(vec![clause(&[1])]);
        let controller = in_memory_controller(ControllerConfig::default());
        let result = controller.run(&formula);
        assert!(result.solved);
        assert_eq!(result.record.solver, "cdcl");
    }

    #[test]
    fn contradiction_fails_through_every_engine() {
        let formula = Formula::new(vec![clause(&[1]), clause(&[-1])]);
        let controller = in_memory_controller(ControllerConfig {
            brute_scope_limit: 10,
            ..ControllerConfig::default()
        });
        let result = controller.run(&formula);
        assert!(!result.solved);
        assert_eq!(controller.store().get_unsat_scopes(), vec![vec![1]]);
    }

    #[test]
    fn brute_is_skipped_when_scope_limit_is_too_small() {
        let formula = Formula::new(vec![clause(&[1]), clause(&[-1])]);
        let controller = in_memory_controller(ControllerConfig {
            brute_scope_limit: 0,
            ..ControllerConfig::default()
        });
        let result = controller.run(&formula);
        assert!(!result.solved);
        assert!(controller.store().get_unsat_scopes().is_empty());
    }

    #[test]
    fn empty_formula_is_satisfied_with_no_decisions() {
        let formula = Formula::new(vec![]);
        let controller = in_memory_controller(ControllerConfig::default());
        let result = controller.run(&formula);
        assert!(result.solved);
        assert!(result.assignment.is_empty());
    }

    #[test]
    fn already_elapsed_deadline_escalates_straight_through_to_walksat() {
        // CDCL aborts immediately on an elapsed deadline, so escalation proceeds to
        // WalkSAT with whatever flip budget the config grants it.
        let formula = Formula::new(vec![clause(&[1, 2, 3]), clause(&[-1, -2, -3])]);
        let controller = in_memory_controller(ControllerConfig {
            deadline: Some(deadline_from_now(Duration::from_secs(0))),
            walksat_max_flips: Some(200),
            walksat_seed: Some(1),
            ..ControllerConfig::default()
        });
        let result = controller.run(&formula);
        assert_ne!(result.record.solver, "cdcl");
    }
}
