//! Persistent, concurrency-safe knowledge shared across solver engines and across
//! runs of the same formula.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::literal::Variable;

/// Where the store persists itself. Constructing a store never touches disk;
/// callers that want the on-disk state call [`SharedStore::load`] explicitly.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("logs/shared_memory.json"),
        }
    }
}

/// The on-disk / in-memory shape of everything the store tracks. Field names match
/// the persistence schema byte for byte; `assignment_hints` is renamed on the wire
/// to the singular `assignment_hint` for compatibility with the original format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub learned_clauses: Vec<Vec<i64>>,
    #[serde(default)]
    pub failed_assignments: Vec<HashMap<Variable, bool>>,
    #[serde(default)]
    pub unsat_scopes: Vec<Vec<Variable>>,
    #[serde(default)]
    pub variable_scores: HashMap<Variable, f64>,
    #[serde(default)]
    pub flip_history: HashMap<Variable, u64>,
    #[serde(default, rename = "assignment_hint")]
    pub assignment_hints: HashMap<Variable, bool>,
}

/// Mutex-guarded shared knowledge store. Every method locks internally and releases
/// before returning; no method hands out a guard, so callers cannot deadlock by
/// re-entering the store while holding one.
pub struct SharedStore {
    config: StoreConfig,
    state: Mutex<StoreState>,
}

impl SharedStore {
    /// Builds an empty, in-memory store. Never touches disk.
    pub fn new(config: StoreConfig) -> Self {
        SharedStore {
            config,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_learned_clause(&self, clause: Vec<i64>) {
        let mut state = self.lock();
        if !state.learned_clauses.contains(&clause) {
            state.learned_clauses.push(clause);
        }
    }

    pub fn get_learned_clauses(&self) -> Vec<Vec<i64>> {
        self.lock().learned_clauses.clone()
    }

    pub fn add_failed_assignment(&self, assignment: HashMap<Variable, bool>) {
        self.lock().failed_assignments.push(assignment);
    }

    pub fn get_failed_assignments(&self) -> Vec<HashMap<Variable, bool>> {
        self.lock().failed_assignments.clone()
    }

    /// `scope` should already be sorted ascending; callers (the brute engine) own that.
    pub fn add_unsat_scope(&self, scope: Vec<Variable>) {
        let mut state = self.lock();
        if !state.unsat_scopes.contains(&scope) {
            state.unsat_scopes.push(scope);
        }
    }

    pub fn get_unsat_scopes(&self) -> Vec<Vec<Variable>> {
        self.lock().unsat_scopes.clone()
    }

    pub fn update_variable_score(&self, var: Variable, delta: f64) {
        let mut state = self.lock();
        *state.variable_scores.entry(var).or_insert(0.0) += delta;
    }

    pub fn get_variable_scores(&self) -> HashMap<Variable, f64> {
        self.lock().variable_scores.clone()
    }

    pub fn get_flip_history(&self) -> HashMap<Variable, u64> {
        self.lock().flip_history.clone()
    }

    pub fn get_assignment_hints(&self) -> HashMap<Variable, bool> {
        self.lock().assignment_hints.clone()
    }

    pub fn increment_flip_count(&self, var: Variable) {
        let mut state = self.lock();
        *state.flip_history.entry(var).or_insert(0) += 1;
    }

    pub fn set_assignment_hint(&self, var: Variable, value: bool) {
        self.lock().assignment_hints.insert(var, value);
    }

    /// Clears every field atomically.
    pub fn reset(&self) {
        *self.lock() = StoreState::default();
    }

    /// Loads state from disk, replacing the in-memory state wholesale. Absence of
    /// the file is not an error (first run). Any other I/O or decode failure
    /// degrades to an empty state with a warning rather than propagating, per the
    /// store's error policy: a corrupt or unreadable store should not prevent a
    /// solve attempt.
    pub fn load(&self) {
        let raw = match fs::read_to_string(&self.config.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
            Err(err) => {
                log::warn!(
                    "failed to read store file {}: {}; starting from empty state",
                    self.config.path.display(),
                    err
                );
                return;
            }
        };
        match serde_json::from_str::<StoreState>(&raw) {
            Ok(state) => *self.lock() = state,
            Err(err) => {
                log::warn!(
                    "failed to decode store file {}: {}; starting from empty state",
                    self.config.path.display(),
                    err
                );
            }
        }
    }

    /// Snapshots state under the lock, then writes it outside the lock via a
    /// temp-file-then-rename sequence so a concurrent reader never observes a
    /// partially written file.
    pub fn save(&self) -> Result<(), SolverError> {
        let snapshot = self.lock().clone();
        let encoded = serde_json::to_string_pretty(&snapshot).map_err(SolverError::StoreEncode)?;

        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| SolverError::StoreWrite {
                    path: self.config.path.clone(),
                    source,
                })?;
            }
        }

        let tmp_path = self.config.path.with_extension("json.tmp");
        fs::write(&tmp_path, encoded).map_err(|source| SolverError::StoreWrite {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.config.path).map_err(|source| SolverError::StoreWrite {
            path: self.config.path.clone(),
            source,
        })?;
        Ok(())
    }
}
