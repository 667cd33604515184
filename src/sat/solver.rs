use itertools::Itertools;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// The answer produced by a completed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The formula has a satisfying assignment.
    Sat,
    /// No assignment satisfies the formula.
    Unsat,
}

/// The outcome of feeding one or more clauses to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The clause was stored without contradiction.
    Accepted,
    /// The clause is empty or a unit contradicting the root state; the
    /// formula is unsatisfiable and no search is needed.
    Conflict,
}

/// Fatal solver failures. Unsatisfiability is a verdict, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The clause database hit its configured capacity. All solver state
    /// lives in that arena, so there is no partial recovery.
    #[error("clause database capacity of {limit} words exhausted")]
    OutOfMemory {
        /// The configured arena capacity in 32-bit words.
        limit: usize,
    },
}

/// A satisfying assignment as a set of true DIMACS literals, one per
/// assigned variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solutions(FxHashSet<i32>);

impl Solutions {
    /// Builds a solution set from DIMACS literals.
    #[must_use]
    pub fn new(lits: &[i32]) -> Self {
        Self(lits.iter().copied().collect())
    }

    pub(crate) fn insert(&mut self, lit: i32) {
        self.0.insert(lit);
    }

    /// Whether the given DIMACS literal is true under this assignment.
    #[must_use]
    pub fn contains(&self, lit: i32) -> bool {
        self.0.contains(&lit)
    }

    /// The number of assigned variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no variable is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The assigned literals in order of variable index.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied().sorted_by_key(|lit| lit.abs())
    }
}

/// Search statistics reported after `solve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    /// Conflicts analysed.
    pub conflicts: u64,
    /// Decisions taken.
    pub decisions: u64,
    /// Trail literals propagated.
    pub propagations: u64,
    /// Restarts performed.
    pub restarts: u64,
    /// Learned clauses currently in the database.
    pub lemmas: usize,
    /// Current cap on the learned clause count.
    pub max_lemmas: usize,
    /// Words of the clause database in use.
    pub mem_used: usize,
}

/// The interface a complete solver presents to a driver.
pub trait Solver {
    /// Runs the search to completion.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::OutOfMemory` if the clause database fills up.
    fn solve(&mut self) -> Result<Verdict, SolverError>;

    /// The model found by the last successful `solve`.
    fn solutions(&self) -> Solutions;

    /// Statistics accumulated so far.
    fn stats(&self) -> SolutionStats;
}
