#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The CDCL search loop tying the components together.

use crate::sat::assignment::Assignment;
use crate::sat::clause_db::ClauseDb;
use crate::sat::clause_management::Reducer;
use crate::sat::conflict_analysis::Analyser;
use crate::sat::literal::Lit;
use crate::sat::propagation::{Propagation, Propagator};
use crate::sat::restarter::GlueRestart;
use crate::sat::solver::{Ingest, SolutionStats, Solutions, Solver, SolverError, Verdict};
use crate::sat::trail::Trail;
use crate::sat::variable_selection::Vmtf;

/// Default clause database capacity in 32-bit words.
const DEFAULT_DB_LIMIT: usize = 1 << 30;
/// Reduction drops lemmas with at least this many phase-satisfied literals.
const REDUCE_KEEP_BOUND: u32 = 6;

/// A conflict-driven clause learning solver over a single clause arena.
#[derive(Debug, Clone)]
pub struct Cdcl {
    db: ClauseDb,
    trail: Trail,
    assignment: Assignment,
    heuristic: Vmtf,
    restarts: GlueRestart,
    reducer: Reducer,
    analyser: Analyser,
    propagator: Propagator,
    decisions: u64,
}

impl Cdcl {
    /// Creates a solver for `num_vars` variables with the default database
    /// capacity. `num_clauses` is a sizing hint, not a limit; the variable
    /// count is clamped to at least one.
    #[must_use]
    pub fn new(num_vars: usize, num_clauses: usize) -> Self {
        Self::with_limit(num_vars, num_clauses, DEFAULT_DB_LIMIT)
    }

    /// Creates a solver with an explicit database capacity in words.
    ///
    /// # Panics
    ///
    /// Panics if `limit` does not fit in an `i32` (clause references are
    /// stored in 32-bit arena words).
    #[must_use]
    pub fn with_limit(num_vars: usize, num_clauses: usize, limit: usize) -> Self {
        let num_vars = num_vars.max(1);
        Self {
            db: ClauseDb::new(num_vars, num_clauses, limit),
            trail: Trail::new(num_vars),
            assignment: Assignment::new(num_vars),
            heuristic: Vmtf::new(num_vars),
            restarts: GlueRestart::new(),
            reducer: Reducer::new(),
            analyser: Analyser::new(),
            propagator: Propagator::new(),
            decisions: 0,
        }
    }

    /// The number of variables the solver was initialised for.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.assignment.num_vars()
    }

    /// Stores one clause. Original clauses pass `irredundant = true`.
    ///
    /// An empty clause, or a unit clause whose literal is already false at
    /// the root, makes the formula unsatisfiable and returns
    /// `Ingest::Conflict`; a fresh unit is assigned on the spot as a
    /// permanent root assignment.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::OutOfMemory` if the database capacity is
    /// exceeded.
    pub fn add_clause(&mut self, lits: &[Lit], irredundant: bool) -> Result<Ingest, SolverError> {
        let cref = self.db.add_clause(lits, irredundant)?;
        match lits {
            [] => Ok(Ingest::Conflict),
            [unit] => {
                if self.assignment.is_falsified(*unit) {
                    Ok(Ingest::Conflict)
                } else {
                    if !self.assignment.is_true(*unit) {
                        self.trail.assign(&mut self.assignment, *unit, cref, true);
                    }
                    Ok(Ingest::Accepted)
                }
            }
            _ => Ok(Ingest::Accepted),
        }
    }

    /// Stores a whole formula, stopping at the first clause that makes it
    /// unsatisfiable outright.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::OutOfMemory` if the database capacity is
    /// exceeded.
    pub fn load<'a, I>(&mut self, clauses: I) -> Result<Ingest, SolverError>
    where
        I: IntoIterator<Item = &'a [Lit]>,
    {
        for clause in clauses {
            if self.add_clause(clause, true)? == Ingest::Conflict {
                return Ok(Ingest::Conflict);
            }
        }
        Ok(Ingest::Accepted)
    }
}

impl Solver for Cdcl {
    fn solve(&mut self) -> Result<Verdict, SolverError> {
        let mut cursor = self.heuristic.head();
        loop {
            let old_lemmas = self.db.num_lemmas();
            let outcome = self.propagator.propagate(
                &mut self.db,
                &mut self.trail,
                &mut self.assignment,
                &mut self.analyser,
                &mut self.heuristic,
                &mut self.restarts,
            )?;
            if outcome == Propagation::RootConflict {
                return Ok(Verdict::Unsat);
            }

            if self.db.num_lemmas() > old_lemmas {
                // The last propagation learned something, so the list head
                // moved; start the decision walk over from it.
                cursor = self.heuristic.head();
                if self.restarts.should_restart() {
                    self.restarts.on_restart();
                    self.trail.restart(&mut self.assignment);
                    if self.reducer.should_reduce(&self.db) {
                        self.reducer
                            .reduce(&mut self.db, &self.assignment, REDUCE_KEEP_BOUND)?;
                    }
                }
            }

            let Some(var) = self.heuristic.pick_from(&self.assignment, cursor) else {
                return Ok(Verdict::Sat);
            };
            cursor = var;
            let decision = Lit::new(var, self.assignment.saved_phase(var));
            self.trail.decide(&mut self.assignment, decision);
            self.decisions += 1;
        }
    }

    fn solutions(&self) -> Solutions {
        self.assignment.solutions()
    }

    fn stats(&self) -> SolutionStats {
        SolutionStats {
            conflicts: self.analyser.count,
            decisions: self.decisions,
            propagations: self.propagator.num_propagations(),
            restarts: self.restarts.num_restarts(),
            lemmas: self.db.num_lemmas(),
            max_lemmas: self.reducer.max_lemmas(),
            mem_used: self.db.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(values: &[i32]) -> Vec<Lit> {
        values.iter().map(|&v| Lit::from_i32(v)).collect()
    }

    fn solver(num_vars: usize, clauses: &[&[i32]]) -> (Cdcl, Ingest) {
        let mut cdcl = Cdcl::new(num_vars, clauses.len());
        let owned: Vec<Vec<Lit>> = clauses.iter().map(|c| lits(c)).collect();
        let ingest = cdcl.load(owned.iter().map(Vec::as_slice)).unwrap();
        (cdcl, ingest)
    }

    fn satisfies(clauses: &[&[i32]], solutions: &Solutions) -> bool {
        clauses
            .iter()
            .all(|clause| clause.iter().any(|&lit| solutions.contains(lit)))
    }

    /// Checks the verdict against brute-force enumeration over all `2^n`
    /// assignments.
    fn exhaustive_sat(num_vars: usize, clauses: &[&[i32]]) -> bool {
        (0..1_u32 << num_vars).any(|bits| {
            clauses.iter().all(|clause| {
                clause.iter().any(|&lit| {
                    let var = lit.unsigned_abs() as usize;
                    let value = bits >> (var - 1) & 1 == 1;
                    value == (lit > 0)
                })
            })
        })
    }

    fn solve(num_vars: usize, clauses: &[&[i32]]) -> Verdict {
        let (mut cdcl, ingest) = solver(num_vars, clauses);
        if ingest == Ingest::Conflict {
            return Verdict::Unsat;
        }
        let verdict = cdcl.solve().unwrap();
        if verdict == Verdict::Sat {
            assert!(
                satisfies(clauses, &cdcl.solutions()),
                "reported model does not satisfy the formula"
            );
        }
        verdict
    }

    #[test]
    fn test_empty_formula_is_sat() {
        assert_eq!(solve(1, &[]), Verdict::Sat);
    }

    #[test]
    fn test_empty_clause_is_unsat_at_ingest() {
        let (_, ingest) = solver(1, &[&[]]);
        assert_eq!(ingest, Ingest::Conflict);
    }

    #[test]
    fn test_single_unit_is_sat() {
        let (mut cdcl, ingest) = solver(1, &[&[1]]);
        assert_eq!(ingest, Ingest::Accepted);
        assert_eq!(cdcl.solve().unwrap(), Verdict::Sat);
        assert!(cdcl.solutions().contains(1));
    }

    #[test]
    fn test_contradictory_units_conflict_at_ingest() {
        let (_, ingest) = solver(1, &[&[1], &[-1]]);
        assert_eq!(ingest, Ingest::Conflict);
    }

    #[test]
    fn test_duplicate_unit_is_accepted() {
        let (mut cdcl, ingest) = solver(1, &[&[1], &[1]]);
        assert_eq!(ingest, Ingest::Accepted);
        assert_eq!(cdcl.solve().unwrap(), Verdict::Sat);
    }

    #[test]
    fn test_small_sat_instance() {
        assert_eq!(solve(3, &[&[1, 2, 3], &[-1, 2], &[-2, 3]]), Verdict::Sat);
    }

    #[test]
    fn test_implication_chain_forces_all_true() {
        let (mut cdcl, _) = solver(4, &[&[-1, 2], &[-2, 3], &[-3, 4], &[1]]);
        assert_eq!(cdcl.solve().unwrap(), Verdict::Sat);
        let solutions = cdcl.solutions();
        for var in 1..=4 {
            assert!(solutions.contains(var), "variable {var} should be true");
        }
    }

    #[test]
    fn test_unit_cascade_has_unique_model() {
        let clauses: &[&[i32]] = &[
            &[1, 2, 3],
            &[1, 2, -3],
            &[1, -2, 3],
            &[1, -2, -3],
            &[-1, 2, 3],
            &[-1, 2, -3],
            &[-1, -2, 3],
        ];
        let (mut cdcl, _) = solver(3, clauses);
        assert_eq!(cdcl.solve().unwrap(), Verdict::Sat);
        let solutions = cdcl.solutions();
        assert!(solutions.contains(1));
        assert!(solutions.contains(2));
        assert!(solutions.contains(3));
    }

    #[test]
    fn test_pigeonhole_two_pigeons_one_hole() {
        assert_eq!(solve(2, &[&[1], &[2], &[-1, -2]]), Verdict::Unsat);
    }

    #[test]
    fn test_pigeonhole_three_pigeons_two_holes() {
        // Pigeon p in hole h is variable (p - 1) * 2 + h.
        let clauses: &[&[i32]] = &[
            &[1, 2],
            &[3, 4],
            &[5, 6],
            &[-1, -3],
            &[-1, -5],
            &[-3, -5],
            &[-2, -4],
            &[-2, -6],
            &[-4, -6],
        ];
        assert_eq!(solve(6, clauses), Verdict::Unsat);
    }

    #[test]
    fn test_tautological_clause_changes_nothing() {
        let base: &[&[i32]] = &[&[1, 2], &[-1, 2], &[-2, 1]];
        let with_taut: &[&[i32]] = &[&[1, 2], &[-1, 2], &[-2, 1], &[3, -3, 1]];
        assert_eq!(solve(2, base), Verdict::Sat);
        assert_eq!(solve(3, with_taut), Verdict::Sat);
    }

    #[test]
    fn test_clause_order_does_not_change_the_verdict() {
        let clauses: Vec<Vec<i32>> = vec![
            vec![1, 2, 3],
            vec![-1, -2],
            vec![-2, -3],
            vec![-1, -3],
            vec![2, 3],
        ];
        let forward: Vec<&[i32]> = clauses.iter().map(Vec::as_slice).collect();
        let reversed: Vec<&[i32]> = clauses.iter().rev().map(Vec::as_slice).collect();
        assert_eq!(solve(3, &forward), solve(3, &reversed));
    }

    #[test]
    fn test_verdicts_match_exhaustive_enumeration() {
        let instances: &[(usize, &[&[i32]])] = &[
            (3, &[&[1, 2, 3], &[-1, 2], &[-2, 3]]),
            (3, &[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]),
            (4, &[&[1, 2], &[-2, 3], &[-3, -1], &[4, 1], &[-4, 3]]),
            (2, &[&[1], &[2], &[-1, -2]]),
            (3, &[&[-1, -2, -3], &[1], &[2], &[3]]),
        ];
        for &(num_vars, clauses) in instances {
            let expected = if exhaustive_sat(num_vars, clauses) {
                Verdict::Sat
            } else {
                Verdict::Unsat
            };
            assert_eq!(solve(num_vars, clauses), expected, "on {clauses:?}");
        }
    }

    #[test]
    fn test_out_of_memory_surfaces_as_an_error() {
        let mut cdcl = Cdcl::with_limit(2, 1, 8);
        assert!(cdcl.add_clause(&lits(&[1, 2]), true).is_ok());
        assert_eq!(
            cdcl.add_clause(&lits(&[-1, -2]), true),
            Err(SolverError::OutOfMemory { limit: 8 })
        );
    }

    #[test]
    fn test_stats_count_the_search() {
        let (mut cdcl, _) = solver(3, &[&[-1, 2], &[-1, 3], &[-2, -3], &[1, 2]]);
        let verdict = cdcl.solve().unwrap();
        let stats = cdcl.stats();
        assert_eq!(verdict, Verdict::Sat);
        assert!(stats.decisions > 0);
        assert!(stats.propagations > 0);
        assert!(stats.mem_used > 0);
        assert_eq!(stats.max_lemmas, 2000);
    }

    #[test]
    fn test_random_3sat_terminates_and_answers_consistently() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        // 100 variables at the hard ratio of 4.26. The verdict is whatever
        // it is; the property under test is termination with a sound model
        // on the SAT side.
        let num_vars = 100;
        let num_clauses = 426;
        let mut rng = StdRng::seed_from_u64(0xdecaf);
        let clauses: Vec<Vec<i32>> = (0..num_clauses)
            .map(|_| {
                let mut clause = Vec::with_capacity(3);
                while clause.len() < 3 {
                    let var = rng.gen_range(1..=num_vars as i32);
                    if clause.iter().any(|&l: &i32| l.abs() == var) {
                        continue;
                    }
                    let polarity = rng.gen_bool(0.5);
                    clause.push(if polarity { var } else { -var });
                }
                clause
            })
            .collect();

        let borrowed: Vec<&[i32]> = clauses.iter().map(Vec::as_slice).collect();
        let (mut cdcl, ingest) = solver(num_vars, &borrowed);
        assert_eq!(ingest, Ingest::Accepted);
        if cdcl.solve().unwrap() == Verdict::Sat {
            assert!(satisfies(&borrowed, &cdcl.solutions()));
        }
    }
}
