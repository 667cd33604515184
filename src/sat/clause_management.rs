use crate::sat::assignment::Assignment;
use crate::sat::clause_db::ClauseDb;
use crate::sat::literal::Lit;
use crate::sat::solver::SolverError;
use smallvec::SmallVec;

/// Headroom added to the lemma cap whenever it is hit.
const LEMMA_CAP_STEP: usize = 300;
/// Initial cap on the number of learned clauses.
const INITIAL_LEMMA_CAP: usize = 2000;

/// Learned-clause database reduction.
///
/// Learned clauses sit in increasing offset order after the fixed prefix, so
/// reduction can unhook every learned watch, rewind the arena, and replay the
/// old region selectively. A lemma survives when fewer than `keep_below` of
/// its literals agree with the saved phases, the idea being that lemmas the
/// cached assignment already satisfies comfortably are unlikely to prune
/// anything soon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reducer {
    max_lemmas: usize,
}

impl Reducer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_lemmas: INITIAL_LEMMA_CAP,
        }
    }

    /// The current cap on the learned-clause count.
    #[must_use]
    pub const fn max_lemmas(&self) -> usize {
        self.max_lemmas
    }

    /// Whether the database holds more lemmas than the cap allows.
    #[must_use]
    pub const fn should_reduce(&self, db: &ClauseDb) -> bool {
        db.num_lemmas() > self.max_lemmas
    }

    /// Rebuilds the learned region, dropping lemmas with at least
    /// `keep_below` literals satisfied by the saved phases.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::OutOfMemory` if a replayed clause cannot be
    /// stored, which cannot happen in practice since the replay never grows
    /// the region it reclaims.
    pub fn reduce(
        &mut self,
        db: &mut ClauseDb,
        assignment: &Assignment,
        keep_below: u32,
    ) -> Result<(), SolverError> {
        while db.num_lemmas() > self.max_lemmas {
            self.max_lemmas += LEMMA_CAP_STEP;
        }
        db.reset_lemmas();
        db.purge_learned_watches();

        let end = db.len();
        db.rewind_to_fixed();

        // Walk the old region clause by clause. Re-added lemmas are written
        // at or before the clause they replace, so the read position never
        // trails the write position.
        let mut scratch: SmallVec<[Lit; 12]> = SmallVec::new();
        let mut offset = db.fixed() + 2;
        while offset < end {
            scratch.clear();
            let mut satisfied = 0;
            loop {
                let word = db.slot(offset);
                if word == 0 {
                    break;
                }
                let lit = Lit::from_i32(word);
                if lit.polarity() == assignment.saved_phase(lit.variable()) {
                    satisfied += 1;
                }
                scratch.push(lit);
                offset += 1;
            }
            if satisfied < keep_below {
                db.add_clause(&scratch, false)?;
            }
            // Skip the terminator and the next clause's header words.
            offset += 3;
        }
        Ok(())
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new()
    }
}
