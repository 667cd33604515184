#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! First-UIP conflict analysis with recursive clause minimisation.
//!
//! When propagation falsifies a clause, the analyser resolves backwards along
//! the trail until exactly one literal of the current decision level remains,
//! the first unique implication point. The marked conflict cone is kept in
//! the literal-state array itself rather than a separate seen set: `Marked`
//! flags cone membership, and the minimisation pass caches its verdicts as
//! `Implied`/`NotImplied` in the same array. Root-forced literals carry a
//! permanent `Implied` tag, which keeps them out of every learned clause for
//! free.
//!
//! The analyser also computes the literal block distance (LBD) of the learned
//! clause, feeds it to the restart policy, picks the backjump point, unwinds
//! the trail, and stores the clause, returning its reference so propagation
//! can assert it.

use crate::sat::assignment::{Assignment, LitState, Reason};
use crate::sat::clause_db::{ClauseDb, ClauseRef};
use crate::sat::literal::Lit;
use crate::sat::restarter::GlueRestart;
use crate::sat::solver::SolverError;
use crate::sat::trail::Trail;
use crate::sat::variable_selection::Vmtf;
use smallvec::SmallVec;

/// The number of distinct decision levels in a clause, a quality measure of
/// learned clauses (lower is better).
pub type Lbd = u32;

/// A pending minimisation check: the literal under test and the arena offset
/// of the next reason-tail word to examine.
#[derive(Debug, Clone, Copy)]
struct Frame {
    lit: Lit,
    next: usize,
}

/// Encapsulates the state for conflict analysis.
///
/// The learned-clause buffer and the minimisation work stack live here so
/// their allocations are reused across conflicts.
#[derive(Debug, Clone, Default)]
pub struct Analyser {
    buffer: SmallVec<[Lit; 12]>,
    work: Vec<Frame>,
    /// Conflicts analysed, for statistics.
    pub count: u64,
}

impl Analyser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Learns a first-UIP clause from the falsified clause `conflict`,
    /// backjumps, and stores the result as a redundant clause.
    ///
    /// On return the trail is unwound to the assertion level with the
    /// propagation frontier pointing at the unwind position; the caller
    /// asserts the first literal of the returned clause there.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::OutOfMemory` if storing the learned clause
    /// exceeds the database capacity.
    pub(crate) fn analyse(
        &mut self,
        db: &mut ClauseDb,
        trail: &mut Trail,
        assignment: &mut Assignment,
        heuristic: &mut Vmtf,
        restarts: &mut GlueRestart,
        conflict: ClauseRef,
    ) -> Result<ClauseRef, SolverError> {
        self.count += 1;

        let mut word = conflict.index();
        while db.slot(word) != 0 {
            Self::bump(assignment, heuristic, Lit::from_i32(db.slot(word)));
            word += 1;
        }

        // Resolve trail entries top-down until the first UIP: the point at
        // which no other marked literal sits above the most recent decision.
        let uip = loop {
            let top = trail.len() - 1;
            let lit = trail.lit_at(top);
            match assignment.reason(lit.variable()) {
                Reason::Decision => break top,
                Reason::Clause(reason) => {
                    if assignment.value(lit) == LitState::Marked {
                        if Self::at_first_uip(trail, assignment, top) {
                            break top;
                        }
                        // Not yet unique: spread the marks over the reason
                        // tail and drop the resolved literal.
                        let mut tail = reason.index() + 1;
                        while db.slot(tail) != 0 {
                            Self::bump(assignment, heuristic, Lit::from_i32(db.slot(tail)));
                            tail += 1;
                        }
                    }
                    trail.pop_unassign(assignment);
                }
            }
        };

        // Collect the learned clause from the marked literals, top-down, so
        // the UIP lands first. Every visited entry has its tag reset to
        // plain falsity; entries above the backjump point are unassigned
        // right after.
        self.buffer.clear();
        let mut target = uip;
        let mut lbd: Lbd = 0;
        let mut kept_since_decision = false;
        let mut position = uip + 1;
        while position > trail.forced_len() {
            position -= 1;
            let lit = trail.lit_at(position);
            if assignment.value(lit) == LitState::Marked && !self.implied(db, assignment, lit) {
                self.buffer.push(lit);
                kept_since_decision = true;
            }
            if assignment.reason(lit.variable()) == Reason::Decision {
                lbd += Lbd::from(kept_since_decision);
                kept_since_decision = false;
                if self.buffer.len() == 1 {
                    target = position;
                }
            }
            assignment.set_value(lit, LitState::False);
        }
        debug_assert!(!self.buffer.is_empty(), "learned clause lost its asserting literal");

        restarts.update(lbd);

        trail.backtrack_to(assignment, target);
        trail.set_processed(target);

        db.add_clause(&self.buffer, false)
    }

    /// Whether the marked literal at `top` is the first UIP: no other marked
    /// literal lies between it and the most recent decision, and that
    /// decision is itself unmarked.
    fn at_first_uip(trail: &Trail, assignment: &Assignment, top: usize) -> bool {
        let mut check = top;
        loop {
            check -= 1;
            let lit = trail.lit_at(check);
            if assignment.reason(lit.variable()) == Reason::Decision {
                return assignment.value(lit) != LitState::Marked;
            }
            if assignment.value(lit) == LitState::Marked {
                return false;
            }
        }
    }

    /// Marks a literal as part of the conflict cone and moves its variable
    /// to the front of the decision order. Root-forced literals keep their
    /// `Implied` tag and are not bumped.
    fn bump(assignment: &mut Assignment, heuristic: &mut Vmtf, lit: Lit) {
        if assignment.value(lit) != LitState::Implied {
            assignment.set_value(lit, LitState::Marked);
            heuristic.bump(lit.variable());
        }
    }

    /// Whether `lit` is entailed false by the marked literals through the
    /// reason graph, in which case it is redundant in the learned clause.
    ///
    /// Results are cached in the literal-state array as `Implied` and
    /// `NotImplied`; decisions are never cached since they carry no reason.
    /// The recursion over reason tails runs on an explicit work stack, and a
    /// failure anywhere taints the whole path, exactly as the recursive
    /// formulation would tag every caller.
    fn implied(&mut self, db: &ClauseDb, assignment: &mut Assignment, lit: Lit) -> bool {
        match assignment.value(lit) {
            LitState::Implied => return true,
            LitState::NotImplied => return false,
            _ => {}
        }
        let Reason::Clause(reason) = assignment.reason(lit.variable()) else {
            return false;
        };
        self.work.clear();
        self.work.push(Frame {
            lit,
            next: reason.index() + 1,
        });
        while !self.work.is_empty() {
            let top = self.work.len() - 1;
            let word = db.slot(self.work[top].next);
            if word == 0 {
                // Every tail literal was covered.
                let done = self.work[top].lit;
                assignment.set_value(done, LitState::Implied);
                self.work.pop();
                continue;
            }
            self.work[top].next += 1;
            let tail_lit = Lit::from_i32(word);
            match assignment.value(tail_lit) {
                LitState::Marked | LitState::Implied => continue,
                LitState::NotImplied => {}
                _ => {
                    if let Reason::Clause(tail_reason) = assignment.reason(tail_lit.variable()) {
                        self.work.push(Frame {
                            lit: tail_lit,
                            next: tail_reason.index() + 1,
                        });
                        continue;
                    }
                    // A decision is never entailed, and is not cached.
                }
            }
            for frame in self.work.drain(..) {
                assignment.set_value(frame.lit, LitState::NotImplied);
            }
            return false;
        }
        true
    }
}
