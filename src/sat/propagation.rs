#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Unit propagation over the watched-literal lists.
//!
//! Each non-unit clause is watched through its two header words. When a
//! watched literal becomes false, the engine scans the clause for a
//! replacement watch; failing that, the clause is unit (the other watched
//! literal is asserted) or conflicting. Watch lists are repaired lazily: a
//! clause whose other watched literal is already true stays put and is
//! revisited only if that literal is ever unwound.
//!
//! Conflicts below the root level are analysed in place, so a single call
//! propagates across backjumps until the frontier is empty or a root-level
//! conflict proves the formula unsatisfiable. The engine also maintains the
//! `forced` flag: propagation that starts from root-forced assignments, or
//! that asserts a unit lemma, promotes everything it derives into the
//! permanent prefix on clean completion.

use crate::sat::assignment::{Assignment, Reason};
use crate::sat::clause_db::{ClauseDb, ClauseRef, END};
use crate::sat::conflict_analysis::Analyser;
use crate::sat::literal::Lit;
use crate::sat::restarter::GlueRestart;
use crate::sat::solver::SolverError;
use crate::sat::trail::Trail;
use crate::sat::variable_selection::Vmtf;

/// The result of running propagation to a fixpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// The frontier emptied; every conflict on the way was resolved by
    /// learning and backjumping.
    Stable,
    /// A clause was falsified with no decision left to undo. The formula
    /// is unsatisfiable.
    RootConflict,
}

/// A position in some literal's watch list: either the head-table entry or
/// a header word inside the arena.
#[derive(Debug, Clone, Copy)]
enum WatchSlot {
    Head(Lit),
    Node(usize),
}

/// The watched-literal propagation engine.
#[derive(Debug, Clone, Default)]
pub struct Propagator {
    propagations: u64,
}

impl Propagator {
    #[must_use]
    pub const fn new() -> Self {
        Self { propagations: 0 }
    }

    /// Trail literals processed so far.
    #[must_use]
    pub const fn num_propagations(&self) -> u64 {
        self.propagations
    }

    fn link(db: &ClauseDb, slot: WatchSlot) -> i32 {
        match slot {
            WatchSlot::Head(lit) => db.head(lit),
            WatchSlot::Node(offset) => db.slot(offset),
        }
    }

    fn set_link(db: &mut ClauseDb, slot: WatchSlot, link: i32) {
        match slot {
            WatchSlot::Head(lit) => db.set_head(lit, link),
            WatchSlot::Node(offset) => db.set_slot(offset, link),
        }
    }

    /// Propagates the trail frontier to a fixpoint.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::OutOfMemory` if conflict analysis cannot store
    /// a learned clause.
    pub(crate) fn propagate(
        &mut self,
        db: &mut ClauseDb,
        trail: &mut Trail,
        assignment: &mut Assignment,
        analyser: &mut Analyser,
        heuristic: &mut Vmtf,
        restarts: &mut GlueRestart,
    ) -> Result<Propagation, SolverError> {
        let mut forced = trail
            .frontier_lit()
            .is_some_and(|lit| assignment.reason(lit.variable()) != Reason::Decision);

        while let Some(lit) = trail.next_unprocessed() {
            self.propagations += 1;
            let mut slot = WatchSlot::Head(lit);
            loop {
                let link = Self::link(db, slot);
                if link == END {
                    break;
                }
                #[allow(clippy::cast_sign_loss)]
                let node = link as usize;
                let body = db.body_start(node);

                // Canonicalise so the other watched literal sits first.
                if db.slot(body) == lit.to_i32() {
                    let second = db.slot(body + 1);
                    db.set_slot(body, second);
                }

                // Look for a non-false literal to take over this watch.
                let mut moved = false;
                let mut probe = body + 2;
                while db.slot(probe) != 0 {
                    let candidate = Lit::from_i32(db.slot(probe));
                    if !assignment.is_falsified(candidate) {
                        // Swap the replacement into the watched position,
                        // keeping the clause body intact for backtracking,
                        // and splice the node onto the new list.
                        db.set_slot(body + 1, candidate.to_i32());
                        db.set_slot(probe, lit.to_i32());
                        let next = db.slot(node);
                        Self::set_link(db, slot, next);
                        db.add_watch(candidate, node);
                        moved = true;
                        break;
                    }
                    probe += 1;
                }
                if moved {
                    continue;
                }

                // No replacement: the clause is unit or conflicting.
                db.set_slot(body + 1, lit.to_i32());
                slot = WatchSlot::Node(node);
                let other = Lit::from_i32(db.slot(body));
                if assignment.is_true(other) {
                    continue;
                }
                let cref = ClauseRef::new(body);
                if !assignment.is_falsified(other) {
                    trail.assign(assignment, other, cref, forced);
                    continue;
                }

                if forced {
                    return Ok(Propagation::RootConflict);
                }
                let lemma = analyser.analyse(db, trail, assignment, heuristic, restarts, cref)?;
                if db.is_unit(lemma) {
                    forced = true;
                }
                let asserted = db.first_lit(lemma);
                trail.assign(assignment, asserted, lemma, forced);
                break;
            }
        }

        if forced {
            trail.promote_forced();
        }
        Ok(Propagation::Stable)
    }
}
