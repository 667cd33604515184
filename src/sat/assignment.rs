#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Truth state, reasons, and the phase cache.
//!
//! The solver tracks falsity per literal rather than truth per variable: a
//! literal is assigned false when its entry is any non-`Unassigned` state, and
//! a literal is true exactly when its negation is false. The extra states
//! beyond plain falsity are tags the conflict analysis stores in place:
//! `Marked` flags a literal of the conflict cone, and `Implied`/`NotImplied`
//! memoise the self-subsumption check. `Implied` doubles as the permanent tag
//! of literals falsified at the root level, which is what exempts them from
//! marking and drops them from learned clauses.

use crate::sat::clause_db::ClauseRef;
use crate::sat::literal::{Lit, LitMap, VarMap, Variable};
use crate::sat::solver::Solutions;

/// The per-literal truth state, doubling as the conflict-analysis tag store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub enum LitState {
    /// The literal's variable has no value.
    #[default]
    Unassigned,
    /// The literal is false.
    False,
    /// False, and marked as part of the conflict cone under analysis.
    Marked,
    /// False, with a cached negative self-subsumption result.
    NotImplied,
    /// False and entailed by the marked literals; also the permanent state
    /// of literals falsified at the root level.
    Implied,
}

impl LitState {
    /// Whether the literal is assigned false, under any tag.
    #[must_use]
    pub const fn is_falsified(self) -> bool {
        !matches!(self, Self::Unassigned)
    }

    /// Whether a self-subsumption result has been cached.
    #[must_use]
    pub const fn is_cached(self) -> bool {
        matches!(self, Self::NotImplied | Self::Implied)
    }
}

/// Why a variable holds its value. `Decision` also covers unassigned
/// variables, mirroring the invariant that only propagated variables have a
/// reason clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reason {
    /// Chosen by the decision heuristic, or not assigned at all.
    #[default]
    Decision,
    /// Forced by unit propagation of the referenced clause.
    Clause(ClauseRef),
}

/// The assignment state: literal values, reasons, and the saved phases.
#[derive(Debug, Clone)]
pub struct Assignment {
    values: LitMap<LitState>,
    reasons: VarMap<Reason>,
    saved: VarMap<bool>,
    num_vars: usize,
}

impl Assignment {
    /// Creates an all-unassigned state for `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            values: LitMap::new(num_vars, LitState::Unassigned),
            reasons: VarMap::new(num_vars),
            saved: VarMap::new(num_vars),
            num_vars,
        }
    }

    /// The number of variables managed.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// The state of a literal.
    #[must_use]
    pub fn value(&self, lit: Lit) -> LitState {
        self.values[lit]
    }

    pub(crate) fn set_value(&mut self, lit: Lit, state: LitState) {
        self.values[lit] = state;
    }

    /// Whether the literal is assigned false.
    #[must_use]
    pub fn is_falsified(&self, lit: Lit) -> bool {
        self.values[lit].is_falsified()
    }

    /// Whether the literal is assigned true, i.e. its negation is false.
    #[must_use]
    pub fn is_true(&self, lit: Lit) -> bool {
        self.values[lit.negated()].is_falsified()
    }

    /// Whether the variable has no value in either polarity.
    #[must_use]
    pub fn is_unassigned(&self, var: Variable) -> bool {
        !self.values[Lit::new(var, true)].is_falsified()
            && !self.values[Lit::new(var, false)].is_falsified()
    }

    /// The reason recorded for a variable.
    #[must_use]
    pub fn reason(&self, var: Variable) -> Reason {
        self.reasons[var]
    }

    pub(crate) fn set_reason(&mut self, var: Variable, reason: Reason) {
        self.reasons[var] = reason;
    }

    /// The phase last given to the variable by propagation.
    #[must_use]
    pub fn saved_phase(&self, var: Variable) -> bool {
        self.saved[var]
    }

    pub(crate) fn save_phase(&mut self, var: Variable, phase: bool) {
        self.saved[var] = phase;
    }

    /// The current assignment as a set of true DIMACS literals.
    #[must_use]
    pub fn solutions(&self) -> Solutions {
        let mut solutions = Solutions::default();
        for var in 1..=self.num_vars {
            #[allow(clippy::cast_possible_truncation)]
            let var = var as Variable;
            let positive = Lit::new(var, true);
            if self.is_true(positive) {
                solutions.insert(positive.to_i32());
            } else if self.is_falsified(positive) {
                solutions.insert(positive.negated().to_i32());
            }
        }
        solutions
    }
}
