#![warn(missing_docs)]
//! This crate provides a minimal conflict-driven clause learning (CDCL) solver
//! for the Boolean satisfiability problem.
//!
//! Formulas are given in conjunctive normal form, either programmatically or
//! through the DIMACS CNF parser, and the solver reports satisfiability
//! together with a model when one exists.

/// The `sat` module implements the SAT solver core, which determines the
/// satisfiability of Boolean formulas in conjunctive normal form.
pub mod sat;
