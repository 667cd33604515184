#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::assignment::Assignment;
use crate::sat::literal::{VarMap, Variable};

/// Variable-move-to-front decision order.
///
/// All variables sit on a doubly linked list, initially `1 ↔ 2 ↔ … ↔ n` with
/// the head at `n`. Every conflict moves the involved variables to the head,
/// so walking `prev` from the head visits recently active variables first.
/// Variable 0 terminates the list.
#[derive(Debug, Clone, Default)]
pub struct Vmtf {
    next: VarMap<Variable>,
    prev: VarMap<Variable>,
    head: Variable,
}

impl Vmtf {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        let mut next = VarMap::new(num_vars);
        let mut prev = VarMap::new(num_vars);
        #[allow(clippy::cast_possible_truncation)]
        let head = num_vars as Variable;
        for var in 1..=head {
            prev[var] = var - 1;
            next[var - 1] = var;
        }
        next[head] = 0;
        Self { next, prev, head }
    }

    /// The most recently bumped variable.
    #[must_use]
    pub const fn head(&self) -> Variable {
        self.head
    }

    /// The next older variable in the decision order, or 0 past the end.
    #[must_use]
    pub fn prev_of(&self, var: Variable) -> Variable {
        self.prev[var]
    }

    /// Moves `var` to the front of the list.
    pub fn bump(&mut self, var: Variable) {
        if var == self.head {
            return;
        }
        self.prev[self.next[var]] = self.prev[var];
        self.next[self.prev[var]] = self.next[var];
        self.next[self.head] = var;
        self.prev[var] = self.head;
        self.head = var;
    }

    /// Walks `prev` from `cursor` to the first unassigned variable.
    /// Returns `None` when the list is exhausted, meaning every variable is
    /// assigned and the search has found a model.
    #[must_use]
    pub fn pick_from(&self, assignment: &Assignment, mut cursor: Variable) -> Option<Variable> {
        while cursor != 0 && !assignment.is_unassigned(cursor) {
            cursor = self.prev[cursor];
        }
        (cursor != 0).then_some(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::assignment::LitState;
    use crate::sat::literal::Lit;

    #[test]
    fn test_initial_order_is_descending() {
        let vmtf = Vmtf::new(4);
        assert_eq!(vmtf.head(), 4);
        assert_eq!(vmtf.prev_of(4), 3);
        assert_eq!(vmtf.prev_of(3), 2);
        assert_eq!(vmtf.prev_of(1), 0);
    }

    #[test]
    fn test_bump_moves_to_front() {
        let mut vmtf = Vmtf::new(4);
        vmtf.bump(2);

        assert_eq!(vmtf.head(), 2);
        assert_eq!(vmtf.prev_of(2), 4);
        // The old neighbours of 2 are linked to each other.
        assert_eq!(vmtf.prev_of(3), 1);
    }

    #[test]
    fn test_bump_head_is_a_no_op() {
        let mut vmtf = Vmtf::new(3);
        vmtf.bump(3);
        assert_eq!(vmtf.head(), 3);
        assert_eq!(vmtf.prev_of(3), 2);
    }

    #[test]
    fn test_pick_skips_assigned_variables() {
        let vmtf = Vmtf::new(3);
        let mut assignment = Assignment::new(3);
        assignment.set_value(Lit::from_i32(3), LitState::False);

        assert_eq!(vmtf.pick_from(&assignment, vmtf.head()), Some(2));

        assignment.set_value(Lit::from_i32(-2), LitState::False);
        assignment.set_value(Lit::from_i32(1), LitState::False);
        assert_eq!(vmtf.pick_from(&assignment, vmtf.head()), None);
    }
}
