#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
//! The clause database: a single flat arena of 32-bit words.
//!
//! Every clause is stored as two watch-link header words, its literals in
//! DIMACS encoding, and a terminating zero. Clauses are referred to by the
//! offset of their first literal, never by pointer, so references stay valid
//! across database growth. The watch lists are singly linked lists threaded
//! through the header words: for each literal, a head table entry gives the
//! offset of the first watching clause's header word, and that word holds the
//! offset of the next, down to a negative end marker.
//!
//! Original clauses occupy a fixed prefix of the arena; learned clauses are
//! appended after it in increasing offset order, which is what allows the
//! reduction pass to discard and selectively replay them.

use crate::sat::literal::{Lit, LitMap};
use crate::sat::solver::SolverError;

/// End marker of a watch list.
pub(crate) const END: i32 = -1;

/// A stable handle for a clause: the arena offset of its first literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClauseRef(u32);

impl ClauseRef {
    pub(crate) const fn new(offset: usize) -> Self {
        Self(offset as u32)
    }

    /// The arena offset of the clause's first literal.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The arena holding all clauses and their watch linkage.
#[derive(Debug, Clone)]
pub struct ClauseDb {
    words: Vec<i32>,
    used: usize,
    fixed: usize,
    limit: usize,
    heads: LitMap<i32>,
    lemmas: usize,
    num_vars: usize,
}

impl ClauseDb {
    /// Creates an empty database for `num_vars` variables with a capacity of
    /// `limit` words. `num_clauses` is a pre-allocation hint; storage grows
    /// on demand, and the limit is the hard cap at which allocation fails.
    ///
    /// # Panics
    ///
    /// Panics if `limit` does not fit in an `i32`, since offsets are stored
    /// in 32-bit arena words.
    #[must_use]
    pub fn new(num_vars: usize, num_clauses: usize, limit: usize) -> Self {
        assert!(
            i32::try_from(limit).is_ok(),
            "database limit must fit in an i32"
        );
        // Eight words covers the header, terminator, and an average clause.
        let mut words = Vec::with_capacity((num_clauses * 8 + 16).min(limit));
        // A zero before the first clause, so the word preceding any clause
        // start is a terminator. Watch walking relies on this to tell the
        // two header words apart.
        words.push(0);
        Self {
            words,
            used: 1,
            fixed: 1,
            limit,
            heads: LitMap::new(num_vars, END),
            lemmas: 0,
            num_vars,
        }
    }

    /// Reserves `len` consecutive words and returns the offset of the first.
    fn alloc(&mut self, len: usize) -> Result<usize, SolverError> {
        if self.used + len > self.limit {
            return Err(SolverError::OutOfMemory { limit: self.limit });
        }
        let start = self.used;
        self.used += len;
        if self.words.len() < self.used {
            self.words.resize(self.used, 0);
        }
        Ok(start)
    }

    /// Stores a clause and threads it onto the watch lists of its first two
    /// literals. Clauses shorter than two literals carry no watches.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::OutOfMemory` if the arena capacity is exceeded.
    pub fn add_clause(
        &mut self,
        lits: &[Lit],
        irredundant: bool,
    ) -> Result<ClauseRef, SolverError> {
        let start = self.alloc(lits.len() + 3)?;
        if lits.len() > 1 {
            self.add_watch(lits[0], start);
            self.add_watch(lits[1], start + 1);
        }
        let body = start + 2;
        for (i, lit) in lits.iter().enumerate() {
            self.words[body + i] = lit.to_i32();
        }
        self.words[body + lits.len()] = 0;
        if irredundant {
            self.fixed = self.used;
        } else {
            self.lemmas += 1;
        }
        Ok(ClauseRef::new(body))
    }

    /// Prepends the watch node at `slot` to the watch list of `lit`.
    pub(crate) fn add_watch(&mut self, lit: Lit, slot: usize) {
        self.words[slot] = self.heads[lit];
        self.heads[lit] = slot as i32;
    }

    pub(crate) fn head(&self, lit: Lit) -> i32 {
        self.heads[lit]
    }

    pub(crate) fn set_head(&mut self, lit: Lit, link: i32) {
        self.heads[lit] = link;
    }

    #[inline]
    pub(crate) fn slot(&self, offset: usize) -> i32 {
        self.words[offset]
    }

    #[inline]
    pub(crate) fn set_slot(&mut self, offset: usize, value: i32) {
        self.words[offset] = value;
    }

    /// The offset of the first literal of the clause whose header word sits
    /// at `node`. The word before the first header is always a terminator,
    /// which is how the two header positions are told apart.
    pub(crate) fn body_start(&self, node: usize) -> usize {
        if self.words[node - 1] == 0 {
            node + 2
        } else {
            node + 1
        }
    }

    /// The first literal of a clause.
    #[must_use]
    pub fn first_lit(&self, cref: ClauseRef) -> Lit {
        Lit::from_i32(self.words[cref.index()])
    }

    /// Whether a clause has exactly one literal.
    #[must_use]
    pub fn is_unit(&self, cref: ClauseRef) -> bool {
        self.words[cref.index()] != 0 && self.words[cref.index() + 1] == 0
    }

    /// The literals of a clause, in storage order.
    pub fn literals(&self, cref: ClauseRef) -> impl Iterator<Item = Lit> + '_ {
        self.words[cref.index()..]
            .iter()
            .take_while(|&&word| word != 0)
            .map(|&word| Lit::from_i32(word))
    }

    /// Words of the arena in use.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.used
    }

    /// `true` before any clause has been stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.used <= 1
    }

    /// End of the fixed prefix holding the original clauses.
    #[must_use]
    pub const fn fixed(&self) -> usize {
        self.fixed
    }

    /// The configured capacity in words.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// The number of learned clauses currently counted.
    #[must_use]
    pub const fn num_lemmas(&self) -> usize {
        self.lemmas
    }

    pub(crate) fn reset_lemmas(&mut self) {
        self.lemmas = 0;
    }

    /// Discards the learned region. The words stay readable until they are
    /// overwritten by subsequent allocations, which is what the reduction
    /// replay depends on.
    pub(crate) fn rewind_to_fixed(&mut self) {
        self.used = self.fixed;
    }

    /// Removes every watch that points into the learned region, both at the
    /// head table and at interior header words.
    pub(crate) fn purge_learned_watches(&mut self) {
        let fixed = self.fixed as i32;
        for var in 1..=self.num_vars {
            let var = var as u32;
            for lit in [Lit::new(var, true), Lit::new(var, false)] {
                while self.heads[lit] >= fixed {
                    self.heads[lit] = self.words[self.heads[lit] as usize];
                }
                let mut slot = self.heads[lit];
                while slot != END {
                    let next = self.words[slot as usize];
                    if next >= fixed {
                        self.words[slot as usize] = self.words[next as usize];
                    } else {
                        slot = next;
                    }
                }
            }
        }
    }
}
