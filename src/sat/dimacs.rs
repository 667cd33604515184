#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF (Conjunctive Normal Form) file format.
//!
//! The DIMACS CNF format is a standard text-based format for representing
//! Boolean satisfiability problems:
//! - Comment lines start with 'c' and may appear anywhere, including between
//!   the literals of a clause.
//! - A problem line `p cnf <num_variables> <num_clauses>` precedes the
//!   clause data.
//! - Clauses are whitespace-separated signed decimal literals terminated by
//!   a '0'. A clause may span several lines.
//! - A '%' line marks end-of-data in some competition files and is
//!   tolerated.
//!
//! The parser reads tokens rather than lines so that multi-line clauses work,
//! validates literals against the declared variable count, and sanitises each
//! clause on behalf of the solver core: duplicate literals are collapsed and
//! tautological clauses are dropped. Empty clauses are kept, since they make
//! the formula unsatisfiable and the core reports that at ingestion.

use crate::sat::literal::Lit;
use crate::sat::solver::Solutions;
use itertools::Itertools;
use std::io::{self, BufRead};
use std::path::Path;
use thiserror::Error;

/// Ways a DIMACS input can be malformed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No `p cnf` line was found before the clause data.
    #[error("missing `p cnf` header")]
    MissingHeader,
    /// A `p` line did not have the shape `p cnf <vars> <clauses>`.
    #[error("malformed header line `{0}`")]
    MalformedHeader(String),
    /// A token where a literal was expected did not parse as an integer.
    #[error("malformed literal `{0}`")]
    MalformedLiteral(String),
    /// A literal's variable exceeds the declared variable count.
    #[error("literal {0} out of range for {1} variables")]
    LiteralOutOfRange(i32, usize),
    /// The input ended before the declared number of clauses was read.
    #[error("unexpected end of input after {found} of {expected} clauses")]
    UnexpectedEof {
        /// Clauses declared in the header.
        expected: usize,
        /// Clauses actually read.
        found: usize,
    },
    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A parsed CNF formula.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formula {
    /// The declared number of variables.
    pub num_vars: usize,
    /// The declared number of clauses (tautologies count, even though they
    /// are not kept).
    pub num_clauses: usize,
    /// The sanitised clauses.
    pub clauses: Vec<Vec<Lit>>,
}

impl Formula {
    /// Evaluates the formula under a model, for end-to-end verification.
    #[must_use]
    pub fn eval(&self, solutions: &Solutions) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|lit| solutions.contains(lit.to_i32())))
    }
}

/// Parses DIMACS data from a string slice.
///
/// # Errors
///
/// See [`parse_dimacs`].
pub fn parse_dimacs_text(dimacs_text: &str) -> Result<Formula, ParseError> {
    parse_dimacs(io::Cursor::new(dimacs_text))
}

/// Parses a DIMACS file from disk.
///
/// # Errors
///
/// Any [`ParseError`], including I/O failures opening or reading the file.
pub fn parse_file(path: &Path) -> Result<Formula, ParseError> {
    let file = std::fs::File::open(path)?;
    parse_dimacs(io::BufReader::new(file))
}

/// Parses DIMACS formatted data from a `BufRead` source into a [`Formula`].
///
/// Reading stops once the declared number of clauses has been seen, so
/// trailing junk such as a `%` end marker is ignored.
///
/// # Errors
///
/// Returns a [`ParseError`] for a missing or malformed header, malformed or
/// out-of-range literals, an input that ends mid-formula, or an I/O failure.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Formula, ParseError> {
    let mut lines = reader.lines();

    let (num_vars, num_clauses) = parse_header(&mut lines)?;

    let mut clauses = Vec::with_capacity(num_clauses);
    let mut pending: Vec<i32> = Vec::new();
    // Terminators seen so far; dropped tautologies still count against the
    // declared clause total.
    let mut read = 0;
    'lines: for line in &mut lines {
        let line = line?;
        let trimmed = line.trim_start();
        if trimmed.starts_with('c') {
            continue;
        }
        if trimmed.starts_with('%') {
            break;
        }
        for token in trimmed.split_whitespace() {
            let value: i32 = token
                .parse()
                .map_err(|_| ParseError::MalformedLiteral(token.to_string()))?;
            if value == 0 {
                if let Some(clause) = sanitise(&pending) {
                    clauses.push(clause);
                }
                pending.clear();
                read += 1;
                if read == num_clauses {
                    break 'lines;
                }
            } else {
                if value.unsigned_abs() as usize > num_vars {
                    return Err(ParseError::LiteralOutOfRange(value, num_vars));
                }
                pending.push(value);
            }
        }
    }

    if !pending.is_empty() || read < num_clauses {
        return Err(ParseError::UnexpectedEof {
            expected: num_clauses,
            found: read,
        });
    }

    Ok(Formula {
        num_vars,
        num_clauses,
        clauses,
    })
}

fn parse_header<I>(lines: &mut I) -> Result<(usize, usize), ParseError>
where
    I: Iterator<Item = io::Result<String>>,
{
    for line in lines {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        if trimmed.starts_with('p') {
            let parts = trimmed.split_whitespace().collect_vec();
            return match parts.as_slice() {
                ["p", "cnf", vars, clauses] => {
                    match (vars.parse::<usize>(), clauses.parse::<usize>()) {
                        (Ok(num_vars), Ok(num_clauses)) => Ok((num_vars, num_clauses)),
                        _ => Err(ParseError::MalformedHeader(trimmed.to_string())),
                    }
                }
                _ => Err(ParseError::MalformedHeader(trimmed.to_string())),
            };
        }
        // Clause data before any header.
        return Err(ParseError::MissingHeader);
    }
    Err(ParseError::MissingHeader)
}

/// Collapses duplicate literals and drops tautological clauses.
fn sanitise(pending: &[i32]) -> Option<Vec<Lit>> {
    let mut seen: Vec<i32> = Vec::with_capacity(pending.len());
    for &value in pending {
        if seen.contains(&-value) {
            return None;
        }
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    Some(seen.into_iter().map(Lit::from_i32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(values: &[i32]) -> Vec<Lit> {
        values.iter().map(|&v| Lit::from_i32(v)).collect()
    }

    #[test]
    fn test_parse_simple_dimacs() {
        let dimacs_content = "c This is a comment\n\
                              p cnf 3 2\n\
                              1 -2 0\n\
                              2 3 0\n";
        let formula = parse_dimacs_text(dimacs_content).unwrap();

        assert_eq!(formula.num_vars, 3);
        assert_eq!(formula.num_clauses, 2);
        assert_eq!(formula.clauses, vec![lits(&[1, -2]), lits(&[2, 3])]);
    }

    #[test]
    fn test_clauses_may_span_lines() {
        let dimacs_content = "p cnf 4 2\n1 2\n3 0 -2\nc interleaved comment\n4 0\n";
        let formula = parse_dimacs_text(dimacs_content).unwrap();
        assert_eq!(formula.clauses, vec![lits(&[1, 2, 3]), lits(&[-2, 4])]);
    }

    #[test]
    fn test_empty_clause_is_kept() {
        let formula = parse_dimacs_text("p cnf 1 1\n0\n").unwrap();
        assert_eq!(formula.clauses, vec![Vec::<Lit>::new()]);
    }

    #[test]
    fn test_duplicates_collapse_and_tautologies_drop() {
        let formula = parse_dimacs_text("p cnf 2 2\n1 1 2 0\n1 -1 0\n").unwrap();
        assert_eq!(formula.clauses, vec![lits(&[1, 2])]);
        assert_eq!(formula.num_clauses, 2);
    }

    #[test]
    fn test_end_marker_is_tolerated() {
        let dimacs_content = "p cnf 2 2\n1 0\n-2 0\n%\nc trailing noise";
        let formula = parse_dimacs_text(dimacs_content).unwrap();
        assert_eq!(formula.clauses.len(), 2);
    }

    #[test]
    fn test_missing_header_is_an_error() {
        assert!(matches!(
            parse_dimacs_text("1 2 0\n"),
            Err(ParseError::MissingHeader)
        ));
        assert!(matches!(
            parse_dimacs_text("c only comments\n"),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn test_malformed_header_is_an_error() {
        assert!(matches!(
            parse_dimacs_text("p cnf three 2\n"),
            Err(ParseError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_malformed_literal_is_an_error() {
        assert!(matches!(
            parse_dimacs_text("p cnf 2 1\n1 abc 0\n"),
            Err(ParseError::MalformedLiteral(_))
        ));
    }

    #[test]
    fn test_out_of_range_literal_is_an_error() {
        assert!(matches!(
            parse_dimacs_text("p cnf 2 1\n1 3 0\n"),
            Err(ParseError::LiteralOutOfRange(3, 2))
        ));
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        assert!(matches!(
            parse_dimacs_text("p cnf 2 2\n1 0\n"),
            Err(ParseError::UnexpectedEof {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            parse_dimacs_text("p cnf 2 1\n1 2\n"),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_eval_checks_every_clause() {
        let formula = parse_dimacs_text("p cnf 2 2\n1 2 0\n-1 0\n").unwrap();
        assert!(formula.eval(&Solutions::new(&[-1, 2])));
        assert!(!formula.eval(&Solutions::new(&[1, 2])));
    }
}
