//! Defines the command-line interface for the solver binary.
//!
//! Uses `clap` for parsing arguments. The driver parses the input, feeds the
//! clauses to the core, runs the search, and prints the verdict in the
//! conventional `s SATISFIABLE` / `s UNSATISFIABLE` form, optionally followed
//! by `v` model lines and a `c` statistics line. The exit code is zero for
//! both verdicts; parse failures and memory exhaustion exit nonzero.

use clap::{Args, CommandFactory, Parser, Subcommand};
use itertools::Itertools;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tinysat::sat::cdcl::Cdcl;
use tinysat::sat::dimacs::{parse_dimacs_text, parse_file, Formula};
use tinysat::sat::solver::{Ingest, Solver, SolverError, Verdict};

/// Command-line interface of the solver.
#[derive(Parser, Debug)]
#[command(name = "tinysat", version, about = "A minimal CDCL SAT solver")]
pub(crate) struct Cli {
    /// Path to a DIMACS .cnf file, when no subcommand is given.
    pub path: Option<PathBuf>,

    /// The subcommand to execute.
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

/// The available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula provided as plain text.
    Text {
        /// DIMACS input as a string, e.g. "p cnf 2 1\n1 -2 0".
        #[arg(short, long)]
        input: String,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared across subcommands.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct CommonOptions {
    /// Skip re-evaluating the formula under the reported model.
    #[arg(long, default_value_t = false)]
    pub(crate) no_verify: bool,

    /// Skip the statistics line.
    #[arg(long, default_value_t = false)]
    pub(crate) no_stats: bool,

    /// Print the satisfying assignment as `v` lines when satisfiable.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Clause database capacity in 32-bit words.
    #[arg(long)]
    pub(crate) memory_limit: Option<usize>,
}

/// Parses the command line and runs the requested action.
pub(crate) fn run() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "tinysat", &mut io::stdout());
            ExitCode::SUCCESS
        }
        Some(Commands::File { path, common }) => solve_path(&path, &common),
        Some(Commands::Text { input, common }) => match parse_dimacs_text(&input) {
            Ok(formula) => solve_formula(&formula, &common),
            Err(error) => parse_failure(&error),
        },
        None => cli.path.map_or_else(
            || {
                eprintln!("c no input; pass a DIMACS file or see --help");
                ExitCode::FAILURE
            },
            |path| solve_path(&path, &cli.common),
        ),
    }
}

fn solve_path(path: &Path, common: &CommonOptions) -> ExitCode {
    match parse_file(path) {
        Ok(formula) => solve_formula(&formula, common),
        Err(error) => parse_failure(&error),
    }
}

fn parse_failure(error: &tinysat::sat::dimacs::ParseError) -> ExitCode {
    eprintln!("c parse error: {error}");
    ExitCode::FAILURE
}

fn fatal(error: &SolverError) -> ExitCode {
    eprintln!("c fatal: {error}");
    ExitCode::FAILURE
}

fn solve_formula(formula: &Formula, common: &CommonOptions) -> ExitCode {
    let mut solver = common.memory_limit.map_or_else(
        || Cdcl::new(formula.num_vars, formula.clauses.len()),
        |limit| Cdcl::with_limit(formula.num_vars, formula.clauses.len(), limit),
    );

    let verdict = match solver.load(formula.clauses.iter().map(Vec::as_slice)) {
        Err(error) => return fatal(&error),
        Ok(Ingest::Conflict) => Verdict::Unsat,
        Ok(Ingest::Accepted) => match solver.solve() {
            Err(error) => return fatal(&error),
            Ok(verdict) => verdict,
        },
    };

    match verdict {
        Verdict::Sat => {
            println!("s SATISFIABLE");
            let solutions = solver.solutions();
            if !common.no_verify && !formula.eval(&solutions) {
                eprintln!("c model verification failed");
                return ExitCode::FAILURE;
            }
            if common.print_solution {
                println!("v {} 0", solutions.iter().join(" "));
            }
        }
        Verdict::Unsat => println!("s UNSATISFIABLE"),
    }

    if !common.no_stats {
        let stats = solver.stats();
        println!(
            "c conflicts: {} decisions: {} propagations: {} restarts: {} lemmas: {} max_lemmas: {} mem: {}",
            stats.conflicts,
            stats.decisions,
            stats.propagations,
            stats.restarts,
            stats.lemmas,
            stats.max_lemmas,
            stats.mem_used,
        );
    }
    ExitCode::SUCCESS
}
