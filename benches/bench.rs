use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use tinysat::sat::cdcl::Cdcl;
use tinysat::sat::literal::Lit;
use tinysat::sat::solver::{Ingest, Solver};

fn lits(values: &[i32]) -> Vec<Lit> {
    values.iter().map(|&v| Lit::from_i32(v)).collect()
}

/// Pigeonhole principle with `holes + 1` pigeons: unsatisfiable, and a
/// classic stress test for clause learning.
fn pigeonhole(holes: i32) -> (usize, Vec<Vec<Lit>>) {
    let pigeons = holes + 1;
    let var = |p: i32, h: i32| (p - 1) * holes + h;
    let mut clauses = Vec::new();
    for p in 1..=pigeons {
        clauses.push(lits(&(1..=holes).map(|h| var(p, h)).collect::<Vec<_>>()));
    }
    for h in 1..=holes {
        for p in 1..=pigeons {
            for q in p + 1..=pigeons {
                clauses.push(lits(&[-var(p, h), -var(q, h)]));
            }
        }
    }
    ((pigeons * holes) as usize, clauses)
}

fn random_3sat(num_vars: i32, num_clauses: usize, seed: u64) -> (usize, Vec<Vec<Lit>>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let clauses = (0..num_clauses)
        .map(|_| {
            let mut clause: Vec<i32> = Vec::with_capacity(3);
            while clause.len() < 3 {
                let var = rng.gen_range(1..=num_vars);
                if clause.iter().any(|&l| l.abs() == var) {
                    continue;
                }
                clause.push(if rng.gen_bool(0.5) { var } else { -var });
            }
            lits(&clause)
        })
        .collect();
    (num_vars as usize, clauses)
}

fn solve(num_vars: usize, clauses: &[Vec<Lit>]) {
    let mut solver = Cdcl::new(num_vars, clauses.len());
    if solver.load(clauses.iter().map(Vec::as_slice)).unwrap() == Ingest::Accepted {
        black_box(solver.solve().unwrap());
    }
}

fn bench_pigeonhole(c: &mut Criterion) {
    let (num_vars, clauses) = pigeonhole(6);
    c.bench_function("pigeonhole 7 into 6", |b| {
        b.iter(|| solve(num_vars, &clauses));
    });
}

fn bench_random_3sat(c: &mut Criterion) {
    let mut group = c.benchmark_group("random 3sat");
    for seed in 0..3_u64 {
        let (num_vars, clauses) = random_3sat(150, 639, seed);
        group.bench_function(format!("150 vars seed {seed}"), |b| {
            b.iter(|| solve(num_vars, &clauses));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pigeonhole, bench_random_3sat);

criterion_main!(benches);
