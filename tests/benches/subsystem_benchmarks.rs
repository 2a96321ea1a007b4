//! # Quantum-Chain Subsystem Benchmarks
//!
//! | Subsystem | Operation | Target |
//! |-----------|-----------|--------|
//! | qc-18 Staking | Share conversion | < 1µs |
//! | qc-18 Staking | Delegate + undelegate | < 100µs |
//! | qc-18 Staking | Epoch pass, 64 validators | < 10ms |

use criterion::{criterion_group, criterion_main, Criterion};

fn bench_staking(c: &mut Criterion) {
    qc_tests::benchmarks::qc_18_staking::register_benchmarks(c);
}

criterion_group!(benches, bench_staking);
criterion_main!(benches);
