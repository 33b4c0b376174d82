//! Elementwise and reduction batch benchmarks
//!
//! Usage:
//!   cargo bench --bench elementwise
//!
//!   # Compare against a saved baseline:
//!   cargo bench --bench elementwise -- --baseline target/fluxbench/baseline.json

use fluxbench::{Bencher, flux};
use std::hint::black_box;
use std::sync::Arc;

use ftensor::prelude::*;
use ftensor::runtime::cpu::ThreadPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rand_f32(shape: &[usize]) -> Storage<f32> {
    Tensor::<f32>::random_seeded(-1.0, 1.0, shape, 42)
        .unwrap()
        .storage()
        .clone()
}

fn fused_batch(threads: usize, operand: &Arc<Storage<f32>>) -> ElementwiseBatch<f32> {
    let config = ParallelismConfig::new(Some(threads), None);
    let mut batch = ElementwiseBatch::with_parallelism(&config).unwrap();
    batch.enqueue(Arc::clone(operand), BinaryOp::Add);
    batch.enqueue(Arc::clone(operand), BinaryOp::Mul);
    batch.enqueue(Arc::clone(operand), BinaryOp::Sub);
    batch
}

fn run_fused(b: &mut Bencher, threads: usize) {
    let core = rand_f32(&[1024, 1024]);
    let operand = Arc::new(rand_f32(&[1024, 1024]));
    let template = fused_batch(threads, &operand);
    b.iter(|| {
        let mut core = core.clone();
        let mut batch = template.clone();
        batch.execute(&mut core).unwrap();
        black_box(core)
    });
}

// ---------------------------------------------------------------------------
// Fused elementwise batches across thread counts
// ---------------------------------------------------------------------------

#[flux::bench(id = "fused_1m_t1", group = "elementwise", severity = "warning", threshold = 10.0)]
fn fused_1m_t1(b: &mut Bencher) {
    run_fused(b, 1);
}

#[flux::bench(id = "fused_1m_t4", group = "elementwise", severity = "warning", threshold = 10.0)]
fn fused_1m_t4(b: &mut Bencher) {
    run_fused(b, 4);
}

#[flux::bench(id = "fused_1m_t8", group = "elementwise", severity = "warning", threshold = 10.0)]
fn fused_1m_t8(b: &mut Bencher) {
    run_fused(b, 8);
}

#[flux::bench(id = "broadcast_row_1m", group = "elementwise", severity = "warning", threshold = 10.0)]
fn broadcast_row_1m(b: &mut Bencher) {
    let core = rand_f32(&[1024, 1024]);
    let row = Arc::new(rand_f32(&[1024]));
    b.iter(|| {
        let mut core = core.clone();
        let mut batch = ElementwiseBatch::new();
        batch.enqueue(Arc::clone(&row), BinaryOp::Add);
        batch.enqueue(Arc::clone(&row), UnaryOp::Sqrt);
        batch.execute(&mut core).unwrap();
        black_box(core)
    });
}

// ---------------------------------------------------------------------------
// Reduction batches
// ---------------------------------------------------------------------------

#[flux::bench(id = "reduce_stats_1m", group = "reduce", severity = "warning", threshold = 10.0)]
fn reduce_stats_1m(b: &mut Bencher) {
    let storage = Arc::new(rand_f32(&[1_000_000]));
    let pool = Arc::new(ThreadPool::new(4).unwrap());
    b.iter(|| {
        let mut batch = ReductionBatch::new(Arc::clone(&pool));
        for r in [Reduction::Sum, Reduction::Max, Reduction::Min, Reduction::ArgMax] {
            batch.enqueue_builtin(r);
        }
        black_box(batch.execute(&storage).unwrap())
    });
}

#[flux::bench(id = "reduce_sum_1m", group = "reduce", severity = "critical", threshold = 5.0)]
fn reduce_sum_1m(b: &mut Bencher) {
    let t = Tensor::from_storage(rand_f32(&[1_000_000]));
    b.iter(|| black_box(t.sum().unwrap()));
}

fn main() {
    if let Err(e) = fluxbench::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
