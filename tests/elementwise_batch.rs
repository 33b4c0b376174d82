//! Integration tests for the lazy elementwise engine
//!
//! Every parallel result is compared bit for bit against a serial reference
//! that walks target coordinates and applies each op's scalar semantics.

mod common;

use common::{seeded_values, threads};
use ftensor::error::Error;
use ftensor::lazy::ElementwiseBatch;
use ftensor::ops::{BinaryOp, ElementwiseOp, UnaryOp};
use ftensor::tensor::{Storage, broadcast_all};
use std::sync::Arc;

fn coords_of(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut coords = vec![0; shape.len()];
    for d in (0..shape.len()).rev() {
        coords[d] = flat % shape[d];
        flat /= shape[d];
    }
    coords
}

fn reference<T: ftensor::dtype::Element>(
    core: &Storage<T>,
    ops: &[(Arc<Storage<T>>, ElementwiseOp<T>)],
) -> (Vec<usize>, Vec<T>) {
    let target = broadcast_all(core.shape(), ops.iter().map(|(s, _)| s.shape())).unwrap();
    let n: usize = target.iter().product();
    let out = (0..n)
        .map(|flat| {
            let c = coords_of(flat, &target);
            let mut v = core.get(&c).unwrap();
            for (operand, op) in ops {
                v = op.apply(v, operand.get(&c).unwrap());
            }
            v
        })
        .collect();
    (target.to_vec(), out)
}

fn mixed_ops(seed: u64) -> Vec<(Arc<Storage<f64>>, ElementwiseOp<f64>)> {
    let row = Storage::from_slice(&seeded_values(37, seed), &[37]).unwrap();
    let col = Storage::from_slice(&seeded_values(40, seed + 1), &[40, 1]).unwrap();
    let full = Storage::from_slice(&seeded_values(40 * 37, seed + 2), &[40, 37]).unwrap();
    vec![
        (Arc::new(row.clone()), BinaryOp::Add.into()),
        (Arc::new(col), BinaryOp::Mul.into()),
        (Arc::new(Storage::scalar(0.5)), UnaryOp::Sin.into()),
        (Arc::new(full), BinaryOp::Sub.into()),
        (Arc::new(Storage::scalar(3.0)), BinaryOp::Div.into()),
        (Arc::new(row), ElementwiseOp::custom(|a: f64, b: f64| a.max(b) * 2.0)),
        (Arc::new(Storage::scalar(2.0)), BinaryOp::Pow.into()),
        (Arc::new(Storage::scalar(0.0)), UnaryOp::Sqrt.into()),
    ]
}

#[test]
fn test_add_then_mul_with_scalar_operands() {
    let mut core = Storage::from_slice(&[1.0f32, 2.0, 3.0], &[3]).unwrap();
    let mut batch = ElementwiseBatch::new();
    batch.enqueue(Arc::new(Storage::scalar(1.0)), BinaryOp::Add);
    batch.enqueue(Arc::new(Storage::scalar(2.0)), BinaryOp::Mul);
    batch.execute(&mut core).unwrap();
    assert_eq!(core.data(), &[4.0, 6.0, 8.0]);
}

#[test]
fn test_any_worker_count_matches_serial_reference() {
    let core = Storage::from_slice(&seeded_values(37, 99), &[1, 37]).unwrap();
    let ops = mixed_ops(7);
    let (shape, expected) = reference(&core, &ops);
    assert_eq!(shape, vec![40, 37]);

    for n in 1..=64 {
        let mut batch = ElementwiseBatch::with_parallelism(&threads(n, 16)).unwrap();
        for (operand, op) in &ops {
            batch.enqueue(Arc::clone(operand), op.clone());
        }
        let mut got = core.clone();
        batch.execute(&mut got).unwrap();
        assert_eq!(got.shape(), &[40, 37]);
        for (i, (g, e)) in got.data().iter().zip(&expected).enumerate() {
            assert!(
                g.to_bits() == e.to_bits() || (g.is_nan() && e.is_nan()),
                "{} threads, element {}: {} vs {}",
                n,
                i,
                g,
                e
            );
        }
    }
}

#[test]
fn test_simd_lengths_match_reference_f32() {
    // Long enough for the vector kernels, odd length for the scalar tail
    let len = 4099;
    let base: Vec<f32> = seeded_values(len, 3).iter().map(|&v| v as f32).collect();
    let other: Vec<f32> = seeded_values(len, 4).iter().map(|&v| v as f32 + 2.0).collect();
    let core = Storage::from_slice(&base, &[len]).unwrap();
    let operand = Arc::new(Storage::from_slice(&other, &[len]).unwrap());

    for op in [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div, BinaryOp::Pow] {
        let ops = vec![(Arc::clone(&operand), ElementwiseOp::from(op))];
        let (_, expected) = reference(&core, &ops);
        for n in [1, 3, 8] {
            let mut batch = ElementwiseBatch::with_parallelism(&threads(n, 64)).unwrap();
            batch.enqueue(Arc::clone(&operand), op);
            let mut got = core.clone();
            batch.execute(&mut got).unwrap();
            for (g, e) in got.data().iter().zip(&expected) {
                assert_eq!(g.to_bits(), e.to_bits(), "{:?} with {} threads", op, n);
            }
        }
    }
}

#[test]
fn test_integer_dtypes() {
    let mut core = Storage::from_slice(&[1i64, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
    let mut batch = ElementwiseBatch::with_parallelism(&threads(4, 1)).unwrap();
    batch.enqueue(Arc::new(Storage::from_slice(&[10, 20, 30], &[3]).unwrap()), BinaryOp::Add);
    batch.enqueue(Arc::new(Storage::from_slice(&[2, 3], &[2, 1]).unwrap()), BinaryOp::Mul);
    batch.execute(&mut core).unwrap();
    assert_eq!(core.data(), &[22, 44, 66, 42, 75, 108]);

    let mut bytes = Storage::from_slice(&[1u8, 4, 9, 16], &[4]).unwrap();
    let mut batch = ElementwiseBatch::new();
    batch.enqueue(Arc::new(Storage::scalar(0u8)), UnaryOp::Sqrt);
    batch.execute(&mut bytes).unwrap();
    assert_eq!(bytes.data(), &[1, 2, 3, 4]);
}

#[test]
fn test_integer_division_by_zero_completes() {
    let mut core = Storage::from_slice(&[10i32, 20, 30, 40], &[4]).unwrap();
    let mut batch = ElementwiseBatch::with_parallelism(&threads(1, 1)).unwrap();
    batch.enqueue(Arc::new(Storage::scalar(1)), BinaryOp::Add);
    batch.enqueue(Arc::new(Storage::from_slice(&[1, 2, 0, 4], &[4]).unwrap()), BinaryOp::Div);
    batch.execute(&mut core).unwrap();
    assert_eq!(core.data(), &[11, 10, 0, 10]);
    assert!(batch.is_empty());

    let mut bytes = Storage::from_slice(&[250u8, 0], &[2]).unwrap();
    let mut batch = ElementwiseBatch::with_parallelism(&threads(2, 1)).unwrap();
    batch.enqueue(Arc::new(Storage::scalar(10u8)), BinaryOp::Add);
    batch.enqueue(Arc::new(Storage::scalar(3u8)), BinaryOp::Sub);
    batch.execute(&mut bytes).unwrap();
    assert_eq!(bytes.data(), &[1, 7]);
}

#[test]
fn test_panicking_custom_op_restores_core() {
    let mut core = Storage::from_slice(&[1i32, 2], &[2, 1]).unwrap();
    let before = core.clone();
    let mut batch = ElementwiseBatch::with_parallelism(&threads(4, 1)).unwrap();
    batch.enqueue(Arc::new(Storage::from_slice(&[1, 2, 3], &[3]).unwrap()), BinaryOp::Add);
    batch.enqueue(
        Arc::new(Storage::scalar(0)),
        ElementwiseOp::<i32>::custom(|a, _| if a == 5 { panic!("bad element") } else { a }),
    );

    assert!(matches!(batch.execute(&mut core), Err(Error::Internal(_))));
    assert_eq!(core, before);
    assert_eq!(batch.len(), 2);
}

#[test]
fn test_empty_queue_leaves_core_untouched() {
    let mut core = Storage::from_slice(&[1.5f64, -2.0], &[2, 1]).unwrap();
    let before = core.clone();
    ElementwiseBatch::<f64>::new().execute(&mut core).unwrap();
    assert_eq!(core, before);
}

#[test]
fn test_zero_sized_target() {
    let mut core = Storage::<f32>::zeros(&[0, 3]);
    let mut batch = ElementwiseBatch::new();
    batch.enqueue(Arc::new(Storage::from_slice(&[1.0, 2.0, 3.0], &[3]).unwrap()), BinaryOp::Add);
    batch.execute(&mut core).unwrap();
    assert_eq!(core.shape(), &[0, 3]);
    assert!(core.is_empty());
    assert!(batch.is_empty());
}

#[test]
fn test_broadcast_failure_is_atomic() {
    let mut core = Storage::from_slice(&[1.0f64; 6], &[2, 3]).unwrap();
    let before = core.clone();
    let mut batch = ElementwiseBatch::new();
    batch.enqueue(Arc::new(Storage::from_slice(&[1.0; 4], &[4, 1, 1]).unwrap()), BinaryOp::Add);
    batch.enqueue(Arc::new(Storage::from_slice(&[1.0; 2], &[2]).unwrap()), BinaryOp::Add);

    match batch.execute(&mut core) {
        Err(Error::BroadcastError { lhs, rhs, .. }) => {
            assert_eq!(lhs, vec![4, 2, 3]);
            assert_eq!(rhs, vec![2]);
        }
        other => panic!("expected broadcast error, got {:?}", other),
    }
    assert_eq!(core, before);
    assert_eq!(batch.len(), 2);
}

#[test]
fn test_operand_snapshot_is_independent() {
    let mut operand = Storage::from_slice(&[1.0f64, 1.0], &[2]).unwrap();
    let snapshot = Arc::new(operand.clone());
    let mut batch = ElementwiseBatch::new();
    batch.enqueue(Arc::clone(&snapshot), BinaryOp::Add);
    operand.data_mut()[0] = 100.0;

    let mut core = Storage::from_slice(&[1.0, 2.0], &[2]).unwrap();
    batch.execute(&mut core).unwrap();
    assert_eq!(core.data(), &[2.0, 3.0]);
}
