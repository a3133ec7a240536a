// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Dense Reference Solver

//! Exact dense solve used to score the stochastic solver.
//!
//! The Laplacian is singular, so the sink row and column are removed and
//! `x[sink] = 0` is fixed, matching the gauge the stochastic solver
//! produces. Only meant for the small graphs in tests and benchmarks.

use crate::error::{Result, SolverError};

const PIVOT_EPSILON: f64 = 1e-12;

/// Solve `L x = b` on the grounded Laplacian (sink = last vertex, x = 0).
pub fn solve_grounded(laplacian: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = laplacian.len();
    if n < 2 || b.len() != n {
        return Err(SolverError::config(format!(
            "reference solve needs n >= 2 and b of length n (n={}, b={})",
            n,
            b.len()
        )));
    }
    let m = n - 1;
    let mut a: Vec<Vec<f64>> = (0..m)
        .map(|i| {
            let mut row = laplacian[i][..m].to_vec();
            row.push(b[i]);
            row
        })
        .collect();

    for col in 0..m {
        let pivot = (col..m)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return Err(SolverError::config(format!(
                "grounded laplacian is singular at column {}",
                col
            )));
        }
        a.swap(col, pivot);
        let (upper, lower) = a.split_at_mut(col + 1);
        let pivot_row = &upper[col];
        for row in lower.iter_mut() {
            let f = row[col] / pivot_row[col];
            if f == 0.0 {
                continue;
            }
            for k in col..=m {
                row[k] -= f * pivot_row[k];
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..m).rev() {
        let tail: f64 = (i + 1..m).map(|k| a[i][k] * x[k]).sum();
        x[i] = (a[i][m] - tail) / a[i][i];
    }
    Ok(x)
}

/// `||align(x) - align(x_hat)|| / ||align(x)||`, where `align` subtracts
/// the vector's minimum so constant offsets do not count as error.
pub fn relative_error(x: &[f64], x_hat: &[f64]) -> f64 {
    let shift = |v: &[f64]| -> Vec<f64> {
        let min = v.iter().copied().fold(f64::INFINITY, f64::min);
        v.iter().map(|e| e - min).collect()
    };
    let (a, b) = (shift(x), shift(x_hat));
    let diff: f64 = a.iter().zip(&b).map(|(p, q)| (p - q).powi(2)).sum::<f64>().sqrt();
    let norm: f64 = a.iter().map(|p| p * p).sum::<f64>().sqrt();
    if norm == 0.0 {
        diff
    } else {
        diff / norm
    }
}
