// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Solution Projector

use rayon::prelude::*;

/// `x[i] = (-b_sink / beta) * (eta[i] / d[i])`.
///
/// Vertices with zero degree (only the sink may have one) project to 0.
pub fn project(eta: &[f64], degrees: &[f64], b_sink: f64, beta: f64) -> Vec<f64> {
    let scale = -b_sink / beta;
    eta.par_iter()
        .zip(degrees.par_iter())
        .map(|(&e, &d)| if d > 0.0 { scale * (e / d) } else { 0.0 })
        .collect()
}

/// Subtract the mean so the entries sum to zero.
pub fn center(x: &mut [f64]) {
    if x.is_empty() {
        return;
    }
    let mean = x.iter().sum::<f64>() / x.len() as f64;
    x.par_iter_mut().for_each(|v| *v -= mean);
}
