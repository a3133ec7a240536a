// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Error Types

//! Error types for the solver.
//!
//! Degenerate graphs and right-hand sides are rejected with
//! [`SolverError::Configuration`] before any simulation work starts.
//! The two convergence variants are only produced on request, through
//! [`Solution::require_converged`](crate::types::Solution::require_converged);
//! a plain solve always returns its best-effort vector with a status.

/// Errors raised by graph validation, calibration and the problem reader.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("beta search reached the floor at beta={beta:.3e} without the sink ratio crossing the target (last ratio {ratio:.4})")]
    NumericInstability { beta: f64, ratio: f64 },

    #[error("calibration round at beta={beta:.3e} hit the epoch cap ({epochs} epochs) without converging")]
    ResourceExhaustion { beta: f64, epochs: usize },

    #[error("worker pool could not be built: {0}")]
    ThreadPool(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {detail}")]
    Parse { line: usize, detail: String },
}

impl SolverError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SolverError::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
