// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Result Types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SolverError};
use crate::projection;

// ─── Calibration rounds ──────────────────────────────────────────────────────

/// Why a calibration round stopped running epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStop {
    /// The sink ratio changed by less than the tolerance between epochs.
    Stagnated,
    /// Enough epochs ended at or above the saturation ratio.
    Saturated,
    /// The hard epoch cap was reached first.
    EpochCap,
}

/// Diagnostics for one calibration round (one beta value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    pub beta: f64,
    /// Sink ratio handed over from the previous round (0 for the first).
    pub previous_ratio: f64,
    /// Sink ratio at the end of this round.
    pub ratio: f64,
    pub epochs: usize,
    pub ticks: usize,
    pub stop: RoundStop,
}

// ─── Solve outcome ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// A round reached the target sink ratio.
    Converged,
    /// Beta fell below the floor first; `x` is a best-effort estimate.
    FloorReached,
}

/// Solution vector plus the calibration history that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub x: Vec<f64>,
    /// Firing rates of the accepted round.
    pub eta: Vec<f64>,
    /// Beta of the accepted round.
    pub beta: f64,
    pub status: SolveStatus,
    pub rounds: Vec<RoundReport>,
    pub elapsed: Duration,
}

impl Solution {
    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    pub fn last_round(&self) -> Option<&RoundReport> {
        self.rounds.last()
    }

    /// Strict view: a floor-reached search becomes an error.
    pub fn require_converged(self) -> Result<Self> {
        if self.is_converged() {
            return Ok(self);
        }
        match self.last_round() {
            Some(r) if r.stop == RoundStop::EpochCap => Err(SolverError::ResourceExhaustion {
                beta: r.beta,
                epochs: r.epochs,
            }),
            Some(r) => Err(SolverError::NumericInstability { beta: r.beta, ratio: r.ratio }),
            None => Err(SolverError::NumericInstability { beta: self.beta, ratio: 0.0 }),
        }
    }

    /// Shift `x` to zero mean. Never applied by the solver itself.
    pub fn canonicalize(&mut self) {
        projection::center(&mut self.x);
    }
}
