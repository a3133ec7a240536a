// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Calibration Parameters

//! Tunable constants of the calibration engine.
//!
//! Defaults reproduce the reference behaviour: 16 workers, 2000-tick
//! epochs, beta starting at 0.1 and halving down to a 1e-4 floor, and a
//! sink-ratio target of 0.85.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// Widest hop set supported by the lookahead strategy.
pub const MAX_LOOKAHEAD: usize = 64;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Execution strategy for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Single thread, vertices in index order, one departure per tick.
    Serial,
    /// Worker pool, up to `max(1, Q/2)` departures per tick, each chip
    /// forwarded a single hop.
    OneHop,
    /// Worker pool, one departure per tick, each chip walked up to
    /// `lookahead` hops within the tick. Visits are combined with a
    /// bitwise OR across workers and therefore undercount.
    Lookahead,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Serial, Strategy::OneHop, Strategy::Lookahead];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::OneHop => "one_hop",
            Self::Lookahead => "lookahead",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Some(Self::Serial),
            "one_hop" | "one-hop" | "v1" => Some(Self::OneHop),
            "lookahead" | "v2" => Some(Self::Lookahead),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SolverParams
// ---------------------------------------------------------------------------

/// Every constant the beta search and the calibration rounds consult.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Worker count for the parallel strategies.
    pub threads: usize,
    pub strategy: Strategy,
    /// Ticks per epoch.
    pub epoch_length: usize,
    /// Epochs run before the sink ratio is trusted.
    pub min_epochs: usize,
    /// Hard cap on epochs within one calibration round.
    pub max_epochs: usize,
    /// Beta before the first halving.
    pub initial_beta: f64,
    /// The search gives up once beta drops below this value.
    pub beta_floor: f64,
    /// Sink ratio accepted as the target regime.
    pub target_ratio: f64,
    /// Sink ratio that ends the warm-up phase.
    pub warmup_ratio: f64,
    /// Sink ratio counted towards the saturation stop.
    pub saturation_ratio: f64,
    /// Saturated epochs needed to end a round.
    pub saturation_epochs: usize,
    /// Change in sink ratio between epochs treated as stagnation.
    pub stagnation_tolerance: f64,
    /// Stagnation only ends a round while beta is above this value.
    pub stagnation_min_beta: f64,
    /// Hops walked per departure by the lookahead strategy.
    pub lookahead: usize,
    /// Base seed for the per-worker random streams.
    pub seed: u64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            threads: 16,
            strategy: Strategy::OneHop,
            epoch_length: 2000,
            min_epochs: 3,
            max_epochs: 100,
            initial_beta: 0.1,
            beta_floor: 1e-4,
            target_ratio: 0.85,
            warmup_ratio: 0.8,
            saturation_ratio: 0.9,
            saturation_epochs: 3,
            stagnation_tolerance: 1e-3,
            stagnation_min_beta: 1e-3,
            lookahead: MAX_LOOKAHEAD,
            seed: 0,
        }
    }
}

impl SolverParams {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_epoch_length(mut self, ticks: usize) -> Self {
        self.epoch_length = ticks;
        self
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| SolverError::config(format!("invalid params json: {}", e)))?;
        params.validate()?;
        Ok(params)
    }

    /// Largest number of outer search iterations these parameters allow.
    pub fn max_search_rounds(&self) -> usize {
        if !(self.beta_floor > 0.0 && self.initial_beta.is_finite()) {
            return usize::MAX;
        }
        let mut beta = self.initial_beta;
        let mut rounds = 0;
        loop {
            beta /= 2.0;
            rounds += 1;
            if beta < self.beta_floor {
                return rounds;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(out_of_range("threads", self.threads, ">= 1"));
        }
        if self.epoch_length == 0 {
            return Err(out_of_range("epoch_length", self.epoch_length, ">= 1"));
        }
        if self.min_epochs == 0 {
            return Err(out_of_range("min_epochs", self.min_epochs, ">= 1"));
        }
        if self.max_epochs < self.min_epochs {
            return Err(out_of_range("max_epochs", self.max_epochs, ">= min_epochs"));
        }
        if !(self.initial_beta > 0.0 && self.initial_beta.is_finite()) {
            return Err(out_of_range("initial_beta", self.initial_beta, "finite and > 0"));
        }
        if !(self.beta_floor > 0.0 && self.beta_floor < self.initial_beta) {
            return Err(out_of_range("beta_floor", self.beta_floor, "(0, initial_beta)"));
        }
        for (name, v) in [
            ("target_ratio", self.target_ratio),
            ("warmup_ratio", self.warmup_ratio),
            ("saturation_ratio", self.saturation_ratio),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(out_of_range(name, v, "(0, 1]"));
            }
        }
        if self.saturation_epochs == 0 {
            return Err(out_of_range("saturation_epochs", self.saturation_epochs, ">= 1"));
        }
        if !(self.stagnation_tolerance >= 0.0) {
            return Err(out_of_range("stagnation_tolerance", self.stagnation_tolerance, ">= 0"));
        }
        if !(self.stagnation_min_beta >= 0.0) {
            return Err(out_of_range("stagnation_min_beta", self.stagnation_min_beta, ">= 0"));
        }
        if self.lookahead == 0 || self.lookahead > MAX_LOOKAHEAD {
            return Err(out_of_range("lookahead", self.lookahead, "1..=64"));
        }
        Ok(())
    }
}

fn out_of_range(name: &'static str, value: impl ToString, expected: &'static str) -> SolverError {
    SolverError::InvalidParameter {
        name,
        value: value.to_string(),
        expected,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
