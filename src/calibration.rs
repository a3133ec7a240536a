// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Critical Beta Search

//! Calibration of the injection scale beta.
//!
//! The outer search halves beta until a calibration round ends with the
//! sink holding at least `target_ratio` of all queued chips, or until beta
//! drops below `beta_floor`. It is one-sided: only the floor bounds it, so
//! it runs at most [`SolverParams::max_search_rounds`] rounds.
//!
//! A round runs fixed-length epochs in two phases:
//!
//! - **Warm-up.** At least `min_epochs`, continuing until the sink ratio
//!   reaches `warmup_ratio`.
//! - **Main.** Stops on stagnation (ratio change below
//!   `stagnation_tolerance`, only while beta > `stagnation_min_beta`) or
//!   after `saturation_epochs` epochs at or above `saturation_ratio`.
//!
//! `max_epochs` bounds both phases together. Firing rates are averaged over
//! every epoch the round ran; queues and counters are then cleared.

use tracing::{debug, info, warn};

use crate::injection::InjectionRates;
use crate::params::SolverParams;
use crate::rng::RngContext;
use crate::simulator::{ChipState, Simulator, TickInput};
use crate::transition::TransitionTable;
use crate::types::{RoundReport, RoundStop, SolveStatus};

/// Result of the beta search before projection.
#[derive(Debug, Clone)]
pub struct Calibration {
    pub beta: f64,
    pub eta: Vec<f64>,
    pub status: SolveStatus,
    pub rounds: Vec<RoundReport>,
}

/// Drives one simulator through the beta search for one right-hand side.
pub struct Calibrator<'a> {
    params: &'a SolverParams,
    table: &'a TransitionTable,
    rates: &'a InjectionRates,
    sim: Box<dyn Simulator>,
    state: ChipState,
    rngs: RngContext,
}

impl<'a> Calibrator<'a> {
    pub fn new(
        params: &'a SolverParams,
        table: &'a TransitionTable,
        rates: &'a InjectionRates,
        sim: Box<dyn Simulator>,
        rngs: RngContext,
    ) -> Self {
        Self {
            params,
            table,
            rates,
            sim,
            state: ChipState::new(table.vertex_count()),
            rngs,
        }
    }

    /// Halve beta until a round reaches the target ratio or beta falls
    /// below the floor.
    pub fn search(&mut self) -> Calibration {
        let p = self.params;
        let mut beta = p.initial_beta;
        let mut ratio = 0.0;
        let mut rounds = Vec::new();

        let (status, eta) = loop {
            beta /= 2.0;
            let (report, eta) = self.estimate_eta(beta, ratio);
            ratio = report.ratio;
            rounds.push(report);

            if ratio >= p.target_ratio {
                break (SolveStatus::Converged, eta);
            }
            if beta < p.beta_floor {
                warn!(
                    target: "chipfire_lsolver::calibration",
                    beta,
                    ratio,
                    target_ratio = p.target_ratio,
                    "beta floor reached before the sink ratio hit the target",
                );
                break (SolveStatus::FloorReached, eta);
            }
        };

        info!(
            target: "chipfire_lsolver::calibration",
            beta,
            ratio,
            rounds = rounds.len(),
            ?status,
            "beta search finished",
        );
        Calibration { beta, eta, status, rounds }
    }

    /// Run one calibration round at `beta` and return its report and the
    /// firing rate of every vertex.
    pub fn estimate_eta(&mut self, beta: f64, previous_ratio: f64) -> (RoundReport, Vec<f64>) {
        let p = self.params;
        let inject = self.rates.probabilities(beta);
        let input = TickInput { table: self.table, inject: &inject };

        let mut epochs = 0;
        let mut ratio = 0.0;

        while epochs < p.max_epochs && (epochs < p.min_epochs || ratio < p.warmup_ratio) {
            ratio = self.run_epoch(&input);
            epochs += 1;
            debug!(target: "chipfire_lsolver::calibration", beta, epoch = epochs, ratio, "warm-up epoch");
        }

        let mut saturated = 0;
        let stop = loop {
            if saturated >= p.saturation_epochs {
                break RoundStop::Saturated;
            }
            if epochs >= p.max_epochs {
                break RoundStop::EpochCap;
            }
            let old = ratio;
            ratio = self.run_epoch(&input);
            epochs += 1;
            debug!(target: "chipfire_lsolver::calibration", beta, epoch = epochs, ratio, "epoch");

            if beta > p.stagnation_min_beta && (old - ratio).abs() < p.stagnation_tolerance {
                break RoundStop::Stagnated;
            }
            if ratio >= p.saturation_ratio {
                saturated += 1;
            }
        };

        if stop == RoundStop::EpochCap {
            warn!(
                target: "chipfire_lsolver::calibration",
                beta,
                epochs,
                ratio,
                "calibration round hit the epoch cap",
            );
        }

        let ticks = epochs * p.epoch_length;
        let eta = self.state.firing_rates(ticks);
        self.state.reset();

        info!(
            target: "chipfire_lsolver::calibration",
            beta,
            previous_ratio,
            ratio,
            epochs,
            ?stop,
            "calibration round finished",
        );
        let report = RoundReport { beta, previous_ratio, ratio, epochs, ticks, stop };
        (report, eta)
    }

    fn run_epoch(&mut self, input: &TickInput<'_>) -> f64 {
        self.sim
            .run(&mut self.state, input, self.params.epoch_length, &mut self.rngs);
        self.state.sink_ratio()
    }
}
