// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Solver Facade

//! Entry point tying the pipeline together:
//!
//! ```text
//! graph ──► TransitionTable ─┐
//! b ──────► InjectionRates ──┼──► Calibrator (beta search) ──► project ──► Solution
//! params ─► worker pool ─────┘
//! ```
//!
//! A [`LaplacianSolver`] owns the transition table and the worker pool, so
//! several right-hand sides can be solved against the same graph without
//! rebuilding either.

use std::sync::Arc;
use std::time::Instant;

use rayon::ThreadPool;
use tracing::info;

use crate::calibration::Calibrator;
use crate::error::Result;
use crate::graph::GraphView;
use crate::injection::InjectionRates;
use crate::params::{SolverParams, Strategy};
use crate::projection;
use crate::rng::RngContext;
use crate::simulator::{build_pool, simulator_for};
use crate::transition::TransitionTable;
use crate::types::Solution;

pub struct LaplacianSolver {
    params: SolverParams,
    table: TransitionTable,
    pool: Option<Arc<ThreadPool>>,
}

impl LaplacianSolver {
    /// Validate `params` and `graph`, build the transition table and, for
    /// the parallel strategies, the worker pool.
    pub fn new<G: GraphView + ?Sized>(graph: &G, params: SolverParams) -> Result<Self> {
        params.validate()?;
        let table = TransitionTable::build(graph)?;
        let pool = match params.strategy {
            Strategy::Serial => None,
            Strategy::OneHop | Strategy::Lookahead => Some(build_pool(params.threads)?),
        };
        Ok(Self { params, table, pool })
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Solve `Lx = b`. The returned vector has `x[sink] = 0`.
    ///
    /// A search that ends at the beta floor still yields a vector, marked
    /// [`SolveStatus::FloorReached`](crate::types::SolveStatus::FloorReached).
    pub fn solve(&self, b: &[f64]) -> Result<Solution> {
        let start = Instant::now();
        let n = self.table.vertex_count();
        let rates = InjectionRates::compute(b, n)?;
        let sim = simulator_for(&self.params, n, self.pool.as_ref())?;
        let rngs = RngContext::new(self.params.seed, self.params.threads);

        let calibration =
            Calibrator::new(&self.params, &self.table, &rates, sim, rngs).search();
        let x = projection::project(
            &calibration.eta,
            self.table.degrees(),
            rates.b_sink(),
            calibration.beta,
        );
        let elapsed = start.elapsed();

        info!(
            target: "chipfire_lsolver::solver",
            n,
            strategy = self.params.strategy.name(),
            beta = calibration.beta,
            rounds = calibration.rounds.len(),
            status = ?calibration.status,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "solve finished",
        );

        Ok(Solution {
            x,
            eta: calibration.eta,
            beta: calibration.beta,
            status: calibration.status,
            rounds: calibration.rounds,
            elapsed,
        })
    }
}

/// One-shot convenience wrapper around [`LaplacianSolver`].
pub fn solve<G: GraphView + ?Sized>(graph: &G, b: &[f64], params: SolverParams) -> Result<Solution> {
    LaplacianSolver::new(graph, params)?.solve(b)
}
