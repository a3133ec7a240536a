// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Chip Simulation

//! Chip queues and the per-tick update rule.
//!
//! Each tick, every non-sink vertex `i` first receives a chip with
//! probability `clamp(beta * J[i], 0, 1)`; then, if its queue is non-empty,
//! chips depart and are routed to sampled neighbours. The strategies differ
//! in how many chips depart per tick and how routed arrivals are merged:
//!
//! | Strategy | Departures per tick | Routing | Firing count |
//! |----------|--------------------|---------|--------------|
//! | [`SerialSimulator`] | 1 | one hop | exact |
//! | [`ParallelSimulator`] one-hop | `max(1, Q/2)` | one hop | exact |
//! | [`ParallelSimulator`] lookahead | 1 | up to K hops | union of hop sets (undercounts) |

mod parallel;
mod serial;

pub use parallel::{ParallelSimulator, Partition};
pub use serial::SerialSimulator;

use std::sync::Arc;

use rand::Rng;
use rayon::ThreadPool;

use crate::error::{Result, SolverError};
use crate::graph::VertexId;
use crate::params::{SolverParams, Strategy};
use crate::rng::RngContext;
use crate::transition::TransitionTable;

// ---------------------------------------------------------------------------
// ChipState
// ---------------------------------------------------------------------------

/// Queue length and firing count per vertex for one calibration round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipState {
    pub(crate) queue: Vec<u64>,
    pub(crate) fired: Vec<u64>,
    pub(crate) injected: u64,
}

impl ChipState {
    pub fn new(n: usize) -> Self {
        Self {
            queue: vec![0; n],
            fired: vec![0; n],
            injected: 0,
        }
    }

    pub fn queue(&self) -> &[u64] {
        &self.queue
    }

    pub fn fired(&self) -> &[u64] {
        &self.fired
    }

    /// Chips injected since the last reset.
    pub fn injected(&self) -> u64 {
        self.injected
    }

    pub fn total_queued(&self) -> u64 {
        self.queue.iter().sum()
    }

    /// Share of queued chips resting at the sink: `Q[sink] / (1 + sum Q)`.
    pub fn sink_ratio(&self) -> f64 {
        let sink = self.queue.len() - 1;
        self.queue[sink] as f64 / (1.0 + self.total_queued() as f64)
    }

    /// Average firings per tick over `ticks` ticks.
    pub fn firing_rates(&self, ticks: usize) -> Vec<f64> {
        let t = ticks.max(1) as f64;
        self.fired.iter().map(|&c| c as f64 / t).collect()
    }

    pub fn reset(&mut self) {
        self.queue.iter_mut().for_each(|q| *q = 0);
        self.fired.iter_mut().for_each(|c| *c = 0);
        self.injected = 0;
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Read-only inputs shared by every tick of an epoch.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub table: &'a TransitionTable,
    /// Per-vertex injection probability for the current beta.
    pub inject: &'a [f64],
}

impl TickInput<'_> {
    pub fn sink(&self) -> VertexId {
        self.table.sink()
    }
}

/// One execution strategy for the tick rule.
pub trait Simulator: Send {
    fn strategy(&self) -> Strategy;

    /// Advance `state` by `ticks` ticks.
    fn run(&mut self, state: &mut ChipState, input: &TickInput<'_>, ticks: usize, rngs: &mut RngContext);
}

/// Build the worker pool used by the parallel strategies.
pub fn build_pool(threads: usize) -> Result<Arc<ThreadPool>> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("chipfire-worker-{}", i))
        .build()
        .map(Arc::new)
        .map_err(|e| SolverError::ThreadPool(e.to_string()))
}

/// Instantiate the simulator selected by `params.strategy` for an
/// `n`-vertex graph. `pool` is required by the parallel strategies.
pub fn simulator_for(
    params: &SolverParams,
    n: usize,
    pool: Option<&Arc<ThreadPool>>,
) -> Result<Box<dyn Simulator>> {
    match params.strategy {
        Strategy::Serial => Ok(Box::new(SerialSimulator::new(n))),
        Strategy::OneHop | Strategy::Lookahead => {
            let pool = match pool {
                Some(p) => Arc::clone(p),
                None => build_pool(params.threads)?,
            };
            let sim = if params.strategy == Strategy::OneHop {
                ParallelSimulator::one_hop(pool, n, params.threads)
            } else {
                ParallelSimulator::lookahead(pool, n, params.threads, params.lookahead)
            };
            Ok(Box::new(sim))
        }
    }
}

/// Bernoulli injection into `q`; returns the number of chips added.
#[inline]
pub(crate) fn inject<R: Rng + ?Sized>(q: &mut u64, p: f64, rng: &mut R) -> u64 {
    if p > 0.0 && rng.gen_bool(p) {
        *q += 1;
        1
    } else {
        0
    }
}
