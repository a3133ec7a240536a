// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver

//! Stochastic solver for graph Laplacian systems `Lx = b`.
//!
//! Chips are injected at the vertices in proportion to `-b[i] / b_sink` and
//! random-walk along edge weights until they are absorbed at the sink (the
//! last vertex). Once the queues are stable, the firing rate of each vertex
//! divided by its degree is proportional to the solution.

pub mod error;
pub mod params;
pub mod graph;
pub mod transition;
pub mod injection;
pub mod rng;
pub mod hopset;
pub mod simulator;
pub mod calibration;
pub mod projection;
pub mod types;
pub mod solver;
pub mod io;
pub mod reference;

pub use error::{Result, SolverError};
pub use graph::{GraphView, VertexId, WeightedGraph};
pub use params::{SolverParams, Strategy};
pub use solver::{solve, LaplacianSolver};
pub use types::{RoundReport, RoundStop, SolveStatus, Solution};
