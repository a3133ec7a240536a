// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Transition Builder

//! Row-stochastic transition tables and per-vertex edge samplers.
//!
//! Each non-sink vertex divides its outgoing weights by its degree and
//! gets an alias-table sampler over the result. The table is built once
//! per graph and shared read-only by every simulation strategy.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, WeightedAliasIndex};
use tracing::debug;

use crate::error::{Result, SolverError};
use crate::graph::{GraphView, VertexId};

/// Allowed deviation of a row's probability mass from 1.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// EdgeSampler
// ---------------------------------------------------------------------------

/// O(1) draw of a neighbour according to a normalised distribution.
#[derive(Clone)]
pub struct EdgeSampler {
    targets: Vec<VertexId>,
    probabilities: Vec<f64>,
    alias: WeightedAliasIndex<f64>,
}

impl EdgeSampler {
    /// Build from `(neighbour, probability)` pairs.
    pub fn new(distribution: &[(VertexId, f64)]) -> Result<Self> {
        let targets: Vec<VertexId> = distribution.iter().map(|&(v, _)| v).collect();
        let probabilities: Vec<f64> = distribution.iter().map(|&(_, p)| p).collect();
        let alias = WeightedAliasIndex::new(probabilities.clone())
            .map_err(|e| SolverError::config(format!("edge sampler: {}", e)))?;
        Ok(Self { targets, probabilities, alias })
    }

    #[inline]
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> VertexId {
        self.targets[self.alias.sample(rng)]
    }

    pub fn targets(&self) -> &[VertexId] {
        &self.targets
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

impl fmt::Debug for EdgeSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeSampler")
            .field("targets", &self.targets)
            .field("probabilities", &self.probabilities)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TransitionTable
// ---------------------------------------------------------------------------

/// One sampler per non-sink vertex plus the degrees the projector needs.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    samplers: Vec<EdgeSampler>,
    degrees: Vec<f64>,
}

impl TransitionTable {
    /// Validate `graph` and build its transition samplers.
    ///
    /// Fails on fewer than two vertices, a non-sink vertex with zero
    /// degree, negative or non-finite weights, out-of-range neighbours,
    /// rows whose normalised mass is not 1 within [`ROW_SUM_TOLERANCE`] and
    /// vertices from which no positive-weight path leads to the sink.
    pub fn build<G: GraphView + ?Sized>(graph: &G) -> Result<Self> {
        let n = graph.vertex_count();
        if n < 2 {
            return Err(SolverError::config(format!(
                "graph needs at least one vertex besides the sink, got {} vertices",
                n
            )));
        }
        let sink = n - 1;

        let degrees: Vec<f64> = (0..n).map(|v| graph.degree(v)).collect();
        if let Some(v) = degrees.iter().position(|d| !d.is_finite() || *d < 0.0) {
            return Err(SolverError::config(format!(
                "vertex {} has invalid degree {}",
                v, degrees[v]
            )));
        }

        let mut samplers = Vec::with_capacity(sink);
        for v in 0..sink {
            let d = degrees[v];
            if d == 0.0 {
                return Err(SolverError::config(format!(
                    "non-sink vertex {} has zero degree",
                    v
                )));
            }
            let mut row = Vec::with_capacity(graph.neighbors(v).len());
            let mut mass = 0.0;
            for &(u, w) in graph.neighbors(v) {
                if u >= n {
                    return Err(SolverError::config(format!(
                        "vertex {} lists neighbour {} outside [0, {})",
                        v, u, n
                    )));
                }
                if !w.is_finite() || w < 0.0 {
                    return Err(SolverError::config(format!(
                        "edge {} -> {} has invalid weight {}",
                        v, u, w
                    )));
                }
                let p = w / d;
                mass += p;
                row.push((u, p));
            }
            if (mass - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(SolverError::config(format!(
                    "vertex {} degree {} does not match its edge weights (row mass {})",
                    v, d, mass
                )));
            }
            samplers.push(EdgeSampler::new(&row)?);
        }
        check_sink_reachable(graph, sink)?;

        debug!(
            target: "chipfire_lsolver::transition",
            vertices = n,
            sink,
            "transition table built",
        );
        Ok(Self { samplers, degrees })
    }

    pub fn vertex_count(&self) -> usize {
        self.degrees.len()
    }

    pub fn sink(&self) -> VertexId {
        self.degrees.len() - 1
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Sampler of a non-sink vertex.
    pub fn sampler(&self, v: VertexId) -> &EdgeSampler {
        &self.samplers[v]
    }

    /// Route one chip out of non-sink vertex `v`.
    #[inline]
    pub fn draw<R: Rng + ?Sized>(&self, v: VertexId, rng: &mut R) -> VertexId {
        self.samplers[v].draw(rng)
    }
}

/// Reverse BFS from the sink over positive-weight edges. A chip at a
/// vertex outside the reached set would circulate forever.
fn check_sink_reachable<G: GraphView + ?Sized>(graph: &G, sink: VertexId) -> Result<()> {
    let n = sink + 1;
    let mut reverse: Vec<Vec<VertexId>> = vec![Vec::new(); n];
    for v in 0..sink {
        for &(u, w) in graph.neighbors(v) {
            if w > 0.0 {
                reverse[u].push(v);
            }
        }
    }

    let mut reached = vec![false; n];
    reached[sink] = true;
    let mut queue = VecDeque::from([sink]);
    while let Some(u) = queue.pop_front() {
        for &v in &reverse[u] {
            if !reached[v] {
                reached[v] = true;
                queue.push_back(v);
            }
        }
    }

    match reached.iter().position(|r| !r) {
        Some(v) => Err(SolverError::config(format!(
            "vertex {} cannot reach the sink",
            v
        ))),
        None => Ok(()),
    }
}
