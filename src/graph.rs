// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Graph View

//! Read-only graph access used by the solver.
//!
//! The solver only needs the vertex count, the weighted degree of each
//! vertex and its ordered neighbour list. [`WeightedGraph`] is a plain
//! adjacency-list implementation; any other storage can implement
//! [`GraphView`] directly.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// Vertex index in `[0, n)`. The last index is the sink.
pub type VertexId = usize;

/// What the solver needs from a graph.
pub trait GraphView {
    fn vertex_count(&self) -> usize;

    /// Weighted degree: sum of the outgoing edge weights of `v`.
    fn degree(&self, v: VertexId) -> f64;

    /// Ordered `(neighbour, weight)` pairs of `v`.
    fn neighbors(&self, v: VertexId) -> &[(VertexId, f64)];

    /// The distinguished absorbing vertex.
    fn sink(&self) -> VertexId {
        self.vertex_count().saturating_sub(1)
    }
}

/// Adjacency-list graph with cached weighted degrees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightedGraph {
    adjacency: Vec<Vec<(VertexId, f64)>>,
    degrees: Vec<f64>,
}

impl WeightedGraph {
    /// Build an undirected graph on `n` vertices. Each `(u, v, w)` adds
    /// `w` in both directions. An edge touching a vertex outside `[0, n)`
    /// is a configuration error.
    pub fn from_edges(n: usize, edges: &[(VertexId, VertexId, f64)]) -> Result<Self> {
        let mut adjacency = vec![Vec::new(); n];
        for &(u, v, w) in edges {
            if u >= n || v >= n {
                return Err(SolverError::config(format!(
                    "edge ({}, {}) references a vertex outside [0, {})",
                    u, v, n
                )));
            }
            adjacency[u].push((v, w));
            if u != v {
                adjacency[v].push((u, w));
            }
        }
        Ok(Self::from_adjacency(adjacency))
    }

    /// Build from a dense adjacency matrix; zero entries are not edges.
    pub fn from_dense(rows: &[Vec<f64>]) -> Self {
        let adjacency = rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, &w)| w != 0.0)
                    .map(|(j, &w)| (j, w))
                    .collect()
            })
            .collect();
        Self::from_adjacency(adjacency)
    }

    /// Build from explicit (possibly directed) neighbour lists.
    pub fn from_adjacency(adjacency: Vec<Vec<(VertexId, f64)>>) -> Self {
        let degrees = adjacency
            .iter()
            .map(|row| row.iter().map(|&(_, w)| w).sum())
            .collect();
        Self { adjacency, degrees }
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Dense Laplacian `D - A`, row-major.
    pub fn laplacian(&self) -> Vec<Vec<f64>> {
        let n = self.adjacency.len();
        let mut l = vec![vec![0.0; n]; n];
        for (i, row) in self.adjacency.iter().enumerate() {
            l[i][i] += self.degrees[i];
            for &(j, w) in row {
                l[i][j] -= w;
            }
        }
        l
    }
}

impl GraphView for WeightedGraph {
    fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    fn degree(&self, v: VertexId) -> f64 {
        self.degrees[v]
    }

    fn neighbors(&self, v: VertexId) -> &[(VertexId, f64)] {
        &self.adjacency[v]
    }
}
