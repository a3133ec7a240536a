// Scenario Definitions: fixed topologies with known potentials plus seeded
// random graphs. Every scenario puts the sink at the last vertex.

use chipfire_lsolver::{Result, VertexId, WeightedGraph};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    /// Build the graph and right-hand side for one seed.
    pub build: fn(u64) -> Result<(WeightedGraph, Vec<f64>)>,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    /// Upper bound on the aligned relative error against the dense solve.
    pub max_relative_error: f64,
    pub require_converged: bool,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_relative_error: 0.15,
            require_converged: true,
        }
    }
}

// ─── Builders ───────────────────────────────────────────────────────────────

/// Unit demand at `source`, matching supply at the sink.
fn dipole(n: usize, source: VertexId) -> Vec<f64> {
    let mut b = vec![0.0; n];
    b[source] = 1.0;
    b[n - 1] = -1.0;
    b
}

fn two_node(_seed: u64) -> Result<(WeightedGraph, Vec<f64>)> {
    Ok((WeightedGraph::from_edges(2, &[(0, 1, 2.0)])?, vec![3.0, -3.0]))
}

fn path_16(_seed: u64) -> Result<(WeightedGraph, Vec<f64>)> {
    let n = 16;
    let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1, 1.0)).collect();
    Ok((WeightedGraph::from_edges(n, &edges)?, dipole(n, 0)))
}

/// Center 0, leaves 1..=12, sink is the last leaf.
fn star_12(_seed: u64) -> Result<(WeightedGraph, Vec<f64>)> {
    let n = 13;
    let edges: Vec<_> = (1..n).map(|leaf| (0, leaf, 1.0)).collect();
    Ok((WeightedGraph::from_edges(n, &edges)?, dipole(n, 1)))
}

fn grid_6x6(_seed: u64) -> Result<(WeightedGraph, Vec<f64>)> {
    let side = 6;
    let n = side * side;
    let mut edges = Vec::new();
    for r in 0..side {
        for c in 0..side {
            let v = r * side + c;
            if c + 1 < side {
                edges.push((v, v + 1, 1.0));
            }
            if r + 1 < side {
                edges.push((v, v + side, 1.0));
            }
        }
    }
    Ok((WeightedGraph::from_edges(n, &edges)?, dipole(n, 0)))
}

/// Connected random graph: a random spanning tree plus extra edges with
/// weights in [0.5, 2), and several sources spread over the vertices.
fn random_48(seed: u64) -> Result<(WeightedGraph, Vec<f64>)> {
    let n = 48;
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5eed_9a7f);
    let mut edges = Vec::new();
    for v in 1..n {
        let parent = rng.gen_range(0..v);
        edges.push((parent, v, rng.gen_range(0.5..2.0)));
    }
    for _ in 0..n {
        let (u, v) = (rng.gen_range(0..n), rng.gen_range(0..n));
        if u != v {
            edges.push((u, v, rng.gen_range(0.5..2.0)));
        }
    }
    let mut b = vec![0.0; n];
    for _ in 0..4 {
        b[rng.gen_range(0..n - 1)] += rng.gen_range(0.5..1.5);
    }
    b[n - 1] = -b.iter().sum::<f64>();
    Ok((WeightedGraph::from_edges(n, &edges)?, b))
}

// ─── Registry ───────────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "TWO_NODE",
            label: "Two-node closed form",
            category: "baseline",
            build: two_node,
            criteria: PassCriteria { max_relative_error: 0.1, ..PassCriteria::default() },
        },
        Scenario {
            name: "PATH_16",
            label: "Path, 16 vertices",
            category: "topology",
            build: path_16,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "STAR_12",
            label: "Star, 12 leaves",
            category: "topology",
            build: star_12,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "GRID_6X6",
            label: "Grid, 6x6",
            category: "topology",
            build: grid_6x6,
            criteria: PassCriteria { max_relative_error: 0.25, ..PassCriteria::default() },
        },
        Scenario {
            name: "RANDOM_48",
            label: "Random weighted, 48 vertices",
            category: "random",
            build: random_48,
            criteria: PassCriteria {
                max_relative_error: 0.3,
                require_converged: false,
            },
        },
    ]
}
