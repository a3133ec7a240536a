// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Parallel Strategies

//! Owner-computes parallel tick.
//!
//! The vertex range is cut into contiguous blocks, one per worker. A tick
//! is a two-stage pipeline:
//!
//! 1. **Scatter.** Worker `w` updates the queues of its own block and
//!    writes every routed chip into its private outbox, which holds one
//!    segment per destination block.
//! 2. **Gather.** Worker `w` sums segment `w` of every outbox into the
//!    queues of its own block and zeroes those segments.
//!
//! Between the stages the outboxes are regrouped from producer-major to
//! owner-major order by moving the segment vectors, so in both stages each
//! worker holds exclusive `&mut` access to everything it writes. The join
//! at the end of each rayon pass is the barrier; ticks run strictly in
//! sequence.

use std::ops::Range;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::graph::VertexId;
use crate::hopset::HopSet;
use crate::params::Strategy;
use crate::rng::RngContext;

use super::{inject, ChipState, Simulator, TickInput};

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Static block partition of `[0, n)` over the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    n: usize,
    block: usize,
    blocks: usize,
}

impl Partition {
    pub fn new(n: usize, workers: usize) -> Self {
        let block = n.div_ceil(workers.max(1)).max(1);
        Self { n, block, blocks: n.div_ceil(block) }
    }

    pub fn blocks(&self) -> usize {
        self.blocks
    }

    pub fn block_len(&self) -> usize {
        self.block
    }

    pub fn range(&self, w: usize) -> Range<usize> {
        let start = w * self.block;
        start..(start + self.block).min(self.n)
    }

    /// Owning block of `v` and the offset of `v` inside it.
    #[inline]
    pub fn locate(&self, v: VertexId) -> (usize, usize) {
        (v / self.block, v % self.block)
    }
}

// ---------------------------------------------------------------------------
// Mailboxes
// ---------------------------------------------------------------------------

/// `grid[producer][owner][offset]` in producer-major layout.
#[derive(Debug, Clone)]
struct Mailboxes<T> {
    grid: Vec<Vec<Vec<T>>>,
}

impl<T: Copy + Default> Mailboxes<T> {
    fn new(part: &Partition) -> Self {
        let grid = (0..part.blocks())
            .map(|_| (0..part.blocks()).map(|o| vec![T::default(); part.range(o).len()]).collect())
            .collect();
        Self { grid }
    }

    fn empty() -> Self {
        Self { grid: Vec::new() }
    }

    /// Move out in owner-major layout: `[owner][producer][offset]`.
    fn take_by_owner(&mut self) -> Vec<Vec<Vec<T>>> {
        transpose(std::mem::take(&mut self.grid))
    }

    fn restore_from_owner(&mut self, by_owner: Vec<Vec<Vec<T>>>) {
        self.grid = transpose(by_owner);
    }
}

fn transpose<T>(grid: Vec<Vec<T>>) -> Vec<Vec<T>> {
    let cols = grid.first().map_or(0, Vec::len);
    let mut out: Vec<Vec<T>> = (0..cols).map(|_| Vec::with_capacity(grid.len())).collect();
    for row in grid {
        for (c, cell) in row.into_iter().enumerate() {
            out[c].push(cell);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// ParallelSimulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Routing {
    /// Up to `max(1, Q/2)` chips per vertex, each forwarded one hop.
    OneHop,
    /// One chip per vertex, walked up to `depth` hops.
    Lookahead { depth: usize },
}

/// Thread-parallel strategies sharing the scatter/gather pipeline.
pub struct ParallelSimulator {
    pool: Arc<ThreadPool>,
    part: Partition,
    routing: Routing,
    arrivals: Mailboxes<u64>,
    visits: Mailboxes<HopSet>,
}

impl ParallelSimulator {
    pub fn one_hop(pool: Arc<ThreadPool>, n: usize, workers: usize) -> Self {
        let part = Partition::new(n, workers);
        Self {
            pool,
            part,
            routing: Routing::OneHop,
            arrivals: Mailboxes::new(&part),
            visits: Mailboxes::empty(),
        }
    }

    pub fn lookahead(pool: Arc<ThreadPool>, n: usize, workers: usize, depth: usize) -> Self {
        let part = Partition::new(n, workers);
        Self {
            pool,
            part,
            routing: Routing::Lookahead { depth: depth.clamp(1, HopSet::WIDTH) },
            arrivals: Mailboxes::new(&part),
            visits: Mailboxes::new(&part),
        }
    }

    pub fn partition(&self) -> &Partition {
        &self.part
    }

    fn tick(&mut self, state: &mut ChipState, input: &TickInput<'_>, rngs: &mut RngContext) {
        match self.routing {
            Routing::OneHop => {
                self.scatter_one_hop(state, input, rngs);
                self.gather_arrivals(state);
            }
            Routing::Lookahead { depth } => {
                self.scatter_lookahead(state, input, rngs, depth);
                self.gather_arrivals_and_visits(state);
            }
        }
    }

    fn scatter_one_hop(&mut self, state: &mut ChipState, input: &TickInput<'_>, rngs: &mut RngContext) {
        let part = self.part;
        let sink = input.sink();
        let ChipState { queue, fired, injected } = state;

        let added: u64 = queue
            .par_chunks_mut(part.block_len())
            .zip(fired.par_chunks_mut(part.block_len()))
            .zip(self.arrivals.grid.par_iter_mut())
            .zip(rngs.streams_mut().par_iter_mut())
            .enumerate()
            .map(|(w, (((queue, fired), outbox), rng))| {
                let base = part.range(w).start;
                let mut added = 0;
                for (k, (q, c)) in queue.iter_mut().zip(fired.iter_mut()).enumerate() {
                    let v = base + k;
                    if v == sink {
                        continue;
                    }
                    added += inject(q, input.inject[v], rng);
                    let mut cap = (*q / 2).max(1);
                    while *q > 0 && cap > 0 {
                        *q -= 1;
                        *c += 1;
                        cap -= 1;
                        let (o, off) = part.locate(input.table.draw(v, rng));
                        outbox[o][off] += 1;
                    }
                }
                added
            })
            .sum();
        *injected += added;
    }

    fn scatter_lookahead(
        &mut self,
        state: &mut ChipState,
        input: &TickInput<'_>,
        rngs: &mut RngContext,
        depth: usize,
    ) {
        let part = self.part;
        let sink = input.sink();
        let ChipState { queue, injected, .. } = state;

        let added: u64 = queue
            .par_chunks_mut(part.block_len())
            .zip(self.arrivals.grid.par_iter_mut())
            .zip(self.visits.grid.par_iter_mut())
            .zip(rngs.streams_mut().par_iter_mut())
            .enumerate()
            .map(|(w, (((queue, outbox), visits), rng))| {
                let base = part.range(w).start;
                let mut added = 0;
                for (k, q) in queue.iter_mut().enumerate() {
                    let v = base + k;
                    if v == sink {
                        continue;
                    }
                    added += inject(q, input.inject[v], rng);
                    if *q == 0 {
                        continue;
                    }
                    *q -= 1;
                    let mut at = v;
                    let mut hop = 0;
                    while hop < depth && at != sink {
                        let (o, off) = part.locate(at);
                        visits[o][off].insert(hop);
                        at = input.table.draw(at, rng);
                        hop += 1;
                    }
                    let (o, off) = part.locate(at);
                    outbox[o][off] += 1;
                }
                added
            })
            .sum();
        *injected += added;
    }

    fn gather_arrivals(&mut self, state: &mut ChipState) {
        let mut inbox = self.arrivals.take_by_owner();
        state
            .queue
            .par_chunks_mut(self.part.block_len())
            .zip(inbox.par_iter_mut())
            .for_each(|(queue, segments)| {
                for (k, q) in queue.iter_mut().enumerate() {
                    *q += segments
                        .iter_mut()
                        .map(|seg| std::mem::take(&mut seg[k]))
                        .sum::<u64>();
                }
            });
        self.arrivals.restore_from_owner(inbox);
    }

    fn gather_arrivals_and_visits(&mut self, state: &mut ChipState) {
        let mut inbox = self.arrivals.take_by_owner();
        let mut seen = self.visits.take_by_owner();
        let block = self.part.block_len();
        let ChipState { queue, fired, .. } = state;

        queue
            .par_chunks_mut(block)
            .zip(fired.par_chunks_mut(block))
            .zip(inbox.par_iter_mut())
            .zip(seen.par_iter_mut())
            .for_each(|(((queue, fired), arrivals), visits)| {
                for (k, (q, c)) in queue.iter_mut().zip(fired.iter_mut()).enumerate() {
                    *q += arrivals
                        .iter_mut()
                        .map(|seg| std::mem::take(&mut seg[k]))
                        .sum::<u64>();
                    let mut hops = HopSet::empty();
                    for seg in visits.iter_mut() {
                        hops.union_with(seg[k].take());
                    }
                    *c += u64::from(hops.len());
                }
            });

        self.arrivals.restore_from_owner(inbox);
        self.visits.restore_from_owner(seen);
    }
}

impl Simulator for ParallelSimulator {
    fn strategy(&self) -> Strategy {
        match self.routing {
            Routing::OneHop => Strategy::OneHop,
            Routing::Lookahead { .. } => Strategy::Lookahead,
        }
    }

    fn run(&mut self, state: &mut ChipState, input: &TickInput<'_>, ticks: usize, rngs: &mut RngContext) {
        debug_assert!(rngs.workers() >= self.part.blocks());
        let pool = Arc::clone(&self.pool);
        pool.install(|| {
            for _ in 0..ticks {
                self.tick(state, input, rngs);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::build_pool;
    use crate::simulator::test_support::path_fixture;

    #[test]
    fn partition_covers_every_vertex_once() {
        for (n, workers) in [(1, 4), (4, 2), (10, 3), (17, 16), (5, 16)] {
            let p = Partition::new(n, workers);
            assert!(p.blocks() <= workers);
            let mut seen = vec![0; n];
            for w in 0..p.blocks() {
                for v in p.range(w) {
                    seen[v] += 1;
                    assert_eq!(p.locate(v), (w, v - p.range(w).start));
                }
            }
            assert!(seen.iter().all(|&c| c == 1), "n={} workers={}", n, workers);
        }
    }

    #[test]
    fn transpose_swaps_axes() {
        let g = vec![vec![1, 2, 3], vec![4, 5, 6]];
        assert_eq!(transpose(g), vec![vec![1, 4], vec![2, 5], vec![3, 6]]);
    }

    fn run_strategy(sim: &mut ParallelSimulator, beta: f64, seed: u64, ticks: usize) -> ChipState {
        let (table, rates) = path_fixture();
        let inject = rates.probabilities(beta);
        let input = TickInput { table: &table, inject: &inject };
        let mut state = ChipState::new(4);
        let mut rngs = RngContext::new(seed, 2);
        for _ in 0..ticks {
            sim.run(&mut state, &input, 1, &mut rngs);
            assert_eq!(state.total_queued(), state.injected(), "chips leaked");
        }
        state
    }

    #[test]
    fn one_hop_conserves_chips() {
        let pool = build_pool(2).expect("test: pool");
        let mut sim = ParallelSimulator::one_hop(pool, 4, 2);
        let state = run_strategy(&mut sim, 0.4, 1, 300);
        assert!(state.injected() > 0);
        assert_eq!(state.fired()[3], 0);
    }

    #[test]
    fn lookahead_conserves_chips() {
        let pool = build_pool(2).expect("test: pool");
        let mut sim = ParallelSimulator::lookahead(pool, 4, 2, 8);
        let state = run_strategy(&mut sim, 0.4, 2, 300);
        assert!(state.injected() > 0);
        assert_eq!(state.fired()[3], 0);
    }

    #[test]
    fn parallel_runs_are_reproducible() {
        let pool = build_pool(2).expect("test: pool");
        let mut a = ParallelSimulator::one_hop(Arc::clone(&pool), 4, 2);
        let mut b = ParallelSimulator::one_hop(pool, 4, 2);
        assert_eq!(run_strategy(&mut a, 0.3, 9, 200), run_strategy(&mut b, 0.3, 9, 200));
    }

    #[test]
    fn one_hop_drains_half_the_queue() {
        let pool = build_pool(2).expect("test: pool");
        let mut sim = ParallelSimulator::one_hop(pool, 4, 2);
        let (table, rates) = path_fixture();
        let inject = rates.probabilities(0.0);
        let input = TickInput { table: &table, inject: &inject };
        let mut state = ChipState::new(4);
        state.queue[0] = 10;
        state.injected = 10;
        sim.run(&mut state, &input, 1, &mut RngContext::new(0, 2));
        // Vertex 0 releases five chips, all routed to vertex 1.
        assert_eq!(state.fired()[0], 5);
        assert_eq!(state.queue()[0], 5);
        assert_eq!(state.queue()[1], 5);
    }

    #[test]
    fn lookahead_single_hop_chain_reaches_the_sink() {
        let pool = build_pool(2).expect("test: pool");
        let mut sim = ParallelSimulator::lookahead(pool, 2, 2, 64);
        let g = crate::graph::WeightedGraph::from_edges(2, &[(0, 1, 1.0)]).expect("test: graph");
        let table = crate::transition::TransitionTable::build(&g).expect("test: graph");
        let inject = vec![0.0, 0.0];
        let input = TickInput { table: &table, inject: &inject };
        let mut state = ChipState::new(2);
        state.queue[0] = 3;
        state.injected = 3;
        sim.run(&mut state, &input, 3, &mut RngContext::new(0, 2));
        assert_eq!(state.queue(), &[0, 3]);
        assert_eq!(state.fired(), &[3, 0]);
    }

    #[test]
    fn arrival_counts_past_u32_are_delivered_whole() {
        let pool = build_pool(2).expect("test: pool");
        let mut sim = ParallelSimulator::one_hop(pool, 4, 2);
        let big = u64::from(u32::MAX) + 7;
        // Producers 0 and 1 both mail vertex 1 (owner 0, offset 1).
        sim.arrivals.grid[0][0][1] = big;
        sim.arrivals.grid[1][0][1] = 3;
        let mut state = ChipState::new(4);
        sim.gather_arrivals(&mut state);
        assert_eq!(state.queue()[1], big + 3);
        assert!(sim.arrivals.grid.iter().flatten().flatten().all(|&c| c == 0));
    }
}
