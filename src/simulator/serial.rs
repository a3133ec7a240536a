// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Serial Strategy

use crate::params::Strategy;
use crate::rng::RngContext;

use super::{inject, ChipState, Simulator, TickInput};

/// Single-threaded reference strategy.
///
/// Vertices are visited in index order; at most one chip leaves each vertex
/// per tick. Arrivals are buffered and folded into the queues once the
/// whole sweep is done, so a chip moves at most one hop per tick. Fully
/// deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct SerialSimulator {
    arrivals: Vec<u64>,
}

impl SerialSimulator {
    pub fn new(n: usize) -> Self {
        Self { arrivals: vec![0; n] }
    }
}

impl Simulator for SerialSimulator {
    fn strategy(&self) -> Strategy {
        Strategy::Serial
    }

    fn run(&mut self, state: &mut ChipState, input: &TickInput<'_>, ticks: usize, rngs: &mut RngContext) {
        let sink = input.sink();
        let rng = rngs.primary();

        for _ in 0..ticks {
            for v in 0..sink {
                let q = &mut state.queue[v];
                state.injected += inject(q, input.inject[v], rng);
                if *q > 0 {
                    *q -= 1;
                    state.fired[v] += 1;
                    self.arrivals[input.table.draw(v, rng)] += 1;
                }
            }
            for (q, a) in state.queue.iter_mut().zip(self.arrivals.iter_mut()) {
                *q += std::mem::take(a);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::test_support::path_fixture;

    #[test]
    fn identical_seeds_give_identical_trajectories() {
        let (table, rates) = path_fixture();
        let inject = rates.probabilities(0.2);
        let input = TickInput { table: &table, inject: &inject };

        let mut a = (SerialSimulator::new(4), ChipState::new(4), RngContext::new(11, 1));
        let mut b = (SerialSimulator::new(4), ChipState::new(4), RngContext::new(11, 1));
        for _ in 0..500 {
            a.0.run(&mut a.1, &input, 1, &mut a.2);
            b.0.run(&mut b.1, &input, 1, &mut b.2);
            assert_eq!(a.1, b.1);
        }
    }

    #[test]
    fn chips_are_conserved() {
        let (table, rates) = path_fixture();
        let inject = rates.probabilities(0.3);
        let input = TickInput { table: &table, inject: &inject };
        let mut sim = SerialSimulator::new(4);
        let mut state = ChipState::new(4);
        let mut rngs = RngContext::new(3, 1);
        for _ in 0..200 {
            sim.run(&mut state, &input, 5, &mut rngs);
            assert_eq!(state.total_queued(), state.injected());
        }
        assert!(state.injected() > 0);
    }

    #[test]
    fn idle_vertices_do_not_fire() {
        let (table, rates) = path_fixture();
        let inject = rates.probabilities(0.0);
        let input = TickInput { table: &table, inject: &inject };
        let mut sim = SerialSimulator::new(4);
        let mut state = ChipState::new(4);
        sim.run(&mut state, &input, 100, &mut RngContext::new(0, 1));
        assert!(state.fired().iter().all(|&c| c == 0));
    }

    #[test]
    fn sink_never_fires() {
        let (table, rates) = path_fixture();
        let inject = rates.probabilities(0.5);
        let input = TickInput { table: &table, inject: &inject };
        let mut sim = SerialSimulator::new(4);
        let mut state = ChipState::new(4);
        sim.run(&mut state, &input, 1000, &mut RngContext::new(5, 1));
        assert_eq!(state.fired()[3], 0);
        assert!(state.queue()[3] > 0);
    }
}
