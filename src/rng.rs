// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Random Streams

//! Independent random streams, one per worker.
//!
//! Every worker owns its own ChaCha8 generator, so no stream is ever
//! touched by two threads. Stream `k` uses ChaCha stream id `k` under the
//! base seed, which keeps runs reproducible for a fixed seed and worker
//! count.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct RngContext {
    streams: Vec<ChaCha8Rng>,
}

impl RngContext {
    pub fn new(seed: u64, workers: usize) -> Self {
        let streams = (0..workers.max(1))
            .map(|k| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(k as u64);
                rng
            })
            .collect();
        Self { streams }
    }

    pub fn workers(&self) -> usize {
        self.streams.len()
    }

    /// The single stream used by the serial strategy.
    pub fn primary(&mut self) -> &mut ChaCha8Rng {
        &mut self.streams[0]
    }

    pub fn streams_mut(&mut self) -> &mut [ChaCha8Rng] {
        &mut self.streams
    }
}
