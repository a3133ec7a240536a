// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Injection Rates

//! Converts the right-hand side `b` into per-vertex injection rates
//! `J[i] = -b[i] / b_sink`.

use rayon::prelude::*;
use tracing::warn;

use crate::error::{Result, SolverError};

/// Injection rates derived from one right-hand side.
#[derive(Debug, Clone)]
pub struct InjectionRates {
    rates: Vec<f64>,
    b_sink: f64,
}

impl InjectionRates {
    /// Validate `b` against a graph of `n` vertices and derive `J`.
    pub fn compute(b: &[f64], n: usize) -> Result<Self> {
        if b.len() != n {
            return Err(SolverError::config(format!(
                "right-hand side has {} entries, graph has {} vertices",
                b.len(),
                n
            )));
        }
        if let Some(i) = b.iter().position(|v| !v.is_finite()) {
            return Err(SolverError::config(format!("b[{}] = {} is not finite", i, b[i])));
        }
        let b_sink = match b.last() {
            Some(&v) if v != 0.0 => v,
            _ => return Err(SolverError::config("b_sink must be non-zero")),
        };

        let rates: Vec<f64> = b.par_iter().map(|&bi| -bi / b_sink).collect();

        let negative = rates[..n - 1].iter().filter(|&&j| j < 0.0).count();
        if negative > 0 {
            warn!(
                target: "chipfire_lsolver::injection",
                vertices = negative,
                "negative injection rates are clamped to zero",
            );
        }
        Ok(Self { rates, b_sink })
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn b_sink(&self) -> f64 {
        self.b_sink
    }

    /// Per-tick injection probability `clamp(beta * J[i], 0, 1)`. The sink
    /// never injects.
    pub fn probabilities(&self, beta: f64) -> Vec<f64> {
        let sink = self.rates.len() - 1;
        self.rates
            .iter()
            .enumerate()
            .map(|(i, &j)| if i == sink { 0.0 } else { (beta * j).clamp(0.0, 1.0) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_relative_to_the_sink() {
        let j = InjectionRates::compute(&[2.0, -1.0, 0.0, -4.0], 4).expect("test: valid b");
        assert_eq!(j.rates(), &[0.5, -0.25, 0.0, -1.0]);
        assert_eq!(j.b_sink(), -4.0);
    }

    #[test]
    fn two_node_balanced_rhs_gives_unit_rate() {
        let j = InjectionRates::compute(&[3.0, -3.0], 2).expect("test: valid b");
        assert_eq!(j.rates()[0], 1.0);
    }

    #[test]
    fn probabilities_are_clamped() {
        let j = InjectionRates::compute(&[-30.0, 1.0, 0.0, 1.0], 4).expect("test: valid b");
        let p = j.probabilities(0.1);
        assert_eq!(p, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn zero_sink_entry_is_a_configuration_error() {
        let err = InjectionRates::compute(&[1.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, SolverError::Configuration(_)));
    }

    #[test]
    fn length_and_finiteness_are_checked() {
        assert!(InjectionRates::compute(&[1.0, -1.0], 3).is_err());
        assert!(InjectionRates::compute(&[f64::NAN, -1.0], 2).is_err());
    }
}
