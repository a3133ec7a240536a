// Monte Carlo Infrastructure: N runs per scenario and strategy
// Run k uses seed base+k for both the graph builder and the solver streams

use chipfire_lsolver::reference::{relative_error, solve_grounded};
use chipfire_lsolver::{LaplacianSolver, SolverParams, Strategy};

use crate::report::*;
use crate::scenarios::Scenario;

use std::time::Instant;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(
    scenario: &Scenario,
    params: &SolverParams,
    seed: u64,
) -> BenchResult {
    let start = Instant::now();
    let params = params.clone().with_seed(seed);

    let mut result = BenchResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        category: scenario.category.to_string(),
        strategy: params.strategy.name(),
        seed,
        pass: false,
        converged: false,
        vertices: 0,
        beta: 0.0,
        rounds: 0,
        epochs: 0,
        relative_error: f64::NAN,
        elapsed_ms: 0.0,
        error: None,
    };

    let (graph, b) = match (scenario.build)(seed) {
        Ok(built) => built,
        Err(e) => {
            result.error = Some(e.to_string());
            result.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            return result;
        }
    };
    result.vertices = b.len();

    let solved = LaplacianSolver::new(&graph, params).and_then(|s| s.solve(&b));
    let exact = solve_grounded(&graph.laplacian(), &b);

    match (solved, exact) {
        (Ok(solution), Ok(exact)) => {
            result.converged = solution.is_converged();
            result.beta = solution.beta;
            result.rounds = solution.rounds.len();
            result.epochs = solution.rounds.iter().map(|r| r.epochs).sum();
            result.relative_error = relative_error(&exact, &solution.x);
            result.pass = result.relative_error <= scenario.criteria.max_relative_error
                && (result.converged || !scenario.criteria.require_converged);
        }
        (Err(e), _) | (_, Err(e)) => {
            result.error = Some(e.to_string());
        }
    }

    result.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    result
}

/// Run `runs` seeds of one scenario under one strategy and aggregate.
pub fn run_monte_carlo(
    scenario: &Scenario,
    params: &SolverParams,
    strategy: Strategy,
    runs: usize,
    base_seed: u64,
) -> MonteCarloReport {
    let params = params.clone().with_strategy(strategy);
    let individual_runs: Vec<BenchResult> = (0..runs as u64)
        .map(|k| run_single(scenario, &params, base_seed + k))
        .collect();

    let collect = |f: fn(&BenchResult) -> f64| -> Vec<f64> {
        individual_runs.iter().map(f).filter(|v| v.is_finite()).collect()
    };
    let n = individual_runs.len().max(1) as f64;
    let passed = individual_runs.iter().filter(|r| r.pass).count() as f64;
    let converged = individual_runs.iter().filter(|r| r.converged).count() as f64;

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        strategy: strategy.name(),
        n_runs: individual_runs.len(),
        pass_rate: passed / n,
        converged_rate: converged / n,
        relative_error: Stats::from_samples(&collect(|r| r.relative_error)),
        beta: Stats::from_samples(&collect(|r| r.beta)),
        rounds: Stats::from_samples(&collect(|r| r.rounds as f64)),
        epochs: Stats::from_samples(&collect(|r| r.epochs as f64)),
        elapsed_ms: Stats::from_samples(&collect(|r| r.elapsed_ms)),
        individual_runs,
    }
}
