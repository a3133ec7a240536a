// Chip-Firing Solver Benchmark Runner
// Monte Carlo over seeds, every strategy, scored against a dense direct solve
//
// Usage:
//   cargo run --release --bin bench                        # All scenarios, all strategies
//   cargo run --release --bin bench -- --runs 3            # Quick mode
//   cargo run --release --bin bench -- GRID                # Filter by name
//   cargo run --release --bin bench -- --strategy v2       # One strategy only
//   cargo run --release --bin bench -- --config p.json     # Solver params from JSON
//   RUST_LOG=chipfire_lsolver=debug cargo run --bin bench  # Per-epoch logging

mod monte_carlo;
mod report;
mod scenarios;

use chipfire_lsolver::{SolverParams, Strategy};
use report::*;
use scenarios::*;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    threads: Option<usize>,
    epoch_length: Option<usize>,
    strategy: Option<Strategy>,
    config: Option<String>,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 10,
        seed: 0,
        threads: None,
        epoch_length: None,
        strategy: None,
        config: None,
        filter: None,
    };

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--runs" => {
                cli.runs = value.and_then(|v| v.parse().ok()).unwrap_or(10);
                i += 1;
            }
            "--seed" => {
                cli.seed = value.and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 1;
            }
            "--threads" => {
                cli.threads = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--epoch-length" => {
                cli.epoch_length = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--strategy" => {
                cli.strategy = value.and_then(|v| Strategy::parse(v));
                if cli.strategy.is_none() {
                    eprintln!("Unknown strategy: {:?}", value);
                }
                i += 1;
            }
            "--config" => {
                cli.config = value.cloned();
                i += 1;
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

fn load_params(cli: &CliArgs) -> chipfire_lsolver::Result<SolverParams> {
    let mut params = match &cli.config {
        Some(path) => SolverParams::from_json(&std::fs::read_to_string(path)?)?,
        None => SolverParams::default(),
    };
    if let Some(t) = cli.threads {
        params.threads = t;
    }
    if let Some(e) = cli.epoch_length {
        params.epoch_length = e;
    }
    params.validate()?;
    Ok(params)
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("  Error: {}", msg);
    std::process::exit(2);
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let params = load_params(&cli).unwrap_or_else(|e| fail(e));
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    let strategies: Vec<Strategy> = match cli.strategy {
        Some(s) => vec![s],
        None => Strategy::ALL.to_vec(),
    };

    println!("\n  Chip-Firing Solver Benchmark");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {} | Threads: {} | Epoch: {} ticks",
        cli.runs, cli.seed, params.threads, params.epoch_length);
    println!("  Running {} scenario(s) x {} strategy(ies)...\n", to_run.len(), strategies.len());
    println!("  {:<30} {:<10} {:>5} {:>5} {:>16} {:>10} {:>7} {:>9}",
        "Scenario", "Strategy", "Pass%", "Conv%", "RelErr", "Beta", "Rounds", "Time");
    println!("  {}", "-".repeat(100));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        for &strategy in &strategies {
            let report = monte_carlo::run_monte_carlo(scenario, &params, strategy, cli.runs, cli.seed);

            let pass_pct = report.pass_rate * 100.0;
            let status = if report.pass_rate >= 0.9 { "PASS" } else { "FAIL" };

            println!("  {:<30} {:<10} {:>4}% {:>4}% {:>8.4}±{:<7.4} {:>10.2e} {:>7.1} {:>7.0}ms  {}",
                report.label,
                report.strategy,
                pass_pct as u32,
                (report.converged_rate * 100.0) as u32,
                report.relative_error.mean,
                report.relative_error.half_width(),
                report.beta.mean,
                report.rounds.mean,
                report.elapsed_ms.mean,
                status,
            );

            for run in report.individual_runs.iter().filter(|r| r.error.is_some()) {
                eprintln!("    seed {}: {}", run.seed, run.error.as_deref().unwrap_or(""));
            }

            mc_reports.push(report);
        }
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= 0.9).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(100));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_elapsed.as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let timestamp = format!("{}", ts);

    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        params,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        scenarios: mc_reports,
    };

    let dir = std::path::Path::new("benchmark-results");
    if let Err(e) = std::fs::create_dir_all(dir) {
        fail(format!("cannot create {}: {}", dir.display(), e));
    }
    let path = dir.join(format!("bench-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report).unwrap_or_else(|e| fail(e));
    if let Err(e) = std::fs::write(&path, &json) {
        fail(format!("cannot write {}: {}", path.display(), e));
    }
    println!("  Results saved to: {}\n", path.display());

    if failed > 0 {
        std::process::exit(1);
    }
}
