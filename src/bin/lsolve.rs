// Chip-Firing Laplacian Solver - Command Line
//
// Usage:
//   lsolve <problem> [solution] [--strategy serial|v1|v2] [--threads N]
//          [--seed N] [--epoch-length N] [--config params.json] [--strict]
//
// Reads a dense problem file, writes x on one line to <solution> (stdout if
// omitted) and reports the solve time on stderr as "Time: <seconds>".

use chipfire_lsolver::io::{write_solution, write_solution_to, Problem};
use chipfire_lsolver::{LaplacianSolver, SolverError, SolverParams, Strategy};

struct CliArgs {
    input: Option<String>,
    output: Option<String>,
    strategy: Option<Strategy>,
    threads: Option<usize>,
    seed: Option<u64>,
    epoch_length: Option<usize>,
    config: Option<String>,
    strict: bool,
}

fn parse_args() -> Result<CliArgs, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        input: None,
        output: None,
        strategy: None,
        threads: None,
        seed: None,
        epoch_length: None,
        config: None,
        strict: false,
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i).ok_or_else(|| format!("{} needs a value", flag))
        };
        match flag {
            "--strategy" => {
                let v = value()?;
                cli.strategy = Some(Strategy::parse(v).ok_or_else(|| format!("unknown strategy {:?}", v))?);
            }
            "--threads" => cli.threads = Some(parse_num(flag, value()?)?),
            "--seed" => cli.seed = Some(parse_num(flag, value()?)?),
            "--epoch-length" => cli.epoch_length = Some(parse_num(flag, value()?)?),
            "--config" => cli.config = Some(value()?.clone()),
            "--strict" => cli.strict = true,
            arg if !arg.starts_with('-') => {
                if cli.input.is_none() {
                    cli.input = Some(arg.to_string());
                } else if cli.output.is_none() {
                    cli.output = Some(arg.to_string());
                } else {
                    return Err(format!("unexpected argument {:?}", arg));
                }
            }
            other => return Err(format!("unknown flag {:?}", other)),
        }
        i += 1;
    }
    Ok(cli)
}

fn parse_num<T: std::str::FromStr>(flag: &str, v: &str) -> Result<T, String> {
    v.parse().map_err(|_| format!("{} expects a number, got {:?}", flag, v))
}

fn run(cli: CliArgs) -> chipfire_lsolver::Result<()> {
    let input = cli
        .input
        .ok_or_else(|| SolverError::Configuration("missing problem file".into()))?;

    let mut params = match &cli.config {
        Some(path) => SolverParams::from_json(&std::fs::read_to_string(path)?)?,
        None => SolverParams::default(),
    };
    if let Some(s) = cli.strategy {
        params.strategy = s;
    }
    if let Some(t) = cli.threads {
        params.threads = t;
    }
    if let Some(s) = cli.seed {
        params.seed = s;
    }
    if let Some(e) = cli.epoch_length {
        params.epoch_length = e;
    }

    let problem = Problem::from_path(&input)?;
    let solver = LaplacianSolver::new(&problem.graph(), params)?;
    let mut solution = solver.solve(&problem.b)?;
    eprintln!("Time: {}", solution.elapsed.as_secs_f64());

    if cli.strict {
        solution = solution.require_converged()?;
    } else if !solution.is_converged() {
        tracing::warn!(beta = solution.beta, "search reached the beta floor; writing best-effort solution");
    }

    match &cli.output {
        Some(path) => write_solution_to(path, &solution.x),
        None => write_solution(std::io::stdout().lock(), &solution.x),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("lsolve: {}", msg);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("lsolve: {}", e);
        std::process::exit(1);
    }
}
