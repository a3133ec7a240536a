#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chipfire_lsolver::calibration::Calibrator;
    use chipfire_lsolver::injection::InjectionRates;
    use chipfire_lsolver::io::{read_problem, read_solution, write_solution};
    use chipfire_lsolver::reference::{relative_error, solve_grounded};
    use chipfire_lsolver::rng::RngContext;
    use chipfire_lsolver::simulator::{build_pool, simulator_for};
    use chipfire_lsolver::transition::TransitionTable;
    use chipfire_lsolver::{
        solve, GraphView, LaplacianSolver, RoundStop, SolveStatus, SolverError, SolverParams,
        Strategy, WeightedGraph,
    };

    fn params(strategy: Strategy) -> SolverParams {
        let epoch = if strategy == Strategy::Serial { 20_000 } else { 5_000 };
        SolverParams::default()
            .with_strategy(strategy)
            .with_threads(2)
            .with_epoch_length(epoch)
    }

    fn path(n: usize) -> WeightedGraph {
        let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1, 1.0)).collect();
        WeightedGraph::from_edges(n, &edges).expect("test: graph")
    }

    /// Center 0, leaves 1..=k, sink is leaf k.
    fn star(k: usize) -> WeightedGraph {
        let edges: Vec<_> = (1..=k).map(|leaf| (0, leaf, 1.0)).collect();
        WeightedGraph::from_edges(k + 1, &edges).expect("test: graph")
    }

    // ========== Closed forms ==========

    #[test]
    fn test_two_node_closed_form_every_strategy() {
        let g = WeightedGraph::from_edges(2, &[(0, 1, 4.0)]).expect("test: graph");
        for strategy in Strategy::ALL {
            let sol = solve(&g, &[2.0, -2.0], params(strategy).with_seed(3)).expect("solve");
            assert_eq!(sol.status, SolveStatus::Converged, "{:?}", strategy);
            assert_eq!(sol.x[1], 0.0);
            assert_relative_eq!(sol.x[0], 0.5, max_relative = 0.1);
        }
    }

    #[test]
    fn test_star_leaves_follow_the_center() {
        // x0 = B, the source leaf sits at 2B, every other leaf at B.
        let k = 5;
        let g = star(k);
        let mut b = vec![0.0; k + 1];
        b[1] = 1.0;
        b[k] = -1.0;
        let sol = solve(&g, &b, params(Strategy::Serial).with_seed(5)).expect("solve");
        assert!(sol.is_converged());

        let x = &sol.x;
        assert_relative_eq!(x[0], 1.0, max_relative = 0.1);
        assert_relative_eq!(x[1], 2.0, max_relative = 0.1);
        for leaf in 2..k {
            assert_relative_eq!(x[leaf], x[0], max_relative = 0.15);
        }
        assert_eq!(x[k], 0.0);

        // Vertices without demand are harmonic: x[i] is the weighted mean of
        // its neighbours.
        for v in (0..k).filter(|&v| b[v] == 0.0) {
            let mean: f64 =
                g.neighbors(v).iter().map(|&(u, w)| w * x[u]).sum::<f64>() / g.degree(v);
            assert_relative_eq!(x[v], mean, max_relative = 0.15);
        }
    }

    #[test]
    fn test_path_firing_rates_match_flow() {
        // eta = (3, 4, 2) * beta on the 4-vertex path with a unit dipole.
        let sol = solve(&path(4), &[1.0, 0.0, 0.0, -1.0], params(Strategy::Serial).with_seed(8))
            .expect("solve");
        let beta = sol.beta;
        for (got, want) in sol.eta.iter().zip([3.0, 4.0, 2.0, 0.0]) {
            assert_relative_eq!(*got, want * beta, max_relative = 0.1, epsilon = 1e-12);
        }
    }

    // ========== Strategies against the dense reference ==========

    #[test]
    fn test_every_strategy_tracks_the_reference_on_a_path() {
        let g = path(6);
        let b = [1.0, 0.0, 0.0, 0.0, 0.0, -1.0];
        let exact = solve_grounded(&g.laplacian(), &b).expect("reference");

        for strategy in Strategy::ALL {
            let mut mean = vec![0.0; b.len()];
            let seeds = [1u64, 2, 3];
            for &seed in &seeds {
                let sol = solve(&g, &b, params(strategy).with_seed(seed)).expect("solve");
                for (m, v) in mean.iter_mut().zip(&sol.x) {
                    *m += v / seeds.len() as f64;
                }
            }
            let err = relative_error(&exact, &mean);
            // Single source: lookahead walks rarely share a hop index, so
            // the hop-set union loses almost nothing here.
            assert!(err < 0.1, "{:?} relative error {}", strategy, err);
        }
    }

    #[test]
    fn test_expected_firing_rates_agree_at_fixed_beta() {
        // Same graph, beta and epoch budget; eta averaged over seeds.
        let g = path(5);
        let b = [1.0, 0.0, 0.0, 0.0, -1.0];
        let table = TransitionTable::build(&g).expect("table");
        let rates = InjectionRates::compute(&b, 5).expect("rates");
        let pool = build_pool(2).expect("pool");
        let beta = 0.05;
        let seeds = 0..4u64;

        let mean_eta = |strategy: Strategy| -> Vec<f64> {
            let p = params(strategy).with_epoch_length(10_000);
            let mut mean = vec![0.0; 5];
            for seed in seeds.clone() {
                let sim = simulator_for(&p, 5, Some(&pool)).expect("simulator");
                let rngs = RngContext::new(seed, p.threads);
                let mut cal = Calibrator::new(&p, &table, &rates, sim, rngs);
                let (_, eta) = cal.estimate_eta(beta, 0.0);
                for (m, e) in mean.iter_mut().zip(eta) {
                    *m += e / seeds.clone().count() as f64;
                }
            }
            mean
        };

        let serial = mean_eta(Strategy::Serial);
        // Flow on the path: eta = (4, 6, 4, 2) * beta.
        for (got, want) in serial.iter().zip([4.0, 6.0, 4.0, 2.0]) {
            assert_relative_eq!(*got, want * beta, max_relative = 0.1);
        }
        for strategy in [Strategy::OneHop, Strategy::Lookahead] {
            let eta = mean_eta(strategy);
            for v in 0..4 {
                // Lookahead merges hop sets with a union and may undercount
                // when walks collide; one source keeps collisions rare.
                assert_relative_eq!(eta[v], serial[v], max_relative = 0.1);
            }
            assert_eq!(eta[4], 0.0);
        }
    }

    #[test]
    fn test_weighted_graph_against_reference() {
        let g = WeightedGraph::from_edges(
            5,
            &[(0, 1, 2.0), (1, 2, 1.0), (0, 2, 0.5), (2, 3, 1.5), (3, 4, 1.0), (1, 4, 0.5)],
        )
        .expect("test: graph");
        let b = [0.6, 0.4, 0.0, 0.0, -1.0];
        let exact = solve_grounded(&g.laplacian(), &b).expect("reference");
        let sol = solve(&g, &b, params(Strategy::Serial).with_seed(21)).expect("solve");
        assert!(relative_error(&exact, &sol.x) < 0.1);
    }

    // ========== Beta search ==========

    #[test]
    fn test_unreachable_target_terminates_at_the_floor() {
        let p = SolverParams {
            target_ratio: 1.0,
            epoch_length: 50,
            max_epochs: 5,
            ..params(Strategy::Serial)
        };
        let sol = solve(&path(4), &[1.0, 0.0, 0.0, -1.0], p.clone()).expect("solve");
        assert_eq!(sol.status, SolveStatus::FloorReached);
        assert!(sol.rounds.len() <= 11);
        assert_eq!(sol.rounds.len(), p.max_search_rounds());
        assert!(sol.beta < p.beta_floor);
        assert!(sol.x.iter().all(|v| v.is_finite()));
        assert!(sol.require_converged().is_err());
    }

    #[test]
    fn test_rounds_never_exceed_the_epoch_cap() {
        let p = SolverParams { max_epochs: 4, ..params(Strategy::OneHop) };
        let sol = solve(&star(4), &[0.0, 1.0, 0.0, 0.0, -1.0], p).expect("solve");
        for r in &sol.rounds {
            assert!(r.epochs >= 3 && r.epochs <= 4);
            if r.stop == RoundStop::EpochCap {
                assert_eq!(r.epochs, 4);
            }
        }
    }

    // ========== Configuration errors ==========

    #[test]
    fn test_zero_sink_demand_is_rejected() {
        let err = solve(&path(3), &[1.0, -1.0, 0.0], params(Strategy::Serial)).err();
        assert!(matches!(err, Some(SolverError::Configuration(_))));
    }

    #[test]
    fn test_isolated_non_sink_vertex_is_rejected() {
        let g = WeightedGraph::from_edges(3, &[(1, 2, 1.0)]).expect("test: graph");
        let err = LaplacianSolver::new(&g, params(Strategy::Serial)).err();
        assert!(matches!(err, Some(SolverError::Configuration(_))));
    }

    #[test]
    fn test_component_cut_off_from_the_sink_is_rejected() {
        // 0 and 1 only reach each other; chips injected there never drain.
        let g = WeightedGraph::from_edges(3, &[(0, 1, 1.0)]).expect("test: graph");
        for strategy in Strategy::ALL {
            let err = solve(&g, &[1.0, 0.0, -1.0], params(strategy)).err();
            match err {
                Some(SolverError::Configuration(msg)) => {
                    assert!(msg.contains("cannot reach the sink"), "{}", msg)
                }
                other => panic!("{:?}: expected configuration error, got {:?}", strategy, other),
            }
        }
    }

    #[test]
    fn test_out_of_range_edge_is_rejected() {
        let err = WeightedGraph::from_edges(3, &[(0, 1, 1.0), (1, 3, 1.0)]).err();
        assert!(matches!(err, Some(SolverError::Configuration(_))));
    }

    #[test]
    fn test_mismatched_b_length_is_rejected() {
        let solver = LaplacianSolver::new(&path(3), params(Strategy::Serial)).expect("solver");
        assert!(matches!(solver.solve(&[1.0, -1.0]), Err(SolverError::Configuration(_))));
    }

    // ========== Determinism and reuse ==========

    #[test]
    fn test_same_seed_same_solution() {
        for strategy in Strategy::ALL {
            let p = params(strategy).with_seed(42).with_epoch_length(1_000);
            let a = solve(&path(5), &[1.0, 0.0, 0.0, 0.0, -1.0], p.clone()).expect("solve");
            let b = solve(&path(5), &[1.0, 0.0, 0.0, 0.0, -1.0], p).expect("solve");
            assert_eq!(a.x, b.x, "{:?} is not reproducible", strategy);
            assert_eq!(a.beta, b.beta);
        }
    }

    #[test]
    fn test_solver_reuses_table_for_many_rhs() {
        let g = path(4);
        let solver = LaplacianSolver::new(&g, params(Strategy::Serial).with_seed(4)).expect("solver");
        assert_eq!(solver.table().vertex_count(), g.vertex_count());
        let one = solver.solve(&[1.0, 0.0, 0.0, -1.0]).expect("solve");
        let two = solver.solve(&[2.0, 0.0, 0.0, -2.0]).expect("solve");
        assert_relative_eq!(two.x[0] / one.x[0], 2.0, max_relative = 0.15);
    }

    #[test]
    fn test_canonicalize_keeps_differences() {
        let mut sol = solve(&path(3), &[1.0, 0.0, -1.0], params(Strategy::Serial).with_seed(6))
            .expect("solve");
        let gap = sol.x[0] - sol.x[2];
        sol.canonicalize();
        assert_relative_eq!(sol.x.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(sol.x[0] - sol.x[2], gap, epsilon = 1e-9);
    }

    // ========== Problem files ==========

    #[test]
    fn test_problem_file_end_to_end() {
        let text = "3\n0 1 0\n1 0 1\n0 1 0\n1 0 -1\n";
        let problem = read_problem(text.as_bytes()).expect("parse");
        let graph = problem.graph();
        let sol = solve(&graph, &problem.b, params(Strategy::Serial).with_seed(10)).expect("solve");

        let mut out = Vec::new();
        write_solution(&mut out, &sol.x).expect("write");
        let x_hat = read_solution(out.as_slice()).expect("read");
        assert_eq!(x_hat.len(), 3);

        let exact = solve_grounded(&graph.laplacian(), &problem.b).expect("reference");
        assert!(relative_error(&exact, &x_hat) < 0.1);
    }
}
