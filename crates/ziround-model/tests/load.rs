use std::path::PathBuf;

use ziround_core::check::violations;
use ziround_core::{ObjSense, Rounder, RoundingConfig, VarKind};
use ziround_lp::{RelaxationStatus, SimplexSolver};
use ziround_model::{ModelError, PointFile, load, read_point};

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

#[test]
fn test_mps_and_json_describe_the_same_problem() {
    let mps = load(data("knapsack.mps")).unwrap();
    let json = load(data("knapsack.json")).unwrap();

    assert_eq!(mps.name, "KNAPSACK");
    assert_eq!(mps.name, json.name);
    let (a, b) = (&mps.problem, &json.problem);
    assert_eq!(a.sense(), ObjSense::Maximize);
    assert_eq!(a.sense(), b.sense());
    assert_eq!(a.var_names(), b.var_names());
    assert_eq!(a.objective_coefficients(), b.objective_coefficients());
    assert_eq!(a.lower_bounds(), b.lower_bounds());
    assert_eq!(a.upper_bounds(), b.upper_bounds());
    assert_eq!(a.nrows(), b.nrows());
    for j in 0..a.ncols() {
        assert_eq!(a.kind(j), VarKind::Integer);
        assert_eq!(a.kind(j), b.kind(j));
    }
    for i in 0..a.nrows() {
        assert_eq!(a.row_name(i), b.row_name(i));
        assert_eq!(a.row_sense(i), b.row_sense(i));
        assert_eq!(a.rhs(i), b.rhs(i));
        let x = [0.5, 1.0, 2.0];
        assert_eq!(a.activity(i, &x), b.activity(i, &x));
    }
}

#[test]
fn test_relax_and_round_loaded_model() {
    let model = load(data("knapsack.mps")).unwrap();
    let problem = &model.problem;

    let relaxation = SimplexSolver::new().solve(problem);
    assert_eq!(relaxation.status, RelaxationStatus::Optimal);
    assert!((relaxation.objective_value - 14.75).abs() < 1e-6, "obj = {}", relaxation.objective_value);

    let outcome = Rounder::new(problem, RoundingConfig::default())
        .unwrap()
        .run(&relaxation.values)
        .unwrap();
    assert!(outcome.is_integral());
    assert!(violations(problem, &outcome.values, 1e-6).is_empty());
    assert!((outcome.objective_value - 11.0).abs() < 1e-6, "obj = {}", outcome.objective_value);
}

#[test]
fn test_start_point_with_singletons() {
    let model = load(data("blend.json")).unwrap();
    let problem = &model.problem;
    let start = read_point(data("blend_start.json"), problem).unwrap();
    assert_eq!(start, vec![1.0, 8.0, 1.0]);

    let config = RoundingConfig::default()
        .with_singletons(true)
        .with_shift_non_fractional(true);
    let outcome = Rounder::new(problem, config).unwrap().run(&start).unwrap();

    let point = PointFile::from_values(problem, &outcome.values);
    assert_eq!(point.values["batches"], 0.0);
    assert!((point.values["filler"] - 10.0).abs() < 1e-9);
    assert!((point.values["water"] - 2.0).abs() < 1e-9);
}

#[test]
fn test_unsupported_extension_and_missing_file() {
    assert!(matches!(
        load(data("knapsack.lp")),
        Err(ModelError::UnsupportedFormat(_))
    ));
    assert!(matches!(load(data("missing.mps")), Err(ModelError::Io { .. })));
}
