use ziround_core::check::violations;
use ziround_core::{
    ObjSense, Problem, Rounder, RoundingConfig, RoundingError, RowSense, Termination, VarKind,
};

const TOL: f64 = 1e-6;

#[test]
fn test_single_bound_row_rounds_down() {
    let mut b = Problem::builder(ObjSense::Minimize);
    let x1 = b.add_variable("x1", 0.0, 5.0, 1.0, VarKind::Integer);
    b.add_constraint("cap", [(x1, 1.0)], RowSense::Le, 3.4);
    let problem = b.build().unwrap();

    let outcome = Rounder::new(&problem, RoundingConfig::default())
        .unwrap()
        .run(&[3.4])
        .unwrap();

    assert_eq!(outcome.values, vec![3.0]);
    assert!((outcome.objective_value - 3.0).abs() < 1e-9);
    assert_eq!(outcome.num_unrounded, 0);
    assert_eq!(outcome.termination, Termination::Fixpoint);
}

#[test]
fn test_equal_objective_changes_tie_goes_down_by_default() {
    // min x + 2s with x + s >= 4 tight at x = 1.5, s = 2.5. Rounding x up
    // costs 0.5 directly; rounding it down costs -0.5 plus 1.0 for the
    // 0.5 of s needed to keep the row satisfied. Both changes are +0.5.
    let mut b = Problem::builder(ObjSense::Minimize);
    let x = b.add_variable("x", 0.0, 3.0, 1.0, VarKind::Integer);
    let s = b.add_variable("s", 0.0, 10.0, 2.0, VarKind::Continuous);
    b.add_constraint("demand", [(x, 1.0), (s, 1.0)], RowSense::Ge, 4.0);
    let problem = b.build().unwrap();
    let start = [1.5, 2.5];

    let best = RoundingConfig::default().with_singletons(true).with_audit(true);
    let outcome = Rounder::new(&problem, best).unwrap().run(&start).unwrap();
    assert_eq!(outcome.values[x], 1.0);
    assert!((outcome.values[s] - 3.0).abs() < 1e-9, "s = {}", outcome.values[s]);
    assert!((outcome.objective_value - 7.0).abs() < 1e-9);

    let worst = RoundingConfig::default()
        .with_singletons(true)
        .with_worst_objective_tie_break(true)
        .with_audit(true);
    let outcome = Rounder::new(&problem, worst).unwrap().run(&start).unwrap();
    assert_eq!(outcome.values[x], 2.0);
    assert!((outcome.values[s] - 2.5).abs() < 1e-9, "s = {}", outcome.values[s]);
    assert!((outcome.objective_value - 7.0).abs() < 1e-9);
    assert!(violations(&problem, &outcome.values, TOL).is_empty());
}

#[test]
fn test_equality_row_routes_through_singletons_in_column_order() {
    // 3x + s1 + s2 = 12 with x = 1; moving x down by one frees 3.0 units
    // that s1 absorbs up to its bound before s2 takes the rest.
    let mut b = Problem::builder(ObjSense::Minimize);
    let x = b.add_variable("x", 0.0, 5.0, 1.0, VarKind::Integer);
    let s1 = b.add_variable("s1", 0.0, 10.0, 0.0, VarKind::Continuous);
    let s2 = b.add_variable("s2", 0.0, 10.0, 0.0, VarKind::Continuous);
    b.add_constraint("balance", [(x, 3.0), (s1, 1.0), (s2, 1.0)], RowSense::Eq, 12.0);
    let problem = b.build().unwrap();

    let config = RoundingConfig::default()
        .with_singletons(true)
        .with_shift_non_fractional(true)
        .with_audit(true);
    let rounder = Rounder::new(&problem, config).unwrap();

    let index = rounder.singletons().unwrap();
    assert_eq!(index.lower(0), 0.0);
    assert_eq!(index.upper(0), 20.0);

    let mut state = rounder.initial_state(&[1.0, 8.0, 1.0]).unwrap();
    rounder.round(&mut state).unwrap();

    let values = state.values();
    assert_eq!(values[x], 0.0);
    assert!((values[s1] - 10.0).abs() < 1e-9, "s1 = {}", values[s1]);
    assert!((values[s2] - 2.0).abs() < 1e-9, "s2 = {}", values[s2]);
    assert!(((values[s1] - 8.0) + (values[s2] - 1.0) - 3.0).abs() < 1e-9);
    assert!(state.slack(0).abs() < 1e-9);
    assert!((state.singleton_value(0) - 12.0).abs() < 1e-9);
}

#[test]
fn test_equality_row_without_singletons_blocks_shift() {
    let mut b = Problem::builder(ObjSense::Minimize);
    let x = b.add_variable("x", 0.0, 5.0, 1.0, VarKind::Integer);
    let s = b.add_variable("s", 0.0, 10.0, 0.0, VarKind::Continuous);
    b.add_constraint("balance", [(x, 1.0), (s, 1.0)], RowSense::Eq, 4.0);
    let problem = b.build().unwrap();

    let outcome = Rounder::new(&problem, RoundingConfig::default())
        .unwrap()
        .run(&[1.5, 2.5])
        .unwrap();
    assert_eq!(outcome.values, vec![1.5, 2.5]);
    assert_eq!(outcome.shifts, 0);
    assert_eq!(outcome.rounds, 1);

    let with_singletons = RoundingConfig::default().with_singletons(true);
    let outcome = Rounder::new(&problem, with_singletons)
        .unwrap()
        .run(&[1.5, 2.5])
        .unwrap();
    assert_eq!(outcome.values[x], 1.0);
    assert!((outcome.values[s] - 3.0).abs() < 1e-9);
}

#[test]
fn test_fixed_variable_is_never_shifted() {
    let mut b = Problem::builder(ObjSense::Maximize);
    let fixed = b.add_variable("fixed", 1.5, 1.5, 10.0, VarKind::Integer);
    let free = b.add_variable("free", 0.0, 3.0, 1.0, VarKind::Integer);
    b.add_constraint("cap", [(fixed, 1.0), (free, 1.0)], RowSense::Le, 100.0);
    let problem = b.build().unwrap();

    let config = RoundingConfig::default()
        .with_shift_non_fractional(true)
        .with_audit(true);
    let outcome = Rounder::new(&problem, config).unwrap().run(&[1.5, 0.5]).unwrap();

    assert_eq!(outcome.values[fixed], 1.5);
    assert_eq!(outcome.values[free], 3.0);
    assert_eq!(outcome.num_unrounded, 1);
}

#[test]
fn test_start_point_is_validated() {
    let mut b = Problem::builder(ObjSense::Minimize);
    let x = b.add_variable("x", 0.0, 5.0, 1.0, VarKind::Integer);
    b.add_constraint("cap", [(x, 1.0)], RowSense::Le, 3.4);
    let problem = b.build().unwrap();
    let rounder = Rounder::new(&problem, RoundingConfig::default()).unwrap();

    assert!(matches!(
        rounder.run(&[1.0, 2.0]),
        Err(RoundingError::StartLength { expected: 1, actual: 2 })
    ));
    assert!(matches!(
        rounder.run(&[6.0]),
        Err(RoundingError::StartOutOfBounds { .. })
    ));
    assert!(matches!(
        rounder.run(&[4.0]),
        Err(RoundingError::StartInfeasible { .. })
    ));
}

#[test]
fn test_history_tracks_every_pass() {
    let mut b = Problem::builder(ObjSense::Minimize);
    let x = b.add_variable("x", 0.0, 5.0, 1.0, VarKind::Integer);
    b.add_constraint("cap", [(x, 1.0)], RowSense::Le, 4.5);
    let problem = b.build().unwrap();

    let config = RoundingConfig::default().with_shift_non_fractional(true);
    let outcome = Rounder::new(&problem, config).unwrap().run(&[4.5]).unwrap();

    assert_eq!(outcome.values, vec![0.0]);
    assert_eq!(outcome.history.len(), outcome.rounds);
    assert_eq!(outcome.history.last().map(|p| p.shifts), Some(0));
    let total: usize = outcome.history.iter().map(|p| p.shifts).sum();
    assert_eq!(total, outcome.shifts);
}
