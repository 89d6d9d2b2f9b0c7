//! Property-based tests for the rounding engine
//!
//! Random small problems with `<=`, `>=` and equality rows, each row with
//! up to two dedicated continuous singleton columns, are generated together
//! with a start point that is feasible by construction, then checked for:
//! - Feasibility of the rounded point
//! - Consistency of the reported objective and fractionality
//! - Monotone fractionality and guaranteed termination
//! - Idempotence of a second run

use proptest::prelude::*;
use ziround_core::check::{count_unrounded, total_fractionality, violations};
use ziround_core::{ObjSense, Problem, Rounder, RoundingConfig, RowSense, Termination, VarKind};

const TOL: f64 = 1e-6;

#[derive(Debug, Clone)]
struct Instance {
    problem: Problem,
    start: Vec<f64>,
}

/// (upper bound, position in [0, ub], objective, integral)
type ColumnSpec = (u8, f64, i8, bool);
/// (coefficient, objective, distance of the lower bound below 0, width, position in [lower, upper])
type SingletonSpec = (i8, i8, u8, u8, f64);
/// (coefficients, sense selector, rhs offset from the start activity, dedicated singletons)
type RowSpec = (Vec<i8>, u8, f64, Vec<SingletonSpec>);

fn build(maximize: bool, columns: Vec<ColumnSpec>, rows: Vec<RowSpec>) -> Instance {
    let sense = if maximize {
        ObjSense::Maximize
    } else {
        ObjSense::Minimize
    };
    let mut b = Problem::builder(sense);
    let mut start = Vec::new();
    for (j, (ub, t, obj, integral)) in columns.into_iter().enumerate() {
        let kind = if integral {
            VarKind::Integer
        } else {
            VarKind::Continuous
        };
        b.add_variable(format!("x{j}"), 0.0, ub as f64, obj as f64, kind);
        start.push(ub as f64 * t);
    }

    // each row's singleton columns come after all general columns
    let mut row_terms = Vec::with_capacity(rows.len());
    for (i, (coefs, sense, offset, singletons)) in rows.into_iter().enumerate() {
        let mut terms: Vec<(usize, f64)> = coefs.iter().enumerate().map(|(j, &a)| (j, a as f64)).collect();
        for (k, (coef, obj, depth, width, t)) in singletons.into_iter().enumerate() {
            let lower = -(depth as f64);
            let upper = lower + width as f64;
            let col = b.add_variable(format!("s{i}_{k}"), lower, upper, obj as f64, VarKind::Continuous);
            start.push(lower + width as f64 * t);
            terms.push((col, coef as f64));
        }
        row_terms.push((terms, sense, offset));
    }

    for (i, (terms, sense, offset)) in row_terms.into_iter().enumerate() {
        let activity: f64 = terms.iter().map(|&(j, a)| a * start[j]).sum();
        let (row_sense, rhs) = match sense {
            0 => (RowSense::Le, activity + offset),
            1 => (RowSense::Ge, activity - offset),
            _ => (RowSense::Eq, activity),
        };
        b.add_constraint(format!("r{i}"), terms, row_sense, rhs);
    }
    Instance {
        problem: b.build().expect("generated problem is valid"),
        start,
    }
}

fn instance() -> impl Strategy<Value = Instance> {
    (2usize..7, 1usize..5).prop_flat_map(|(n, m)| {
        let column = (1u8..6, 0.0f64..1.0, -3i8..=3, any::<bool>());
        let offset = prop_oneof![Just(0.0), 0.0f64..2.0];
        let coef = prop_oneof![-3i8..=-1, 1i8..=3];
        let singleton = (coef, -2i8..=2, 0u8..3, 1u8..6, 0.0f64..1.0);
        let row = (
            prop::collection::vec(-3i8..=3, n),
            0u8..3,
            offset,
            prop::collection::vec(singleton, 0..3),
        );
        (
            any::<bool>(),
            prop::collection::vec(column, n),
            prop::collection::vec(row, m),
        )
            .prop_map(|(maximize, columns, rows)| build(maximize, columns, rows))
    })
}

fn config() -> impl Strategy<Value = RoundingConfig> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(singletons, shift_integral, wait, worst)| {
            RoundingConfig::default()
                .with_singletons(singletons)
                .with_shift_non_fractional(shift_integral)
                .with_wait_until_zero_fractionality(wait)
                .with_worst_objective_tie_break(worst)
                .with_max_rounds(10_000)
                .with_audit(true)
        },
    )
}

proptest! {
    /// The rounded point satisfies every bound and row
    #[test]
    fn rounding_preserves_feasibility(inst in instance(), config in config()) {
        let outcome = Rounder::new(&inst.problem, config).unwrap().run(&inst.start).unwrap();

        let found = violations(&inst.problem, &outcome.values, TOL);
        prop_assert!(found.is_empty(), "violations: {:?}", found);
        prop_assert_eq!(outcome.termination, Termination::Fixpoint);
    }

    /// Reported objective and fractionality agree with a recomputation
    #[test]
    fn reported_quantities_are_consistent(inst in instance(), config in config()) {
        let outcome = Rounder::new(&inst.problem, config).unwrap().run(&inst.start).unwrap();

        let objective = inst.problem.objective_value(&outcome.values);
        prop_assert!((outcome.objective_value - objective).abs() <= 1e-6 * (1.0 + objective.abs()));
        let frac = total_fractionality(&inst.problem, &outcome.values);
        prop_assert!((outcome.fractionality - frac).abs() <= 1e-6);
        prop_assert_eq!(outcome.num_unrounded, count_unrounded(&inst.problem, &outcome.values, TOL));
    }

    /// Fractionality never grows and every pass is recorded
    #[test]
    fn fractionality_is_monotone(inst in instance(), config in config()) {
        let initial = total_fractionality(&inst.problem, &inst.start);
        let outcome = Rounder::new(&inst.problem, config).unwrap().run(&inst.start).unwrap();

        prop_assert!(outcome.fractionality <= initial + 1e-9);
        prop_assert_eq!(outcome.history.len(), outcome.rounds);
        let mut previous = initial;
        for pass in &outcome.history {
            prop_assert!(pass.fractionality <= previous + 1e-9);
            previous = pass.fractionality;
        }
    }

    /// Integral variables that started on an integer stay on one
    #[test]
    fn integral_values_stay_integral(inst in instance(), config in config()) {
        let outcome = Rounder::new(&inst.problem, config).unwrap().run(&inst.start).unwrap();

        for j in 0..inst.problem.ncols() {
            let before = inst.start[j];
            if inst.problem.is_integral(j) && (before - before.round()).abs() <= TOL {
                let after = outcome.values[j];
                prop_assert!((after - after.round()).abs() <= TOL, "x{} = {}", j, after);
            }
        }
    }

    /// Running again from a fixpoint changes nothing
    #[test]
    fn rounding_is_idempotent(inst in instance(), config in config()) {
        let rounder = Rounder::new(&inst.problem, config).unwrap();
        let first = rounder.run(&inst.start).unwrap();
        let second = rounder.run(&first.values).unwrap();

        prop_assert_eq!(second.shifts, 0);
        prop_assert_eq!(second.rounds, 1);
    }
}
