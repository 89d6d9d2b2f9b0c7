use crate::numeric::is_integral_value;
use crate::policy::Direction;
use crate::problem::{Problem, RowSense};
use crate::singleton::SingletonIndex;
use crate::state::SolutionState;

/// Largest feasible moves of one variable in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Shifts {
    pub up: f64,
    pub down: f64,
}

impl Shifts {
    pub fn is_zero(&self) -> bool {
        self.up == 0.0 && self.down == 0.0
    }
}

/// Computes how far a variable can move without leaving its bounds or
/// breaking any row, given the slack left in the current state.
#[derive(Debug, Clone, Copy)]
pub struct DeltaCalculator<'a> {
    problem: &'a Problem,
    singletons: Option<&'a SingletonIndex>,
    tolerance: f64,
}

impl<'a> DeltaCalculator<'a> {
    pub fn new(problem: &'a Problem, singletons: Option<&'a SingletonIndex>, tolerance: f64) -> Self {
        Self {
            problem,
            singletons,
            tolerance,
        }
    }

    /// Maximum up/down shift of variable `j`.
    ///
    /// A shift never carries the value past the adjacent integer: a fractional
    /// value stops at its floor or ceiling, an integral one moves by at most 1.
    /// When both results are below `epsilon` neither direction is worth taking
    /// and both are reported as 0.
    pub fn compute_shifts(&self, state: &SolutionState, j: usize, epsilon: f64) -> Shifts {
        let x = state.x[j];
        let mut up = self.problem.upper(j) - x;
        let mut down = x - self.problem.lower(j);

        if is_integral_value(x, self.tolerance) {
            up = up.min(1.0);
            down = down.min(1.0);
        } else {
            up = up.min(x.ceil() - x);
            down = down.min(x - x.floor());
        }

        for (i, a) in self.problem.matrix().column(j) {
            let (room_down, room_up) = self.singleton_room(state, i);
            match self.problem.row_sense(i) {
                RowSense::Le => {
                    let cap = state.slack[i].max(0.0) + room_down;
                    if a > 0.0 {
                        up = up.min(cap / a);
                    } else {
                        down = down.min(cap / -a);
                    }
                }
                RowSense::Ge => {
                    let cap = (-state.slack[i]).max(0.0) + room_up;
                    if a > 0.0 {
                        down = down.min(cap / a);
                    } else {
                        up = up.min(cap / -a);
                    }
                }
                RowSense::Eq => {
                    if !self.covers(i) {
                        return Shifts::default();
                    }
                    if a > 0.0 {
                        up = up.min(room_down / a);
                        down = down.min(room_up / a);
                    } else {
                        up = up.min(room_up / -a);
                        down = down.min(room_down / -a);
                    }
                }
            }
            if up <= 0.0 && down <= 0.0 {
                return Shifts::default();
            }
        }

        let up = up.max(0.0);
        let down = down.max(0.0);
        if up < epsilon && down < epsilon {
            return Shifts::default();
        }
        Shifts { up, down }
    }

    /// Whether moving `j` in `direction` is bounded when every other
    /// variable stays put: either the variable bound in that direction is
    /// finite, or some row caps the move with a finite amount of room.
    pub fn is_limited(&self, state: &SolutionState, j: usize, direction: Direction) -> bool {
        let bound = match direction {
            Direction::Up => self.problem.upper(j),
            Direction::Down => self.problem.lower(j),
        };
        if bound.is_finite() {
            return true;
        }
        self.problem.matrix().column(j).any(|(i, a)| {
            let (room_down, room_up) = self.singleton_room(state, i);
            let activity_rises = (a > 0.0) == (direction == Direction::Up);
            match self.problem.row_sense(i) {
                RowSense::Le => activity_rises && room_down.is_finite(),
                RowSense::Ge => !activity_rises && room_up.is_finite(),
                RowSense::Eq if activity_rises => room_down.is_finite(),
                RowSense::Eq => room_up.is_finite(),
            }
        })
    }

    fn covers(&self, i: usize) -> bool {
        self.singletons.is_some_and(|index| index.has_singletons(i))
    }

    /// How far row `i`'s singleton aggregate can still fall and rise.
    fn singleton_room(&self, state: &SolutionState, i: usize) -> (f64, f64) {
        match self.singletons {
            Some(index) if index.has_singletons(i) => {
                let v = state.ss_val[i];
                ((v - index.lower(i)).max(0.0), (index.upper(i) - v).max(0.0))
            }
            _ => (0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ObjSense, VarKind};

    const TOL: f64 = 1e-6;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_le_row_caps_up_shift() {
        // x1 <= 3.4, x1 = 3.4
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x1", 0.0, 5.0, 1.0, VarKind::Integer);
        b.add_constraint("c", [(x, 1.0)], RowSense::Le, 3.4);
        let p = b.build().unwrap();
        let state = SolutionState::new(&p, None, &[3.4], TOL).unwrap();

        let shifts = DeltaCalculator::new(&p, None, TOL).compute_shifts(&state, x, 1e-5);
        assert_eq!(shifts.up, 0.0);
        assert!(close(shifts.down, 0.4), "down = {}", shifts.down);
    }

    #[test]
    fn test_ge_row_with_negative_coefficient() {
        // -2x >= -7  (x <= 3.5), x = 2.5: room 2 in activity, so x may rise 1 (capped by reach 0.5)
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, 10.0, 1.0, VarKind::Integer);
        b.add_constraint("c", [(x, -2.0)], RowSense::Ge, -7.0);
        let p = b.build().unwrap();
        let state = SolutionState::new(&p, None, &[2.5], TOL).unwrap();

        let shifts = DeltaCalculator::new(&p, None, TOL).compute_shifts(&state, x, 1e-5);
        assert!(close(shifts.up, 0.5));
        assert!(close(shifts.down, 0.5));
    }

    #[test]
    fn test_slack_limits_partial_shift() {
        // 4x + y <= 10.2, x = 2.5, y = 0: slack 0.2 lets x rise 0.05
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, 10.0, 1.0, VarKind::Integer);
        let y = b.add_variable("y", 0.0, 10.0, 1.0, VarKind::Integer);
        b.add_constraint("c", [(x, 4.0), (y, 1.0)], RowSense::Le, 10.2);
        let p = b.build().unwrap();
        let state = SolutionState::new(&p, None, &[2.5, 0.0], TOL).unwrap();

        let shifts = DeltaCalculator::new(&p, None, TOL).compute_shifts(&state, x, 1e-5);
        assert!(close(shifts.up, 0.05), "up = {}", shifts.up);
        assert!(close(shifts.down, 0.5));
    }

    #[test]
    fn test_equality_without_singletons_blocks() {
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, 10.0, 1.0, VarKind::Integer);
        let y = b.add_variable("y", 0.0, 10.0, 1.0, VarKind::Integer);
        b.add_constraint("e", [(x, 1.0), (y, 1.0)], RowSense::Eq, 5.0);
        let p = b.build().unwrap();
        let state = SolutionState::new(&p, None, &[2.5, 2.5], TOL).unwrap();

        let shifts = DeltaCalculator::new(&p, None, TOL).compute_shifts(&state, x, 1e-5);
        assert!(shifts.is_zero());
    }

    #[test]
    fn test_equality_with_singletons_uses_reservoir() {
        // x + s = 5, s in [0, 2.2], x = 2.8, s = 2.2: s can only fall,
        // so x can rise to 3 but cannot fall at all
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, 10.0, 1.0, VarKind::Integer);
        let s = b.add_variable("s", 0.0, 2.2, 0.0, VarKind::Continuous);
        b.add_constraint("e", [(x, 1.0), (s, 1.0)], RowSense::Eq, 5.0);
        let p = b.build().unwrap();
        let index = SingletonIndex::build(&p);
        let state = SolutionState::new(&p, Some(&index), &[2.8, 2.2], TOL).unwrap();

        let shifts = DeltaCalculator::new(&p, Some(&index), TOL).compute_shifts(&state, x, 1e-5);
        assert!(close(shifts.up, 0.2), "up = {}", shifts.up);
        assert!(close(shifts.down, 0.0), "down = {}", shifts.down);
    }

    #[test]
    fn test_integral_value_moves_at_most_one() {
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, 10.0, 1.0, VarKind::Integer);
        let p = b.build().unwrap();
        let state = SolutionState::new(&p, None, &[4.0], TOL).unwrap();

        let shifts = DeltaCalculator::new(&p, None, TOL).compute_shifts(&state, x, 1.0);
        assert_eq!(shifts, Shifts { up: 1.0, down: 1.0 });
    }

    #[test]
    fn test_epsilon_clipping_zeroes_both() {
        // slack of 0.5 only lets an integral x move half a unit either way
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, 10.0, 1.0, VarKind::Integer);
        let y = b.add_variable("y", 0.0, 10.0, 1.0, VarKind::Continuous);
        b.add_constraint("hi", [(x, 1.0), (y, 1.0)], RowSense::Le, 4.5);
        b.add_constraint("lo", [(x, 1.0), (y, 1.0)], RowSense::Ge, 3.5);
        let p = b.build().unwrap();
        let state = SolutionState::new(&p, None, &[4.0, 0.0], TOL).unwrap();

        let shifts = DeltaCalculator::new(&p, None, TOL).compute_shifts(&state, x, 1.0);
        assert!(shifts.is_zero());
    }

    #[test]
    fn test_direction_limits() {
        // x free above, y free below; only x's row caps its rise
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, f64::INFINITY, -1.0, VarKind::Integer);
        let y = b.add_variable("y", f64::NEG_INFINITY, 0.0, 1.0, VarKind::Integer);
        let z = b.add_variable("z", 0.0, f64::INFINITY, -1.0, VarKind::Integer);
        b.add_constraint("c", [(x, 2.0), (y, -1.0)], RowSense::Le, 9.0);
        b.add_constraint("d", [(z, 1.0)], RowSense::Ge, 1.0);
        let p = b.build().unwrap();
        let state = SolutionState::new(&p, None, &[1.0, -1.0, 2.0], TOL).unwrap();
        let delta = DeltaCalculator::new(&p, None, TOL);

        assert!(delta.is_limited(&state, x, Direction::Up));
        assert!(delta.is_limited(&state, x, Direction::Down));
        // y falling raises row c's activity
        assert!(delta.is_limited(&state, y, Direction::Down));
        // a >= row never caps a rise
        assert!(!delta.is_limited(&state, z, Direction::Up));
    }

    #[test]
    fn test_unbounded_singletons_do_not_limit() {
        // x + s <= 4 with s free below: s can always make room
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, f64::INFINITY, -1.0, VarKind::Integer);
        let s = b.add_variable("s", f64::NEG_INFINITY, 0.0, 0.0, VarKind::Continuous);
        b.add_constraint("c", [(x, 1.0), (s, 1.0)], RowSense::Le, 4.0);
        let p = b.build().unwrap();
        let index = SingletonIndex::build(&p);
        let state = SolutionState::new(&p, Some(&index), &[2.0, 0.0], TOL).unwrap();

        assert!(DeltaCalculator::new(&p, None, TOL).is_limited(&state, x, Direction::Up));
        assert!(!DeltaCalculator::new(&p, Some(&index), TOL).is_limited(&state, x, Direction::Up));
    }

    #[test]
    fn test_slightly_negative_slack_is_clipped() {
        let mut b = Problem::builder(ObjSense::Minimize);
        let x = b.add_variable("x", 0.0, 10.0, 1.0, VarKind::Integer);
        b.add_constraint("c", [(x, 1.0)], RowSense::Le, 2.5);
        let p = b.build().unwrap();
        let state = SolutionState::new(&p, None, &[2.5000001], TOL).unwrap();

        let shifts = DeltaCalculator::new(&p, None, TOL).compute_shifts(&state, x, 1e-5);
        assert_eq!(shifts.up, 0.0);
        assert!(shifts.down > 0.49);
    }
}
