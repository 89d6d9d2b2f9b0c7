use crate::delta::Shifts;
use crate::numeric::fractionality;
use crate::problem::ObjSense;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Up,
    Down,
}

/// A shift of one variable by `amount >= 0` in `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    pub direction: Direction,
    pub amount: f64,
}

impl Move {
    pub fn up(amount: f64) -> Self {
        Self {
            direction: Direction::Up,
            amount,
        }
    }

    pub fn down(amount: f64) -> Self {
        Self {
            direction: Direction::Down,
            amount,
        }
    }

    pub fn signed(&self) -> f64 {
        match self.direction {
            Direction::Up => self.amount,
            Direction::Down => -self.amount,
        }
    }
}

/// Which way equally-rounding fractional moves are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TieBreak {
    #[default]
    BestObjective,
    WorstObjective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither direction has room
    NoRoom,
    /// Value is integral and integral shifts are disabled
    IntegralDisabled,
    /// Integral shifts wait until every variable is rounded
    AwaitingZeroFractionality,
    /// Neither direction reduces fractionality
    NoFractionalityGain,
}

/// First-stage verdict for one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proposal {
    Skip(SkipReason),
    Shift(Move),
    /// The choice depends on the objective change of each candidate amount.
    CompareObjective {
        up: Option<f64>,
        down: Option<f64>,
        fractional: bool,
    },
}

/// Candidate move with the objective change it would cause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub amount: f64,
    pub objective_change: f64,
}

/// The ZI-Round decision rules.
///
/// Deciding is split in two so that objective changes, which need a dry run
/// through the slack updater, are only computed when a rule asks for them:
/// [`RoundingPolicy::propose`] looks at shifts and fractionality only, and
/// [`RoundingPolicy::choose`] settles a [`Proposal::CompareObjective`].
#[derive(Debug, Clone, Copy)]
pub struct RoundingPolicy {
    sense: ObjSense,
    tie_break: TieBreak,
    shift_non_fractional: bool,
    wait_for_zero_fractionality: bool,
    tolerance: f64,
}

impl RoundingPolicy {
    pub fn new(sense: ObjSense, tie_break: TieBreak, tolerance: f64) -> Self {
        Self {
            sense,
            tie_break,
            shift_non_fractional: false,
            wait_for_zero_fractionality: false,
            tolerance,
        }
    }

    pub fn with_shift_non_fractional(mut self, enabled: bool) -> Self {
        self.shift_non_fractional = enabled;
        self
    }

    pub fn with_wait_for_zero_fractionality(mut self, enabled: bool) -> Self {
        self.wait_for_zero_fractionality = enabled;
        self
    }

    pub fn propose(&self, x: f64, shifts: Shifts, num_to_round: usize) -> Proposal {
        if shifts.is_zero() {
            return Proposal::Skip(SkipReason::NoRoom);
        }

        let tol = self.tolerance;
        let zi = fractionality(x);

        if zi <= tol {
            if !self.shift_non_fractional {
                return Proposal::Skip(SkipReason::IntegralDisabled);
            }
            if self.wait_for_zero_fractionality && num_to_round > 0 {
                return Proposal::Skip(SkipReason::AwaitingZeroFractionality);
            }
            let up = (shifts.up >= 1.0 - tol).then_some(1.0);
            let down = (shifts.down >= 1.0 - tol).then_some(1.0);
            if up.is_none() && down.is_none() {
                return Proposal::Skip(SkipReason::NoRoom);
            }
            return Proposal::CompareObjective {
                up,
                down,
                fractional: false,
            };
        }

        let zi_plus = fractionality(x + shifts.up);
        let zi_minus = fractionality(x - shifts.down);

        if (zi_plus - zi_minus).abs() <= tol && zi_plus < zi - tol {
            Proposal::CompareObjective {
                up: Some(shifts.up),
                down: Some(shifts.down),
                fractional: true,
            }
        } else if zi_plus < zi_minus && zi_plus < zi - tol {
            Proposal::Shift(Move::up(shifts.up))
        } else if zi_minus < zi_plus && zi_minus < zi - tol {
            Proposal::Shift(Move::down(shifts.down))
        } else {
            Proposal::Skip(SkipReason::NoFractionalityGain)
        }
    }

    /// Picks between candidates by objective.
    ///
    /// Fractional ties follow the configured [`TieBreak`]. Unit moves of an
    /// integral variable are only taken when they strictly improve the
    /// objective, or, when `neutral_up_allowed`, as an up move that changes
    /// nothing.
    pub fn choose(
        &self,
        up: Option<Candidate>,
        down: Option<Candidate>,
        fractional: bool,
        neutral_up_allowed: bool,
    ) -> Option<Move> {
        if fractional {
            return match (up, down) {
                (Some(u), Some(d)) => Some(self.break_tie(u, d)),
                (Some(u), None) => Some(Move::up(u.amount)),
                (None, Some(d)) => Some(Move::down(d.amount)),
                (None, None) => None,
            };
        }

        let tol = self.tolerance;
        let gain_up = up.map(|u| self.sense.gain(u.objective_change));
        let gain_down = down.map(|d| self.sense.gain(d.objective_change));
        match (gain_up.filter(|&g| g > tol), gain_down.filter(|&g| g > tol)) {
            (Some(gu), Some(gd)) => {
                if gu > gd + tol {
                    up.map(|u| Move::up(u.amount))
                } else {
                    down.map(|d| Move::down(d.amount))
                }
            }
            (Some(_), None) => up.map(|u| Move::up(u.amount)),
            (None, Some(_)) => down.map(|d| Move::down(d.amount)),
            (None, None) => up
                .filter(|u| neutral_up_allowed && u.objective_change.abs() <= tol)
                .map(|u| Move::up(u.amount)),
        }
    }

    fn break_tie(&self, up: Candidate, down: Candidate) -> Move {
        let tol = self.tolerance;
        let both_zero = up.objective_change.abs() <= tol && down.objective_change.abs() <= tol;
        let gain_up = self.sense.gain(up.objective_change);
        let gain_down = self.sense.gain(down.objective_change);
        let tied = (gain_up - gain_down).abs() <= tol;

        let go_up = match self.tie_break {
            TieBreak::BestObjective => {
                if both_zero {
                    true
                } else if tied {
                    false
                } else {
                    gain_up > gain_down
                }
            }
            TieBreak::WorstObjective => {
                if both_zero {
                    false
                } else if tied {
                    true
                } else {
                    gain_up < gain_down
                }
            }
        };

        if go_up {
            Move::up(up.amount)
        } else {
            Move::down(down.amount)
        }
    }
}
