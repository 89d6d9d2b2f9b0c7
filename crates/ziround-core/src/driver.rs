use std::time::Instant;

use crate::check;
use crate::config::RoundingConfig;
use crate::delta::DeltaCalculator;
use crate::error::RoundingError;
use crate::numeric::{fractionality, snap};
use crate::policy::{Candidate, Direction, Proposal, RoundingPolicy, TieBreak};
use crate::problem::Problem;
use crate::singleton::SingletonIndex;
use crate::slack::SlackUpdater;
use crate::solution::{PassSummary, RoundingOutcome, Termination};
use crate::state::SolutionState;

/// ZI-Round driver: scans the integral variables in column order, shifting
/// each toward integrality as far as the remaining slack allows, until a
/// full pass changes nothing.
#[derive(Debug, Clone)]
pub struct Rounder<'a> {
    problem: &'a Problem,
    singletons: Option<SingletonIndex>,
    config: RoundingConfig,
}

/// The three per-variable components, borrowed for one run.
struct Components<'r> {
    delta: DeltaCalculator<'r>,
    policy: RoundingPolicy,
    updater: SlackUpdater<'r>,
}

/// Counters of a finished [`Rounder::round`] call.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rounds: usize,
    pub shifts: usize,
    pub termination: Termination,
    pub history: Vec<PassSummary>,
}

impl<'a> Rounder<'a> {
    pub fn new(problem: &'a Problem, config: RoundingConfig) -> Result<Self, RoundingError> {
        config.validate()?;
        let singletons = config
            .singletons_enabled
            .then(|| SingletonIndex::build(problem));
        Ok(Self {
            problem,
            singletons,
            config,
        })
    }

    pub fn config(&self) -> &RoundingConfig {
        &self.config
    }

    pub fn singletons(&self) -> Option<&SingletonIndex> {
        self.singletons.as_ref()
    }

    /// State for `start`, validated against bounds and rows.
    pub fn initial_state(&self, start: &[f64]) -> Result<SolutionState, RoundingError> {
        SolutionState::new(
            self.problem,
            self.singletons.as_ref(),
            start,
            self.config.tolerance,
        )
    }

    /// Rounds `start` and reports the final point.
    pub fn run(&self, start: &[f64]) -> Result<RoundingOutcome, RoundingError> {
        let mut state = self.initial_state(start)?;
        let summary = self.round(&mut state)?;
        Ok(RoundingOutcome {
            objective_value: state.objective_value(),
            fractionality: state.fractionality(),
            num_unrounded: state.num_to_round(),
            values: state.into_values(),
            rounds: summary.rounds,
            shifts: summary.shifts,
            termination: summary.termination,
            history: summary.history,
        })
    }

    /// Runs passes over `state` until a fixpoint or a configured limit.
    pub fn round(&self, state: &mut SolutionState) -> Result<RunSummary, RoundingError> {
        let config = &self.config;
        let tie_break = if config.fractional_tie_break_worst_objective {
            TieBreak::WorstObjective
        } else {
            TieBreak::BestObjective
        };
        let parts = Components {
            delta: DeltaCalculator::new(self.problem, self.singletons.as_ref(), config.tolerance),
            policy: RoundingPolicy::new(self.problem.sense(), tie_break, config.tolerance)
                .with_shift_non_fractional(config.shift_non_fractional_vars)
                .with_wait_for_zero_fractionality(config.wait_until_zero_fractionality),
            updater: SlackUpdater::new(self.problem, self.singletons.as_ref(), config.tolerance),
        };

        let started = Instant::now();
        let mut rounds = 0;
        let mut shifts = 0;
        let mut history = Vec::new();

        let termination = loop {
            if config.max_rounds > 0 && rounds >= config.max_rounds {
                break Termination::RoundLimit;
            }
            if let Some(limit) = config.time_limit {
                if started.elapsed() >= limit {
                    break Termination::TimeLimit;
                }
            }

            let pass_shifts = self.pass(&parts, state)?;
            rounds += 1;
            shifts += pass_shifts;
            history.push(PassSummary {
                round: rounds,
                shifts: pass_shifts,
                objective_value: state.objective_value(),
                fractionality: state.fractionality(),
                num_to_round: state.num_to_round(),
            });
            tracing::debug!(
                round = rounds,
                shifts = pass_shifts,
                objval = state.objective_value(),
                fractionality = state.fractionality(),
                num_to_round = state.num_to_round(),
                "finished rounding pass"
            );

            if config.audit {
                check::audit(self.problem, self.singletons.as_ref(), state, config.tolerance)?;
            }
            if pass_shifts == 0 {
                break Termination::Fixpoint;
            }
        };

        tracing::debug!(rounds, shifts, ?termination, "rounding finished");
        Ok(RunSummary {
            rounds,
            shifts,
            termination,
            history,
        })
    }

    fn pass(&self, parts: &Components<'_>, state: &mut SolutionState) -> Result<usize, RoundingError> {
        let mut shifted = 0;
        for j in 0..self.problem.ncols() {
            if !self.problem.is_integral(j) || self.problem.is_fixed(j) {
                continue;
            }
            if self.visit(parts, state, j)? {
                shifted += 1;
            }
        }
        Ok(shifted)
    }

    /// Handles one variable; returns whether it moved.
    fn visit(&self, parts: &Components<'_>, state: &mut SolutionState, j: usize) -> Result<bool, RoundingError> {
        let tol = self.config.tolerance;
        let x = state.x[j];
        let before = fractionality(x);
        let epsilon = if before > tol { self.config.shift_epsilon } else { 1.0 };

        let shifts = parts.delta.compute_shifts(state, j, epsilon);
        let chosen = match parts.policy.propose(x, shifts, state.num_to_round()) {
            Proposal::Skip(reason) => {
                tracing::trace!(var = self.problem.var_name(j), ?reason, "skipped");
                return Ok(false);
            }
            Proposal::Shift(chosen) => chosen,
            Proposal::CompareObjective {
                up,
                down,
                fractional,
            } => {
                let view: &SolutionState = state;
                // a unit move toward an unlimited side could repeat forever
                let up = up.filter(|_| fractional || parts.delta.is_limited(view, j, Direction::Up));
                let down = down.filter(|_| fractional || parts.delta.is_limited(view, j, Direction::Down));
                let candidate = |amount: f64, signed: f64| -> Result<Candidate, RoundingError> {
                    Ok(Candidate {
                        amount,
                        objective_change: parts.updater.objective_change(view, j, signed)?,
                    })
                };
                let up = up.map(|a| candidate(a, a)).transpose()?;
                let down = down.map(|a| candidate(a, -a)).transpose()?;
                let neutral_up_allowed =
                    self.problem.objective(j) == 0.0 && self.problem.upper(j).is_finite();
                match parts.policy.choose(up, down, fractional, neutral_up_allowed) {
                    Some(chosen) => chosen,
                    None => return Ok(false),
                }
            }
        };

        let target = snap(x + chosen.signed(), tol);
        let signed = target - x;
        if signed == 0.0 {
            return Ok(false);
        }

        parts.updater.check_shift(state, j, signed)?;
        parts.updater.apply_shift(state, j, signed)?;
        let after = fractionality(state.x[j]);
        state.record_rounding(before, after, tol);

        tracing::trace!(
            var = self.problem.var_name(j),
            from = x,
            to = state.x[j],
            direction = ?chosen.direction,
            "shifted"
        );
        Ok(true)
    }
}
