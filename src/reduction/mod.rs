// Averaged and integrated outputs are computed from a running time integral.
//
// The integral is advanced once per completed integrator step with the
// rectangular rule, using the value at the end of the step:
//
//     I(t_end) = I(t_start) + v(t_end) * (t_end - t_start)
//
// Output instants normally fall between two completed steps. The integral at
// the output instant is interpolated linearly between the last two step
// values:
//
//     alpha  = (t_out - t_start) / (t_end - t_start)
//     I(t_out) = I(t_end) * alpha + I(t_start) * (1 - alpha)
//
// Averages are the integral difference since the previous output instant,
// divided by the elapsed time. All values are in base units; conversion to the
// display unit is left to the caller.

use crate::request::ReductionKind;
use crate::validation_utils::{fuzzy_eq, fuzzy_le};

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Uninitialized,
    Tracking {
        t_start: f64,
        t_end: f64,
        integral_start: f64,
        integral_end: f64,
    },
}

/// Running time integral of one reduced output column.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    state: State,
    last_output_time: f64,
    last_output_integral: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator {
            state: State::Uninitialized,
            last_output_time: 0.0,
            last_output_integral: 0.0,
        }
    }

    /// Advances the integral to step time `t`, where `value` is the quantity's
    /// value at `t`.
    ///
    /// # Panics
    ///
    /// Panics when `t` lies before the previously completed step.
    pub fn step_completed(&mut self, t: f64, value: f64) {
        match self.state {
            State::Uninitialized => {
                self.state = State::Tracking {
                    t_start: t,
                    t_end: t,
                    integral_start: 0.0,
                    integral_end: 0.0,
                };
                self.last_output_time = t;
                self.last_output_integral = 0.0;
            }
            State::Tracking {
                t_end, integral_end, ..
            } => {
                assert!(
                    t >= t_end,
                    "step completed at t={} before the previous step at t={}",
                    t,
                    t_end
                );
                self.state = State::Tracking {
                    t_start: t_end,
                    t_end: t,
                    integral_start: integral_end,
                    integral_end: integral_end + value * (t - t_end),
                };
            }
        }
    }

    /// Computes the reduced value at output instant `t_out`, where `current`
    /// is the quantity's instantaneous value.
    ///
    /// For [`ReductionKind::Average`] the output instant becomes the start of
    /// the next averaging window.
    ///
    /// # Panics
    ///
    /// Panics when no step was completed yet, or when `t_out` lies outside the
    /// last completed step.
    pub fn sample(&mut self, t_out: f64, current: f64, kind: ReductionKind) -> f64 {
        let State::Tracking {
            t_start,
            t_end,
            integral_start,
            integral_end,
        } = self.state
        else {
            panic!("output requested at t={} before the first completed step", t_out);
        };
        assert!(
            fuzzy_le(t_start, t_out) && fuzzy_le(t_out, t_end),
            "output time t={} outside of last step interval [{}, {}]",
            t_out,
            t_start,
            t_end
        );

        if kind == ReductionKind::Instantaneous {
            return current;
        }

        let integral = if fuzzy_eq(t_start, t_end) {
            integral_end
        } else {
            let alpha = ((t_out - t_start) / (t_end - t_start)).clamp(0.0, 1.0);
            integral_end * alpha + integral_start * (1.0 - alpha)
        };

        if kind == ReductionKind::Integral {
            return integral;
        }

        let average = if fuzzy_eq(t_out, self.last_output_time) {
            current
        } else {
            (integral - self.last_output_integral) / (t_out - self.last_output_time)
        };
        self.last_output_time = t_out;
        self.last_output_integral = integral;
        average
    }
}
