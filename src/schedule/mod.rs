//! # Output Grids
//!
//! A schedule (output grid) is a named sampling timetable made of one or more
//! consecutive intervals. Each interval samples every `stepSize`, starting at
//! its start time and ending at (and including) its end time.
//!
//! ## Quick Start
//!
//! ```rust
//! use simout::schedule::{Interval, Schedule};
//!
//! let grid = Schedule::new(
//!     "hourly",
//!     vec![Interval::from_seconds(None, Some(86400.0), Some(3600.0))],
//! );
//! let active = grid.activate().unwrap();
//!
//! assert!(active.is_active(7200.0));
//! assert!(!active.is_active(7000.0));
//! assert_eq!(active.next_output_time(7000.0), 7200.0);
//! ```
//!
//! ## Interval Defaults
//!
//! - The first interval starts at 0 when no start is given.
//! - Later intervals without a start begin where the previous interval ends.
//! - An interval without end ends where the next one starts; the last one
//!   lasts forever.

pub mod validation;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{ErrorContext, IntoOutputError, OutputError},
    types::{Validate, ValidationResult},
    units::Parameter,
    validation_utils::{fuzzy_eq, fuzzy_le},
};

/// One interval of an output grid, as declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(rename = "@start", default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Parameter>,
    #[serde(rename = "@end", default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Parameter>,
    #[serde(rename = "@stepSize", default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<Parameter>,
}

impl Interval {
    /// Builds an interval from values in seconds.
    pub fn from_seconds(start: Option<f64>, end: Option<f64>, step_size: Option<f64>) -> Self {
        Interval {
            start: start.map(Parameter::seconds),
            end: end.map(Parameter::seconds),
            step_size: step_size.map(Parameter::seconds),
        }
    }
}

/// A named output grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "Interval", default)]
    pub intervals: Vec<Interval>,
}

impl Schedule {
    pub fn new<S: Into<String>>(name: S, intervals: Vec<Interval>) -> Self {
        Schedule {
            name: name.into(),
            intervals,
        }
    }

    /// Validates the interval definitions and pre-computes the sampling
    /// bounds of every interval.
    pub fn activate(&self) -> Result<ActiveSchedule, OutputError> {
        let context = ErrorContext::new().with_parsing(format!("output grid '{}'", self.name));
        if let Some(err) = self.validate().into_output_error(context) {
            return Err(err);
        }

        let intervals = (0..self.intervals.len())
            .filter_map(|i| {
                let (start, end) = validation::interval_bounds(&self.intervals, i).ok()?;
                let step = self.intervals[i].step_size?.value_in_base();
                Some(ActiveInterval { start, end, step })
            })
            .collect();

        Ok(ActiveSchedule {
            name: self.name.clone(),
            intervals,
        })
    }
}

impl Validate for Schedule {
    fn validate(&self) -> ValidationResult {
        validation::validate(self)
    }
}

/// Interval bounds and step size in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveInterval {
    pub start: f64,
    /// `f64::MAX` for an open-ended last interval.
    pub end: f64,
    pub step: f64,
}

impl ActiveInterval {
    fn contains(&self, t: f64) -> bool {
        fuzzy_le(self.start, t) && fuzzy_le(t, self.end)
    }

    fn is_on_grid(&self, t: f64) -> bool {
        let step_number = ((t - self.start) / self.step).round();
        fuzzy_eq(self.start + step_number * self.step, t)
    }
}

/// A validated output grid with pre-computed interval bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSchedule {
    name: String,
    intervals: Vec<ActiveInterval>,
}

impl ActiveSchedule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn intervals(&self) -> &[ActiveInterval] {
        &self.intervals
    }

    /// True when `t` (seconds) is a sampling instant of this grid.
    pub fn is_active(&self, t: f64) -> bool {
        self.intervals
            .iter()
            .any(|interval| interval.contains(t) && interval.is_on_grid(t))
    }

    /// The first sampling instant strictly after `t`, or `f64::MAX` when the
    /// grid has no more instants.
    pub fn next_output_time(&self, t: f64) -> f64 {
        for interval in &self.intervals {
            if interval.contains(t) {
                let step_number = ((t - interval.start) / interval.step).floor() + 1.0;
                let mut next = interval.start + step_number * interval.step;
                // t may sit a rounding error below a grid point
                while fuzzy_le(next, t) {
                    next += interval.step;
                }
                if fuzzy_le(next, interval.end) {
                    return next;
                }
            } else if t < interval.start {
                return interval.start;
            }
        }
        f64::MAX
    }

    /// All sampling instants, in increasing order.
    pub fn instants(&self) -> Instants<'_> {
        Instants {
            schedule: self,
            next: self.intervals.first().map(|interval| interval.start),
        }
    }
}

/// Iterator over the sampling instants of an [`ActiveSchedule`].
#[derive(Debug, Clone)]
pub struct Instants<'a> {
    schedule: &'a ActiveSchedule,
    next: Option<f64>,
}

impl Iterator for Instants<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let current = self.next?;
        let following = self.schedule.next_output_time(current);
        self.next = (following < f64::MAX).then_some(following);
        Some(current)
    }
}
