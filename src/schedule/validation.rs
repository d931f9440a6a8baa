use super::{Interval, Schedule};
use crate::{
    types::ValidationResult,
    units::Parameter,
    validation_utils::{_chain, _return, fuzzy_eq, validate_finite, validate_name},
};

pub fn validate(schedule: &Schedule) -> ValidationResult {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    _chain(validate_name(&schedule.name, "Output grid"), &mut warnings, &mut errors);

    if schedule.intervals.is_empty() {
        errors.push(format!(
            "Output grid '{}' does not have any intervals.",
            schedule.name
        ));
        return _return(warnings, errors);
    }

    let mut previous_end: Option<f64> = None;
    for (i, interval) in schedule.intervals.iter().enumerate() {
        let w = &mut warnings;
        let e = &mut errors;

        _chain(validate_time_parameters(interval, i, &schedule.name), w, e);

        match interval.step_size {
            None => e.push(format!(
                "Interval #{} in output grid '{}' does not have a StepSize parameter.",
                i + 1,
                schedule.name
            )),
            Some(step) if step.value_in_base() <= 0.0 => e.push(format!(
                "StepSize parameter of interval #{} in output grid '{}' is <= 0 (which is invalid).",
                i + 1,
                schedule.name
            )),
            Some(_) => {}
        }

        let (start, end) = match interval_bounds(&schedule.intervals, i) {
            Ok(bounds) => bounds,
            Err(message) => {
                e.push(format!("{} (output grid '{}')", message, schedule.name));
                continue;
            }
        };

        if end <= start {
            e.push(format!(
                "Interval #{} in output grid '{}' has a Start that lies past the interval End.",
                i + 1,
                schedule.name
            ));
        }

        if let Some(previous_end) = previous_end {
            if start < previous_end && !fuzzy_eq(start, previous_end) {
                e.push(format!(
                    "Interval #{} in output grid '{}' starts before interval #{} ends.",
                    i + 1,
                    schedule.name,
                    i
                ));
            }
        }
        previous_end = Some(end);
    }

    _return(warnings, errors)
}

fn validate_time_parameters(interval: &Interval, index: usize, grid: &str) -> ValidationResult {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let parameters = [
        ("Start", interval.start),
        ("End", interval.end),
        ("StepSize", interval.step_size),
    ];
    for (name, parameter) in parameters {
        let Some(parameter) = parameter else {
            continue;
        };
        if !parameter.unit.is_time() {
            errors.push(format!(
                "Parameter '{}' of interval #{} in output grid '{}' has unit '{}', which is not a unit of time.",
                name,
                index + 1,
                grid,
                parameter.unit
            ));
        }
        let what = format!("Parameter '{}' of interval #{}", name, index + 1);
        _chain(validate_finite(parameter.value, &what), &mut warnings, &mut errors);
    }

    _return(warnings, errors)
}

fn base_value(parameter: Option<Parameter>) -> Option<f64> {
    parameter.map(|p| p.value_in_base())
}

/// Start and end (seconds) of interval `index`, applying the defaulting rules.
pub(crate) fn interval_bounds(intervals: &[Interval], index: usize) -> Result<(f64, f64), String> {
    let interval = &intervals[index];

    let start = match base_value(interval.start) {
        Some(start) => start,
        None if index == 0 => 0.0,
        None => base_value(intervals[index - 1].end).ok_or_else(|| {
            format!(
                "'End' parameter in interval #{}, or Start parameter in interval #{} is required",
                index,
                index + 1
            )
        })?,
    };

    let end = match base_value(interval.end) {
        Some(end) => end,
        None if index + 1 == intervals.len() => f64::MAX,
        None => base_value(intervals[index + 1].start).ok_or_else(|| {
            format!(
                "'End' parameter in interval #{}, or Start parameter in interval #{} is required",
                index + 1,
                index + 2
            )
        })?,
    };

    Ok((start, end))
}
