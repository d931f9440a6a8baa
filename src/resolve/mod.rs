//! Resolves output definitions against output grids and object lists and
//! groups them into output streams (one file each).
//!
//! Definitions with an explicit file name are grouped by that name. All
//! others are classified:
//!
//! | Condition                                        | Stream           |
//! |--------------------------------------------------|------------------|
//! | object list over `Location` or `Sensor`          | `loads`          |
//! | quantity is a state variable                     | `states`         |
//! | quantity is a flux, reduced by `Integral`        | `flux_integrals` |
//! | quantity is a flux                               | `fluxes`         |
//! | anything else                                    | `misc`           |
//!
//! When unnamed definitions use more than one output grid, the grid name is
//! appended (`states_hourly`). An automatic stream whose name is also used as
//! an explicit file name gets the grid suffix as well.

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use log::{info, warn};

use crate::{
    errors::{ErrorContext, IntoOutputError, OutputError},
    filter::EntityFilter,
    request::{ReductionKind, Request},
    schedule::{ActiveSchedule, Schedule},
    types::{Validate, WithWarnings},
};

/// File extension of all output streams.
pub const STREAM_EXTENSION: &str = "tsv";

/// Quantities reported in the `states` stream.
const STATE_QUANTITIES: &[&str] = &["Temperature"];

/// Quantities reported in the `fluxes` and `flux_integrals` streams.
const FLUX_QUANTITIES: &[&str] = &["ConvectiveHeatFluxDensity"];

/// Automatic classification of unnamed output definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamCategory {
    States,
    Loads,
    Fluxes,
    FluxIntegrals,
    Misc,
}

impl StreamCategory {
    pub fn classify(request: &Request, filter: &EntityFilter) -> StreamCategory {
        let name = request.quantity.name.as_str();
        if filter.category.is_boundary_condition() {
            StreamCategory::Loads
        } else if STATE_QUANTITIES.contains(&name) {
            StreamCategory::States
        } else if FLUX_QUANTITIES.contains(&name) {
            if request.reduction == ReductionKind::Integral {
                StreamCategory::FluxIntegrals
            } else {
                StreamCategory::Fluxes
            }
        } else {
            StreamCategory::Misc
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamCategory::States => "states",
            StreamCategory::Loads => "loads",
            StreamCategory::Fluxes => "fluxes",
            StreamCategory::FluxIntegrals => "flux_integrals",
            StreamCategory::Misc => "misc",
        }
    }
}

impl fmt::Display for StreamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An output definition together with its resolved object list.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRequest {
    /// Position of the definition in the input, used in diagnostics.
    pub index: usize,
    pub request: Request,
    pub filter: EntityFilter,
}

/// One output file: its name, grid and the definitions writing to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamPlan {
    pub name: String,
    pub schedule: ActiveSchedule,
    pub requests: Vec<PlannedRequest>,
}

impl StreamPlan {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, STREAM_EXTENSION)
    }
}

fn find_schedule<'a>(
    index: usize,
    request: &Request,
    schedules: &'a [Schedule],
) -> Result<&'a Schedule, OutputError> {
    let name = request.schedule.trim();
    if name.is_empty() {
        return Err(OutputError::EmptyReference {
            index,
            what: "output grid",
        });
    }
    schedules
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| OutputError::UnknownSchedule {
            index,
            name: name.to_string(),
        })
}

fn find_filter<'a>(
    index: usize,
    request: &Request,
    filters: &'a [EntityFilter],
) -> Result<&'a EntityFilter, OutputError> {
    let name = request.filter.trim();
    if name.is_empty() {
        return Err(OutputError::EmptyReference {
            index,
            what: "object list",
        });
    }
    filters
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| OutputError::UnknownEntityFilter {
            index,
            name: name.to_string(),
        })
}

fn check_unique_names<'a, I>(names: I, what: &str) -> Result<(), OutputError>
where
    I: IntoIterator<Item = &'a str>,
{
    if let Some(duplicate) = names.into_iter().duplicates().next() {
        return Err(OutputError::Config {
            message: format!("Duplicate {} name '{}'", what, duplicate),
            context: ErrorContext::new(),
        });
    }
    Ok(())
}

/// Resolves all output definitions and groups them into streams.
///
/// Streams are returned in order of their first definition. The warnings name
/// output grids that no definition uses, and object lists that select nothing.
pub fn resolve(
    requests: &[Request],
    schedules: &[Schedule],
    filters: &[EntityFilter],
) -> Result<WithWarnings<Vec<StreamPlan>, String>, OutputError> {
    check_unique_names(schedules.iter().map(|s| s.name.as_str()), "output grid")?;
    check_unique_names(filters.iter().map(|f| f.name.as_str()), "object list")?;

    let mut warnings = Vec::new();

    let mut resolved = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        let schedule = find_schedule(index, request, schedules)?;
        let filter = find_filter(index, request, filters)?;
        resolved.push((index, request, schedule, filter));
    }

    let used_schedules: BTreeSet<&str> = resolved.iter().map(|(_, _, s, _)| s.name.as_str()).collect();
    for schedule in schedules {
        if !used_schedules.contains(schedule.name.as_str()) {
            let message = format!(
                "Output grid '{}' is not used by any output definition and is ignored.",
                schedule.name
            );
            warn!("{}", message);
            warnings.push(message);
        }
    }

    let mut checked_filters = BTreeSet::new();
    for (_, _, _, filter) in &resolved {
        if !checked_filters.insert(filter.name.as_str()) {
            continue;
        }
        let result = filter.validate();
        for warning in result.warnings() {
            warn!("{}", warning);
            warnings.push(warning.clone());
        }
        let context = ErrorContext::new().with_parsing(format!("object list '{}'", filter.name));
        if let Some(err) = result.into_output_error(context) {
            return Err(err);
        }
    }

    // grid suffixes are only needed when automatic streams use several grids
    let unnamed_grids = resolved
        .iter()
        .filter(|(_, request, _, _)| request.stream_name().is_none())
        .map(|(_, _, schedule, _)| schedule.name.as_str())
        .unique()
        .count();

    // explicit file names and automatic stream names are separate namespaces
    let mut plans: Vec<(StreamPlan, &Schedule, bool)> = Vec::new();
    for (index, request, schedule, filter) in resolved {
        let (name, explicit) = match request.stream_name() {
            Some(name) => (name.to_string(), true),
            None => {
                let category = StreamCategory::classify(request, filter);
                let name = if unnamed_grids > 1 {
                    format!("{}_{}", category.label(), schedule.name)
                } else {
                    category.label().to_string()
                };
                (name, false)
            }
        };

        let planned = PlannedRequest {
            index,
            request: request.clone(),
            filter: filter.clone(),
        };

        match plans
            .iter_mut()
            .find(|(plan, _, is_explicit)| plan.name == name && *is_explicit == explicit)
        {
            Some((plan, previous, _)) => {
                if previous.name != schedule.name {
                    return Err(OutputError::ConflictingSchedule {
                        index,
                        stream: name,
                        schedule: schedule.name.clone(),
                        previous: previous.name.clone(),
                    });
                }
                plan.requests.push(planned);
            }
            None => {
                let active = schedule.activate()?;
                plans.push((
                    StreamPlan {
                        name,
                        schedule: active,
                        requests: vec![planned],
                    },
                    schedule,
                    explicit,
                ));
            }
        }
    }
    rename_shadowed_streams(&mut plans);

    for (plan, _, _) in &plans {
        info!(
            "Output stream '{}' on grid '{}' with {} definition(s)",
            plan.file_name(),
            plan.schedule.name(),
            plan.requests.len()
        );
    }

    Ok(WithWarnings::new(
        plans.into_iter().map(|(plan, _, _)| plan).collect(),
        warnings,
    ))
}

/// Renames automatic streams whose name is already used as an explicit file
/// name: the grid name is appended, then a counter if that is taken as well.
fn rename_shadowed_streams(plans: &mut [(StreamPlan, &Schedule, bool)]) {
    let mut taken: BTreeSet<String> = plans.iter().map(|(plan, _, _)| plan.name.clone()).collect();
    let explicit: BTreeSet<String> = plans
        .iter()
        .filter(|(_, _, explicit)| *explicit)
        .map(|(plan, _, _)| plan.name.clone())
        .collect();

    for (plan, schedule, is_explicit) in plans.iter_mut() {
        if *is_explicit || !explicit.contains(&plan.name) {
            continue;
        }
        let base = format!("{}_{}", plan.name, schedule.name);
        let mut name = base.clone();
        let mut counter = 2;
        while taken.contains(&name) {
            name = format!("{}_{}", base, counter);
            counter += 1;
        }
        warn!(
            "Output file '{}' is requested explicitly, automatic output stream renamed to '{}'",
            plan.name, name
        );
        taken.insert(name.clone());
        plan.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityCategory;
    use crate::filter::IdGroup;
    use crate::request::QuantityName;
    use crate::schedule::Interval;

    fn grid(name: &str, step: f64) -> Schedule {
        Schedule::new(name, vec![Interval::from_seconds(None, None, Some(step))])
    }

    fn filters() -> Vec<EntityFilter> {
        vec![
            EntityFilter::new("zones", EntityCategory::Zone, IdGroup::all()),
            EntityFilter::new("climate", EntityCategory::Location, IdGroup::default()),
            EntityFilter::new("walls", EntityCategory::ConstructionInstance, IdGroup::all()),
        ]
    }

    fn request(quantity: &str, schedule: &str, filter: &str) -> Request {
        Request::new(QuantityName::new(quantity), schedule, filter)
    }

    fn names(plans: &[StreamPlan]) -> Vec<&str> {
        plans.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_classification_with_single_grid() {
        let requests = vec![
            request("Temperature", "hourly", "zones"),
            request("Temperature", "hourly", "climate"),
            request("ConvectiveHeatFluxDensity", "hourly", "walls"),
            request("ConvectiveHeatFluxDensity", "hourly", "walls").reduced(ReductionKind::Integral),
            request("HeatingLoad", "hourly", "zones"),
        ];
        let plans = resolve(&requests, &[grid("hourly", 3600.0)], &filters())
            .unwrap()
            .unwrap();
        assert_eq!(
            names(&plans),
            vec!["states", "loads", "fluxes", "flux_integrals", "misc"]
        );
        assert_eq!(plans[0].file_name(), "states.tsv");
        assert_eq!(plans[0].schedule.name(), "hourly");
    }

    #[test]
    fn test_grid_suffix_with_several_grids() {
        let requests = vec![
            request("Temperature", "hourly", "zones"),
            request("Temperature", "minutely", "climate"),
        ];
        let plans = resolve(
            &requests,
            &[grid("hourly", 3600.0), grid("minutely", 60.0)],
            &filters(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(names(&plans), vec!["states_hourly", "loads_minutely"]);
    }

    #[test]
    fn test_explicit_stream_groups_requests() {
        let requests = vec![
            request("Temperature", "hourly", "zones").in_stream("mine"),
            request("HeatingLoad", "hourly", "zones").in_stream("mine"),
            request("Temperature", "minutely", "zones"),
        ];
        let plans = resolve(
            &requests,
            &[grid("hourly", 3600.0), grid("minutely", 60.0)],
            &filters(),
        )
        .unwrap()
        .unwrap();
        // only one grid is used by unnamed definitions, so no suffix
        assert_eq!(names(&plans), vec!["mine", "states"]);
        assert_eq!(plans[0].requests.len(), 2);
        assert_eq!(plans[0].requests[1].index, 1);
    }

    #[test]
    fn test_conflicting_schedule() {
        let requests = vec![
            request("Temperature", "hourly", "zones").in_stream("mine"),
            request("HeatingLoad", "minutely", "zones").in_stream("mine"),
        ];
        let err = resolve(
            &requests,
            &[grid("hourly", 3600.0), grid("minutely", 60.0)],
            &filters(),
        )
        .unwrap_err();
        assert!(matches!(err, OutputError::ConflictingSchedule { index: 1, .. }));
    }

    #[test]
    fn test_unknown_and_empty_references() {
        let err = resolve(&[request("T", "daily", "zones")], &[grid("hourly", 3600.0)], &filters())
            .unwrap_err();
        assert!(matches!(err, OutputError::UnknownSchedule { index: 0, ref name } if name == "daily"));

        let err = resolve(&[request("T", "hourly", "rooms")], &[grid("hourly", 3600.0)], &filters())
            .unwrap_err();
        assert!(matches!(err, OutputError::UnknownEntityFilter { .. }));

        let err = resolve(&[request("T", " ", "zones")], &[grid("hourly", 3600.0)], &filters())
            .unwrap_err();
        assert!(matches!(err, OutputError::EmptyReference { what: "output grid", .. }));
    }

    #[test]
    fn test_unused_grid_is_dropped_with_warning() {
        let result = resolve(
            &[request("Temperature", "hourly", "zones")],
            &[grid("hourly", 3600.0), grid("unused", 10.0)],
            &filters(),
        )
        .unwrap();
        assert!(result.is_warning());
        let (plans, warnings): (Vec<StreamPlan>, Vec<String>) = result.into();
        assert_eq!(plans.len(), 1);
        assert!(warnings[0].contains("'unused'"));
    }

    #[test]
    fn test_invalid_used_grid_is_fatal() {
        let broken = Schedule::new("hourly", vec![Interval::from_seconds(None, None, Some(0.0))]);
        let err = resolve(&[request("Temperature", "hourly", "zones")], &[broken], &filters())
            .unwrap_err();
        assert!(matches!(err, OutputError::Validation { .. }));
    }

    #[test]
    fn test_duplicate_grid_names() {
        let err = resolve(
            &[],
            &[grid("hourly", 3600.0), grid("hourly", 60.0)],
            &filters(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate output grid name 'hourly'"));
    }

    #[test]
    fn test_explicit_name_matching_automatic_stream() {
        let requests = vec![
            request("Temperature", "hourly", "zones"),
            request("HeatingLoad", "minutely", "zones").in_stream("states"),
        ];
        let plans = resolve(
            &requests,
            &[grid("hourly", 3600.0), grid("minutely", 60.0)],
            &filters(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(names(&plans), vec!["states_hourly", "states"]);
        assert_eq!(plans[0].schedule.name(), "hourly");
        assert_eq!(plans[1].schedule.name(), "minutely");
        assert_eq!(plans[1].requests[0].index, 1);
    }
}
