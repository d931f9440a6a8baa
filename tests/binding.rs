mod common;

use simout::filter::{EntityFilter, IdGroup};
use simout::host::IndexKeyKind;
use simout::schedule::Interval;
use simout::{EntityCategory, OutputHandler, OutputSpec, QuantityName, Request, Schedule};

use common::{Simulation, init_logging, zone};

fn spec(filter: EntityFilter, quantity: &str) -> OutputSpec {
    OutputSpec::new("s")
        .with_grid(Schedule::new(
            "hourly",
            vec![Interval::from_seconds(None, None, Some(3600.0))],
        ))
        .with_object_list(filter)
        .with_definition(Request::new(quantity.parse::<QuantityName>().unwrap(), "hourly", "zones"))
}

fn headers(outputs: &OutputHandler) -> Vec<String> {
    outputs
        .streams()
        .iter()
        .flat_map(|s| s.columns().iter().map(|c| c.header.clone()))
        .collect()
}

#[test]
fn test_wildcard_with_one_provider() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut sim = Simulation::with_zones(&[1, 2]);
    sim.scalar(zone(1), "HeatingLoad", "W");

    let filter = EntityFilter::new("zones", EntityCategory::Zone, IdGroup::all());
    let outputs = OutputHandler::setup(&spec(filter, "HeatingLoad"), &sim, dir.path(), false).unwrap();

    assert_eq!(headers(&outputs), vec!["Zone(id=1).HeatingLoad [W]"]);
    assert!(outputs.diagnostics().is_empty());
}

#[test]
fn test_explicit_list_with_one_provider() {
    let dir = tempfile::tempdir().unwrap();
    let mut sim = Simulation::with_zones(&[1, 2]);
    sim.scalar(zone(1), "HeatingLoad", "W");

    let filter = EntityFilter::new("zones", EntityCategory::Zone, IdGroup::from_ids([1, 2]));
    let outputs = OutputHandler::setup(&spec(filter, "HeatingLoad"), &sim, dir.path(), false).unwrap();

    assert_eq!(headers(&outputs), vec!["Zone(id=1).HeatingLoad [W]"]);
    assert_eq!(outputs.diagnostics().len(), 1);
    assert!(outputs.diagnostics()[0].contains("Zone(id=2).HeatingLoad"));
}

#[test]
fn test_explicit_id_missing_from_simulation() {
    let dir = tempfile::tempdir().unwrap();
    let mut sim = Simulation::with_zones(&[1]);
    sim.scalar(zone(1), "HeatingLoad", "W");

    let filter = EntityFilter::new("zones", EntityCategory::Zone, "1,99".parse().unwrap());
    let outputs = OutputHandler::setup(&spec(filter, "HeatingLoad"), &sim, dir.path(), false).unwrap();
    assert_eq!(outputs.diagnostics().len(), 1);
    assert!(outputs.diagnostics()[0].contains("Zone(id=99)"));
}

#[test]
fn test_vector_quantity_expands_per_element() {
    let dir = tempfile::tempdir().unwrap();
    let mut sim = Simulation::with_zones(&[1]);
    sim.vector(zone(1), "SurfaceTemperature", "C", IndexKeyKind::Index, &[0, 1, 2]);

    let filter = EntityFilter::new("zones", EntityCategory::Zone, IdGroup::all());
    let outputs =
        OutputHandler::setup(&spec(filter.clone(), "SurfaceTemperature"), &sim, dir.path(), false)
            .unwrap();
    assert_eq!(
        headers(&outputs),
        vec![
            "Zone(id=1).SurfaceTemperature[0] [C]",
            "Zone(id=1).SurfaceTemperature[1] [C]",
            "Zone(id=1).SurfaceTemperature[2] [C]",
        ]
    );

    // an explicit index selects one element, an unknown one is reported
    let outputs =
        OutputHandler::setup(&spec(filter.clone(), "SurfaceTemperature[1]"), &sim, dir.path(), false)
            .unwrap();
    assert_eq!(headers(&outputs), vec!["Zone(id=1).SurfaceTemperature[1] [C]"]);

    let outputs =
        OutputHandler::setup(&spec(filter, "SurfaceTemperature[5]"), &sim, dir.path(), false).unwrap();
    assert!(headers(&outputs).is_empty());
    assert_eq!(outputs.diagnostics().len(), 1);
}

#[test]
fn test_column_count_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let mut sim = Simulation::with_zones(&[1, 2, 3]);
    for id in [1, 2, 3] {
        sim.scalar(zone(id), "Temperature", "K");
    }
    let filter = EntityFilter::new("zones", EntityCategory::Zone, IdGroup::all());
    let mut outputs = OutputHandler::setup(&spec(filter, "Temperature"), &sim, dir.path(), false).unwrap();

    let before = headers(&outputs);
    for step in 0..5 {
        let t = f64::from(step) * 3600.0;
        outputs.step_completed(t);
        outputs.produce_output(t, t).unwrap();
    }
    assert_eq!(headers(&outputs), before);
    assert_eq!(before.len(), 3);
    assert_eq!(outputs.cache_bytes(), 5 * 4 * 8);
}
