#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use simout::host::{EntityRegistry, IndexKeyKind, QuantityDescriptor, QuantityRegistry};
use simout::request::VectorIndex;
use simout::{EntityCategory, EntityId, EntityRef, QuantityName, ValueAccessor};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn zone(id: u32) -> EntityRef {
    EntityRef::new(EntityCategory::Zone, EntityId::new(id))
}

struct Quantity {
    descriptor: QuantityDescriptor,
    values: Vec<(Option<VectorIndex>, Rc<Cell<f64>>)>,
}

/// A tiny simulation: entities plus quantity values the test changes
/// between integrator steps.
#[derive(Default)]
pub struct Simulation {
    entities: BTreeMap<EntityCategory, Vec<EntityId>>,
    kinds: HashMap<(EntityCategory, EntityId), String>,
    quantities: HashMap<(EntityRef, String), Quantity>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zones(ids: &[u32]) -> Self {
        let mut sim = Simulation::new();
        for &id in ids {
            sim.add_entity(EntityCategory::Zone, id);
        }
        sim
    }

    pub fn add_entity(&mut self, category: EntityCategory, id: u32) {
        self.entities.entry(category).or_default().push(EntityId::new(id));
    }

    pub fn set_kind(&mut self, category: EntityCategory, id: u32, kind: &str) {
        self.kinds.insert((category, EntityId::new(id)), kind.to_string());
    }

    /// Registers a scalar quantity and returns the cell holding its value
    /// (in base units).
    pub fn scalar(&mut self, target: EntityRef, name: &str, unit: &str) -> Rc<Cell<f64>> {
        let cell = Rc::new(Cell::new(0.0));
        self.quantities.insert(
            (target, name.to_string()),
            Quantity {
                descriptor: QuantityDescriptor::scalar(unit),
                values: vec![(None, cell.clone())],
            },
        );
        cell
    }

    pub fn vector(
        &mut self,
        target: EntityRef,
        name: &str,
        unit: &str,
        key_kind: IndexKeyKind,
        keys: &[u32],
    ) -> Vec<Rc<Cell<f64>>> {
        let values: Vec<(Option<VectorIndex>, Rc<Cell<f64>>)> = keys
            .iter()
            .map(|&key| {
                let index = match key_kind {
                    IndexKeyKind::Index => VectorIndex::Position(key),
                    IndexKeyKind::Id => VectorIndex::Id(key),
                };
                (Some(index), Rc::new(Cell::new(0.0)))
            })
            .collect();
        let cells = values.iter().map(|(_, cell)| cell.clone()).collect();
        self.quantities.insert(
            (target, name.to_string()),
            Quantity {
                descriptor: QuantityDescriptor::vector(unit, key_kind, keys.to_vec()),
                values,
            },
        );
        cells
    }
}

impl EntityRegistry for Simulation {
    fn entity_ids(&self, category: EntityCategory) -> Vec<EntityId> {
        self.entities.get(&category).cloned().unwrap_or_default()
    }

    fn entity_kind(&self, category: EntityCategory, id: EntityId) -> Option<String> {
        self.kinds.get(&(category, id)).cloned()
    }
}

impl QuantityRegistry for Simulation {
    fn describe(&self, target: &EntityRef, quantity: &str) -> Option<QuantityDescriptor> {
        self.quantities
            .get(&(*target, quantity.to_string()))
            .map(|q| q.descriptor.clone())
    }

    fn accessor(&self, target: &EntityRef, quantity: &QuantityName) -> Option<ValueAccessor> {
        self.quantities
            .get(&(*target, quantity.name.clone()))?
            .values
            .iter()
            .find(|(index, _)| *index == quantity.index)
            .map(|(_, cell)| ValueAccessor::from_cell(cell))
    }
}
