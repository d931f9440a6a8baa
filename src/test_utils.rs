#![cfg(test)]

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::core::{EntityCategory, EntityId, EntityRef};
use crate::host::{EntityRegistry, IndexKeyKind, QuantityDescriptor, QuantityRegistry, ValueAccessor};
use crate::request::{QuantityName, VectorIndex};

// Helper function to assert floating point equality with tolerance
pub fn assert_float_eq(a: f64, b: f64, tolerance: f64) {
    assert!(
        (a - b).abs() < tolerance,
        "Expected {} to be approximately equal to {} (tolerance: {})",
        a,
        b,
        tolerance
    );
}

struct MockQuantity {
    descriptor: QuantityDescriptor,
    values: Vec<(Option<VectorIndex>, Rc<Cell<f64>>)>,
}

/// An in-memory simulation: entities per category and quantity values held in
/// cells the test can change between steps.
#[derive(Default)]
pub struct MockHost {
    entities: BTreeMap<EntityCategory, Vec<EntityId>>,
    kinds: HashMap<(EntityCategory, EntityId), String>,
    quantities: HashMap<(EntityRef, String), MockQuantity>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, category: EntityCategory, id: u32) -> &mut Self {
        self.entities.entry(category).or_default().push(EntityId::new(id));
        self
    }

    pub fn add_zone(&mut self, id: u32) -> &mut Self {
        self.add_entity(EntityCategory::Zone, id)
    }

    pub fn set_kind(&mut self, category: EntityCategory, id: u32, kind: &str) -> &mut Self {
        self.kinds.insert((category, EntityId::new(id)), kind.to_string());
        self
    }

    /// Adds a scalar quantity; `value` is in base units.
    pub fn add_scalar(&mut self, target: EntityRef, name: &str, unit: &str, value: f64) -> Rc<Cell<f64>> {
        let cell = Rc::new(Cell::new(value));
        self.quantities.insert(
            (target, name.to_string()),
            MockQuantity {
                descriptor: QuantityDescriptor::scalar(unit),
                values: vec![(None, cell.clone())],
            },
        );
        cell
    }

    pub fn add_vector(
        &mut self,
        target: EntityRef,
        name: &str,
        unit: &str,
        key_kind: IndexKeyKind,
        elements: &[(u32, f64)],
    ) -> Vec<Rc<Cell<f64>>> {
        let values: Vec<(Option<VectorIndex>, Rc<Cell<f64>>)> = elements
            .iter()
            .map(|&(key, value)| {
                let index = match key_kind {
                    IndexKeyKind::Index => VectorIndex::Position(key),
                    IndexKeyKind::Id => VectorIndex::Id(key),
                };
                (Some(index), Rc::new(Cell::new(value)))
            })
            .collect();
        let cells = values.iter().map(|(_, cell)| cell.clone()).collect();
        let keys = elements.iter().map(|&(key, _)| key).collect();
        self.quantities.insert(
            (target, name.to_string()),
            MockQuantity {
                descriptor: QuantityDescriptor::vector(unit, key_kind, keys),
                values,
            },
        );
        cells
    }
}

impl EntityRegistry for MockHost {
    fn entity_ids(&self, category: EntityCategory) -> Vec<EntityId> {
        self.entities.get(&category).cloned().unwrap_or_default()
    }

    fn entity_kind(&self, category: EntityCategory, id: EntityId) -> Option<String> {
        self.kinds.get(&(category, id)).cloned()
    }
}

impl QuantityRegistry for MockHost {
    fn describe(&self, target: &EntityRef, quantity: &str) -> Option<QuantityDescriptor> {
        self.quantities
            .get(&(*target, quantity.to_string()))
            .map(|q| q.descriptor.clone())
    }

    fn accessor(&self, target: &EntityRef, quantity: &QuantityName) -> Option<ValueAccessor> {
        let q = self.quantities.get(&(*target, quantity.name.clone()))?;
        q.values
            .iter()
            .find(|(index, _)| *index == quantity.index)
            .map(|(_, cell)| ValueAccessor::from_cell(cell))
    }
}
