//! The interface between the output engine and the running simulation.
//!
//! The engine never owns simulation state. It asks the host which entities
//! exist, what unit a quantity has, and for a [`ValueAccessor`] that reads the
//! live value whenever a row is sampled.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::{EntityCategory, EntityId, EntityRef};
use crate::request::QuantityName;

/// Lists the entities known to the simulation.
pub trait EntityRegistry {
    /// Ids of all entities of `category`, in any order.
    fn entity_ids(&self, category: EntityCategory) -> Vec<EntityId>;

    /// The model kind of an entity, used by object lists with a `filterKind`.
    fn entity_kind(&self, _category: EntityCategory, _id: EntityId) -> Option<String> {
        None
    }
}

/// Describes and exposes the quantities computed by the simulation.
pub trait QuantityRegistry {
    /// Metadata of `quantity` on `target`, `None` when the target does not
    /// provide it.
    fn describe(&self, target: &EntityRef, quantity: &str) -> Option<QuantityDescriptor>;

    /// A read handle for one (possibly indexed) quantity of `target`.
    fn accessor(&self, target: &EntityRef, quantity: &QuantityName) -> Option<ValueAccessor>;
}

/// Everything the output engine needs from a simulation.
pub trait SimulationHost: EntityRegistry + QuantityRegistry {}

impl<T: EntityRegistry + QuantityRegistry> SimulationHost for T {}

/// How the elements of a vector-valued quantity are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKeyKind {
    /// Elements are addressed by position, written `[i]`.
    Index,
    /// Elements are addressed by the id of another entity, written `(id=i)`.
    Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDomain {
    pub key_kind: IndexKeyKind,
    pub keys: Vec<u32>,
}

/// Metadata of a quantity exposed by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityDescriptor {
    /// Unit name the value is expressed in; the stored value is in its base unit.
    pub unit: String,
    /// True for values that never change during a simulation.
    pub constant: bool,
    pub description: String,
    /// Present for vector-valued quantities.
    pub index: Option<IndexDomain>,
}

impl QuantityDescriptor {
    pub fn scalar<S: Into<String>>(unit: S) -> Self {
        QuantityDescriptor {
            unit: unit.into(),
            constant: false,
            description: String::new(),
            index: None,
        }
    }

    pub fn vector<S: Into<String>>(unit: S, key_kind: IndexKeyKind, keys: Vec<u32>) -> Self {
        QuantityDescriptor {
            index: Some(IndexDomain { key_kind, keys }),
            ..QuantityDescriptor::scalar(unit)
        }
    }

    pub fn constant(mut self) -> Self {
        self.constant = true;
        self
    }

    pub fn described<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }
}

/// A non-owning read handle for one live simulation value (in base units).
#[derive(Clone)]
pub struct ValueAccessor(Rc<dyn Fn() -> f64>);

impl ValueAccessor {
    pub fn new<F: Fn() -> f64 + 'static>(read: F) -> Self {
        ValueAccessor(Rc::new(read))
    }

    /// Reads a value owned by the simulation.
    ///
    /// Only a weak reference is kept. Reading after the simulation dropped the
    /// cell is a host bug and panics.
    pub fn from_cell(cell: &Rc<Cell<f64>>) -> Self {
        let weak: Weak<Cell<f64>> = Rc::downgrade(cell);
        ValueAccessor::new(move || match weak.upgrade() {
            Some(cell) => cell.get(),
            None => panic!("simulation value read after it was released by the host"),
        })
    }

    pub fn constant(value: f64) -> Self {
        ValueAccessor::new(move || value)
    }

    pub fn read(&self) -> f64 {
        (self.0)()
    }
}

impl fmt::Debug for ValueAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueAccessor(..)")
    }
}
