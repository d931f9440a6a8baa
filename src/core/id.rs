use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a simulation entity (zone, construction, model instance, ...).
///
/// Ids are only unique within one [`EntityCategory`](super::EntityCategory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId {
    pub value: u32,
}

impl EntityId {
    pub fn new(value: u32) -> Self {
        EntityId { value }
    }
}

impl From<u32> for EntityId {
    fn from(value: u32) -> Self {
        EntityId { value }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// One concrete entity of a category, or the category itself for singleton
/// categories that have no ids (the "no entity" marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    pub category: super::EntityCategory,
    pub id: Option<EntityId>,
}

impl EntityRef {
    pub fn new(category: super::EntityCategory, id: EntityId) -> Self {
        EntityRef {
            category,
            id: Some(id),
        }
    }

    /// The "no entity" marker of a category.
    pub fn none(category: super::EntityCategory) -> Self {
        EntityRef { category, id: None }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}(id={})", self.category, id),
            None => write!(f, "{}", self.category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityCategory;

    #[test]
    fn test_entity_ref_display() {
        assert_eq!(
            EntityRef::new(EntityCategory::Zone, EntityId::new(1)).to_string(),
            "Zone(id=1)"
        );
        assert_eq!(EntityRef::none(EntityCategory::Location).to_string(), "Location");
    }
}
