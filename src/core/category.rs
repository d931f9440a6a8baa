use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of entity an object list ranges over.
///
/// Output column headers start with the category name, e.g.
/// `Zone(id=1).AirTemperature [C]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityCategory {
    Zone,
    ConstructionInstance,
    Interface,
    EmbeddedObject,
    Model,
    /// The building location/climate. There is exactly one per simulation.
    Location,
    /// Schedule values. Global, like the location.
    Schedule,
    Sensor,
    Network,
    NetworkElement,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 10] = [
        EntityCategory::Zone,
        EntityCategory::ConstructionInstance,
        EntityCategory::Interface,
        EntityCategory::EmbeddedObject,
        EntityCategory::Model,
        EntityCategory::Location,
        EntityCategory::Schedule,
        EntityCategory::Sensor,
        EntityCategory::Network,
        EntityCategory::NetworkElement,
    ];

    /// Singleton categories have no entity ids: their quantities are
    /// requested with the "no entity" marker.
    pub fn is_singleton(&self) -> bool {
        matches!(self, EntityCategory::Location | EntityCategory::Schedule)
    }

    /// Quantities of these categories are climatic loads/boundary conditions.
    pub fn is_boundary_condition(&self) -> bool {
        matches!(self, EntityCategory::Location | EntityCategory::Sensor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Zone => "Zone",
            EntityCategory::ConstructionInstance => "ConstructionInstance",
            EntityCategory::Interface => "Interface",
            EntityCategory::EmbeddedObject => "EmbeddedObject",
            EntityCategory::Model => "Model",
            EntityCategory::Location => "Location",
            EntityCategory::Schedule => "Schedule",
            EntityCategory::Sensor => "Sensor",
            EntityCategory::Network => "Network",
            EntityCategory::NetworkElement => "NetworkElement",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum EntityCategoryError {
    #[error("Invalid reference type: {0}")]
    InvalidValue(String),
}

impl FromStr for EntityCategory {
    type Err = EntityCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        EntityCategory::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| EntityCategoryError::InvalidValue(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for EntityCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for EntityCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
