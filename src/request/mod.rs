//! Output definitions: what to write, on which grid, for which entities.

pub mod quantity;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use quantity::{QuantityName, QuantityNameError, VectorIndex};

/// How a quantity's values over time become one reported number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReductionKind {
    /// The value at the output instant.
    #[default]
    Instantaneous,
    /// The mean value since the previous output instant.
    Average,
    /// The time integral since the start of the simulation.
    Integral,
}

impl ReductionKind {
    /// Suffix appended to column headers.
    pub fn header_suffix(&self) -> &'static str {
        match self {
            ReductionKind::Instantaneous => "",
            ReductionKind::Average => "-average",
            ReductionKind::Integral => "-integral",
        }
    }
}

impl fmt::Display for ReductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionKind::Instantaneous => write!(f, "None"),
            ReductionKind::Average => write!(f, "Mean"),
            ReductionKind::Integral => write!(f, "Integral"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReductionKindError {
    #[error("Invalid time type: {0}")]
    InvalidValue(String),
}

impl FromStr for ReductionKind {
    type Err = ReductionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "instantaneous" => Ok(ReductionKind::Instantaneous),
            "mean" | "average" => Ok(ReductionKind::Average),
            "integral" => Ok(ReductionKind::Integral),
            _ => Err(ReductionKindError::InvalidValue(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ReductionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for ReductionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One declared output definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The quantity to output, optionally with a vector index.
    #[serde(rename = "@quantity")]
    pub quantity: QuantityName,
    /// Name of the output grid to sample on.
    #[serde(rename = "@gridName")]
    pub schedule: String,
    /// Name of the object list selecting the entities.
    #[serde(rename = "@objectListName")]
    pub filter: String,
    #[serde(rename = "@timeType", default)]
    pub reduction: ReductionKind,
    /// Explicit target file (without extension); grouped automatically if absent.
    #[serde(rename = "@fileName", default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
}

impl Request {
    pub fn new<S: Into<String>, T: Into<String>>(
        quantity: QuantityName,
        schedule: S,
        filter: T,
    ) -> Self {
        Request {
            quantity,
            schedule: schedule.into(),
            filter: filter.into(),
            reduction: ReductionKind::Instantaneous,
            stream: None,
        }
    }

    pub fn reduced(mut self, reduction: ReductionKind) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn in_stream<S: Into<String>>(mut self, stream: S) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// The explicit stream name, if it is non-blank.
    pub fn stream_name(&self) -> Option<&str> {
        self.stream
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
