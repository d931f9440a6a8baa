use std::{fmt, str::FromStr};

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, u32 as index},
    combinator::{all_consuming, map, opt},
    sequence::{delimited, pair},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantityNameError {
    #[error("Invalid quantity format string '{0}'")]
    Malformed(String),
}

/// Selects one element of a vector-valued quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VectorIndex {
    /// Positional index, written `[i]`.
    Position(u32),
    /// Element keyed by entity id, written `(id=i)`.
    Id(u32),
}

impl fmt::Display for VectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorIndex::Position(i) => write!(f, "[{}]", i),
            VectorIndex::Id(id) => write!(f, "(id={})", id),
        }
    }
}

/// A quantity name with an optional vector index, e.g. `SurfaceTemperature[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantityName {
    pub name: String,
    pub index: Option<VectorIndex>,
}

impl QuantityName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        QuantityName {
            name: name.into(),
            index: None,
        }
    }

    pub fn with_index<S: Into<String>>(name: S, index: VectorIndex) -> Self {
        QuantityName {
            name: name.into(),
            index: Some(index),
        }
    }
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

fn vector_index(input: &str) -> IResult<&str, VectorIndex> {
    alt((
        map(delimited(char('['), index, char(']')), VectorIndex::Position),
        map(delimited(tag("(id="), index, char(')')), VectorIndex::Id),
    ))
    .parse(input)
}

fn quantity_name(input: &str) -> IResult<&str, (&str, Option<VectorIndex>)> {
    delimited(multispace0, pair(name, opt(vector_index)), multispace0).parse(input)
}

impl FromStr for QuantityName {
    type Err = QuantityNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (name, index)) = all_consuming(quantity_name)
            .parse(s)
            .map_err(|_| QuantityNameError::Malformed(s.to_string()))?;
        Ok(QuantityName {
            name: name.to_string(),
            index,
        })
    }
}

impl fmt::Display for QuantityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(index) = self.index {
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for QuantityName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for QuantityName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
