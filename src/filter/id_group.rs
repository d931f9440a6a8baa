//! Encoded id selections as used by object lists.
//!
//! ```text
//! *            all ids
//! 1,4,7        single ids
//! 1-10,12      an id range plus a single id
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0, u32 as id},
    combinator::{all_consuming, map, value},
    multi::separated_list1,
    sequence::{delimited, separated_pair},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::EntityId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdGroupError {
    #[error("Error initializing id group from string '{0}': invalid encoding format")]
    Malformed(String),

    #[error("Error initializing id group from string '{0}': '*' can only be used stand-alone")]
    WildcardNotAlone(String),
}

/// A set of entity ids: everything (`*`), or single ids and id ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGroup {
    all: bool,
    ids: BTreeSet<u32>,
    ranges: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    All,
    Range(u32, u32),
    Id(u32),
}

fn ws<'a, P, O>(inner: P) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn token(input: &str) -> IResult<&str, Token> {
    ws(alt((
        value(Token::All, tag("*")),
        map(separated_pair(id, ws(char('-')), id), |(a, b)| {
            Token::Range(a.min(b), a.max(b))
        }),
        map(id, Token::Id),
    )))
    .parse(input)
}

fn tokens(input: &str) -> IResult<&str, Vec<Token>> {
    separated_list1(char(','), token).parse(input)
}

impl IdGroup {
    /// A group selecting every id.
    pub fn all() -> Self {
        IdGroup {
            all: true,
            ..Default::default()
        }
    }

    /// A group of explicit ids.
    pub fn from_ids<I: IntoIterator<Item = u32>>(ids: I) -> Self {
        IdGroup {
            all: false,
            ids: ids.into_iter().collect(),
            ranges: Vec::new(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.all
    }

    pub fn is_empty(&self) -> bool {
        !self.all && self.ids.is_empty() && self.ranges.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.all
            || self.ids.contains(&id.value)
            || self
                .ranges
                .iter()
                .any(|&(lower, upper)| id.value >= lower && id.value <= upper)
    }

    /// The single ids listed explicitly (ranges excluded).
    pub fn explicit_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ids.iter().map(|&value| EntityId::new(value))
    }
}

impl FromStr for IdGroup {
    type Err = IdGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(IdGroup::default());
        }

        let (_, tokens) = all_consuming(tokens)
            .parse(s)
            .map_err(|_| IdGroupError::Malformed(s.to_string()))?;

        if tokens.contains(&Token::All) {
            if tokens.len() > 1 {
                return Err(IdGroupError::WildcardNotAlone(s.to_string()));
            }
            return Ok(IdGroup::all());
        }

        let mut group = IdGroup::default();
        for token in tokens {
            match token {
                Token::Range(lower, upper) => group.ranges.push((lower, upper)),
                Token::Id(value) => {
                    group.ids.insert(value);
                }
                Token::All => {}
            }
        }
        Ok(group)
    }
}

impl fmt::Display for IdGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all {
            return write!(f, "*");
        }
        let ranges = self.ranges.iter().map(|(a, b)| format!("{}-{}", a, b));
        let ids = self.ids.iter().map(|id| id.to_string());
        write!(f, "{}", ranges.chain(ids).join(","))
    }
}

impl<'de> Deserialize<'de> for IdGroup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for IdGroup {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard() {
        let group: IdGroup = " * ".parse().unwrap();
        assert!(group.is_all());
        assert!(group.contains(EntityId::new(12345)));
        assert_eq!(group.to_string(), "*");
    }

    #[test]
    fn test_ids_and_ranges() {
        let group: IdGroup = "7, 10-12, 3".parse().unwrap();
        assert!(!group.is_all());
        for value in [3, 7, 10, 11, 12] {
            assert!(group.contains(EntityId::new(value)), "{} missing", value);
        }
        assert!(!group.contains(EntityId::new(13)));
        assert_eq!(group.to_string(), "10-12,3,7");
        assert_eq!(
            group.explicit_ids().collect::<Vec<_>>(),
            vec![EntityId::new(3), EntityId::new(7)]
        );
    }

    #[test]
    fn test_reversed_range_is_normalised() {
        let group: IdGroup = "10-1".parse().unwrap();
        assert_eq!(group.to_string(), "1-10");
    }

    #[test]
    fn test_empty_string_is_empty_group() {
        let group: IdGroup = "".parse().unwrap();
        assert!(group.is_empty());
        assert!(!group.contains(EntityId::new(1)));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            "1,*".parse::<IdGroup>(),
            Err(IdGroupError::WildcardNotAlone(_))
        ));
        assert!(matches!(
            "1,,2".parse::<IdGroup>(),
            Err(IdGroupError::Malformed(_))
        ));
        assert!(matches!(
            "1-2-3".parse::<IdGroup>(),
            Err(IdGroupError::Malformed(_))
        ));
        assert!("zone".parse::<IdGroup>().is_err());
    }
}
