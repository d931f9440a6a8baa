// Every quantity exposed by the simulation carries a unit name. Values held by
// the simulation are always stored in the base unit of that unit; output files
// report them in the unit named by the quantity (or in a unit chosen for the
// reduced quantity).
//
// | Name     | Base     | Factor     | Offset |
// |----------|----------|------------|--------|
// | s        | s        | 1          |        |
// | min      | s        | 60         |        |
// | h        | s        | 3600       |        |
// | d        | s        | 86400      |        |
// | a        | s        | 31536000   |        |
// | C        | K        | 1          | 273.15 |
// | W        | J/s      | 1          |        |
// | kWh      | J        | 3.6e6      |        |
// | W/m2     | J/m2s    | 1          |        |
// | kWh/m2   | J/m2     | 3.6e6      |        |
// | ...      |          |            |        |
//
// A value v given in unit u is converted to the base unit by v * factor + offset.
//
// Time integrals are derived from the base unit name: a trailing "/m2s",
// "/m3s" or "/ms" loses its "s", a trailing "/s" is removed entirely. Units
// whose base does not end in one of these cannot be integrated over time.

use std::fmt;
use std::str::FromStr;

use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::{multispace0, multispace1},
    combinator::all_consuming,
    number::complete::double,
    sequence::{delimited, preceded},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised for unknown or malformed units.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("Unknown unit '{0}'")]
    Unknown(String),

    #[error("Malformed parameter '{0}', expected '<value> <unit>'")]
    MalformedParameter(String),

    #[error("Cannot obtain integral unit for base unit '{0}'")]
    NotIntegrable(String),

    #[error("Cannot convert from unit '{from}' to unit '{to}'")]
    Incompatible { from: String, to: String },
}

/// A physical unit from the built-in unit table.
#[derive(Debug, Clone, Copy)]
pub struct Unit {
    name: &'static str,
    base: &'static str,
    factor: f64,
    offset: f64,
}

impl Unit {
    const fn new(name: &'static str, base: &'static str, factor: f64) -> Self {
        Unit {
            name,
            base,
            factor,
            offset: 0.0,
        }
    }

    const fn with_offset(name: &'static str, base: &'static str, factor: f64, offset: f64) -> Self {
        Unit {
            name,
            base,
            factor,
            offset,
        }
    }

    /// Looks up a unit by name (surrounding whitespace is ignored).
    pub fn parse(name: &str) -> Result<Unit, UnitError> {
        let name = name.trim();
        UNITS
            .iter()
            .find(|u| u.name == name)
            .copied()
            .ok_or_else(|| UnitError::Unknown(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The base (SI) unit values of this unit are stored in.
    pub fn base_unit(&self) -> Unit {
        // every base name is itself an entry of the table
        Unit::parse(self.base).unwrap_or(*self)
    }

    pub fn base_name(&self) -> &'static str {
        self.base
    }

    /// True for units measuring time.
    pub fn is_time(&self) -> bool {
        self.base == "s"
    }

    pub fn to_base(&self, value: f64) -> f64 {
        value * self.factor + self.offset
    }

    pub fn from_base(&self, value: f64) -> f64 {
        (value - self.offset) / self.factor
    }

    /// Converts `value` given in `self` into `target`.
    pub fn convert(&self, value: f64, target: &Unit) -> Result<f64, UnitError> {
        if self.base != target.base {
            return Err(UnitError::Incompatible {
                from: self.name.to_string(),
                to: target.name.to_string(),
            });
        }
        Ok(target.from_base(self.to_base(value)))
    }

    /// The unit of the time integral of this unit's base unit.
    pub fn time_integral(&self) -> Result<Unit, UnitError> {
        let base = self.base;
        let integral = ["/m2s", "/m3s", "/ms"]
            .iter()
            .find(|suffix| base.len() > suffix.len() && base.ends_with(*suffix))
            .map(|_| &base[..base.len() - 1])
            .or_else(|| {
                (base.len() > 2 && base.ends_with("/s")).then(|| &base[..base.len() - 2])
            })
            .ok_or_else(|| UnitError::NotIntegrable(base.to_string()))?;
        Unit::parse(integral).map_err(|_| UnitError::NotIntegrable(base.to_string()))
    }

    /// The unit used to report time integrals of this unit.
    ///
    /// Accumulated energies are reported in kWh rather than J.
    pub fn reporting_integral(&self) -> Result<Unit, UnitError> {
        let integral = self.time_integral()?;
        match integral.name {
            "J" => Unit::parse("kWh"),
            "J/m2" => Unit::parse("kWh/m2"),
            _ => Ok(integral),
        }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Unit {}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

const UNITS: &[Unit] = &[
    // dimensionless
    Unit::new("---", "---", 1.0),
    Unit::new("-", "---", 1.0),
    Unit::new("%", "---", 0.01),
    // time
    Unit::new("s", "s", 1.0),
    Unit::new("ms", "s", 1e-3),
    Unit::new("min", "s", 60.0),
    Unit::new("h", "s", 3600.0),
    Unit::new("d", "s", 86400.0),
    Unit::new("a", "s", 31_536_000.0),
    // temperature
    Unit::new("K", "K", 1.0),
    Unit::with_offset("C", "K", 1.0, 273.15),
    // length, area, volume
    Unit::new("m", "m", 1.0),
    Unit::new("mm", "m", 1e-3),
    Unit::new("m2", "m2", 1.0),
    Unit::new("m3", "m3", 1.0),
    Unit::new("l", "m3", 1e-3),
    // mass and density
    Unit::new("kg", "kg", 1.0),
    Unit::new("g", "kg", 1e-3),
    Unit::new("kg/m3", "kg/m3", 1.0),
    // pressure
    Unit::new("Pa", "Pa", 1.0),
    Unit::new("kPa", "Pa", 1e3),
    Unit::new("bar", "Pa", 1e5),
    // energy
    Unit::new("J", "J", 1.0),
    Unit::new("kJ", "J", 1e3),
    Unit::new("MJ", "J", 1e6),
    Unit::new("Wh", "J", 3600.0),
    Unit::new("kWh", "J", 3.6e6),
    Unit::new("MWh", "J", 3.6e9),
    // energy rates
    Unit::new("J/s", "J/s", 1.0),
    Unit::new("W", "J/s", 1.0),
    Unit::new("kW", "J/s", 1e3),
    Unit::new("MW", "J/s", 1e6),
    // area related energy and energy rates
    Unit::new("J/m2", "J/m2", 1.0),
    Unit::new("kJ/m2", "J/m2", 1e3),
    Unit::new("MJ/m2", "J/m2", 1e6),
    Unit::new("Wh/m2", "J/m2", 3600.0),
    Unit::new("kWh/m2", "J/m2", 3.6e6),
    Unit::new("J/m2s", "J/m2s", 1.0),
    Unit::new("W/m2", "J/m2s", 1.0),
    Unit::new("kW/m2", "J/m2s", 1e3),
    // volume related energy and energy rates
    Unit::new("J/m3", "J/m3", 1.0),
    Unit::new("kWh/m3", "J/m3", 3.6e6),
    Unit::new("J/m3s", "J/m3s", 1.0),
    Unit::new("W/m3", "J/m3s", 1.0),
    // length related energy and energy rates
    Unit::new("J/m", "J/m", 1.0),
    Unit::new("kWh/m", "J/m", 3.6e6),
    Unit::new("J/ms", "J/ms", 1.0),
    Unit::new("W/m", "J/ms", 1.0),
    // mass and volume flows
    Unit::new("kg/s", "kg/s", 1.0),
    Unit::new("kg/h", "kg/s", 1.0 / 3600.0),
    Unit::new("kg/m2s", "kg/m2s", 1.0),
    Unit::new("kg/m2", "kg/m2", 1.0),
    Unit::new("m3/s", "m3/s", 1.0),
    Unit::new("m3/h", "m3/s", 1.0 / 3600.0),
    Unit::new("l/s", "m3/s", 1e-3),
    // velocities and rates
    Unit::new("m/s", "m/s", 1.0),
    Unit::new("1/s", "1/s", 1.0),
    Unit::new("1/h", "1/s", 1.0 / 3600.0),
    // heat transfer
    Unit::new("W/m2K", "W/m2K", 1.0),
    Unit::new("W/mK", "W/mK", 1.0),
    Unit::new("W/K", "W/K", 1.0),
];

/// A value with a unit, as written in configuration files (e.g. `"1 h"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    pub value: f64,
    pub unit: Unit,
}

impl Parameter {
    pub fn new(value: f64, unit: Unit) -> Self {
        Parameter { value, unit }
    }

    /// A parameter given in seconds.
    pub fn seconds(value: f64) -> Self {
        Parameter {
            value,
            unit: Unit::new("s", "s", 1.0),
        }
    }

    /// The value converted to the base unit.
    pub fn value_in_base(&self) -> f64 {
        self.unit.to_base(self.value)
    }
}

/// Parse `<number> <unit>`, with arbitrary surrounding whitespace.
fn parameter(input: &str) -> IResult<&str, (f64, &str)> {
    (
        preceded(multispace0, double),
        delimited(
            multispace1,
            take_while1(|c: char| !c.is_whitespace()),
            multispace0,
        ),
    )
        .parse(input)
}

impl FromStr for Parameter {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (value, unit)) = all_consuming(parameter)
            .parse(s)
            .map_err(|_| UnitError::MalformedParameter(s.to_string()))?;
        Ok(Parameter {
            value,
            unit: Unit::parse(unit)?,
        })
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

impl<'de> Deserialize<'de> for Parameter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Parameter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
