//! Named units and unit expressions.
//!
//! A [`Unit`] is a numeric multiplier times a product of named units raised to
//! integer powers, for example `1e10*Msun` or `Msun*km**2/s**2`. Units carry no
//! global state: every array owns the unit it is expressed in, and conversion
//! is a pure function of the source and target units.
//!
//! # Named Units
//!
//! | Symbol | Quantity | SI value |
//! |--------|----------|----------|
//! | `Msun`, `kg`, `g` | mass | 1.98841e30 kg, 1 kg, 1e-3 kg |
//! | `pc`, `kpc`, `Mpc`, `Gpc` | length | 3.0857e16 m and multiples |
//! | `m`, `cm`, `km` | length | 1 m, 1e-2 m, 1e3 m |
//! | `s`, `yr`, `Myr`, `Gyr` | time | 1 s, Julian year and multiples |
//! | `K` | temperature | 1 K |
//!
//! `Solar_Mass`, `Msol` and `msun` are accepted as aliases for `Msun`.
//!
//! ```
//! use velociraptor_units::Unit;
//!
//! let kms: Unit = "km/s".parse().unwrap();
//! let kpc_per_gyr: Unit = "kpc/Gyr".parse().unwrap();
//! let factor = kms.conversion_factor(&kpc_per_gyr).unwrap();
//! assert!((factor - 1.0227).abs() < 1e-3);
//! ```

mod format;
mod parse;

pub use parse::parse_unit;

use crate::constants::*;
use crate::errors::{UnitError, UnitResult};
use crate::Dimensions;
use core::ops::{Div, Mul};

/// A unit with a fixed symbol and SI scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedUnit {
    pub symbol: &'static str,
    pub si_factor: f64,
    pub dimensions: Dimensions,
    pub latex: &'static str,
}

pub const MSUN: NamedUnit = NamedUnit {
    symbol: "Msun",
    si_factor: SOLAR_MASS_KG,
    dimensions: Dimensions::MASS,
    latex: r"{\rm M}_\odot",
};
pub const KG: NamedUnit = NamedUnit {
    symbol: "kg",
    si_factor: 1.0,
    dimensions: Dimensions::MASS,
    latex: r"{\rm kg}",
};
pub const G: NamedUnit = NamedUnit {
    symbol: "g",
    si_factor: GRAM_KG,
    dimensions: Dimensions::MASS,
    latex: r"{\rm g}",
};
pub const PC: NamedUnit = NamedUnit {
    symbol: "pc",
    si_factor: PARSEC_M,
    dimensions: Dimensions::LENGTH,
    latex: r"{\rm pc}",
};
pub const KPC: NamedUnit = NamedUnit {
    symbol: "kpc",
    si_factor: KILOPARSEC_M,
    dimensions: Dimensions::LENGTH,
    latex: r"{\rm kpc}",
};
pub const MPC: NamedUnit = NamedUnit {
    symbol: "Mpc",
    si_factor: MEGAPARSEC_M,
    dimensions: Dimensions::LENGTH,
    latex: r"{\rm Mpc}",
};
pub const GPC: NamedUnit = NamedUnit {
    symbol: "Gpc",
    si_factor: GIGAPARSEC_M,
    dimensions: Dimensions::LENGTH,
    latex: r"{\rm Gpc}",
};
pub const M: NamedUnit = NamedUnit {
    symbol: "m",
    si_factor: 1.0,
    dimensions: Dimensions::LENGTH,
    latex: r"{\rm m}",
};
pub const CM: NamedUnit = NamedUnit {
    symbol: "cm",
    si_factor: CENTIMETRE_M,
    dimensions: Dimensions::LENGTH,
    latex: r"{\rm cm}",
};
pub const KM: NamedUnit = NamedUnit {
    symbol: "km",
    si_factor: KILOMETRE_M,
    dimensions: Dimensions::LENGTH,
    latex: r"{\rm km}",
};
pub const S: NamedUnit = NamedUnit {
    symbol: "s",
    si_factor: 1.0,
    dimensions: Dimensions::TIME,
    latex: r"{\rm s}",
};
pub const YR: NamedUnit = NamedUnit {
    symbol: "yr",
    si_factor: YEAR_S,
    dimensions: Dimensions::TIME,
    latex: r"{\rm yr}",
};
pub const MYR: NamedUnit = NamedUnit {
    symbol: "Myr",
    si_factor: MEGAYEAR_S,
    dimensions: Dimensions::TIME,
    latex: r"{\rm Myr}",
};
pub const GYR: NamedUnit = NamedUnit {
    symbol: "Gyr",
    si_factor: GIGAYEAR_S,
    dimensions: Dimensions::TIME,
    latex: r"{\rm Gyr}",
};
pub const KELVIN: NamedUnit = NamedUnit {
    symbol: "K",
    si_factor: 1.0,
    dimensions: Dimensions::TEMPERATURE,
    latex: r"{\rm K}",
};

pub static NAMED_UNITS: &[&NamedUnit] = &[
    &MSUN, &KG, &G, &PC, &KPC, &MPC, &GPC, &M, &CM, &KM, &S, &YR, &MYR, &GYR, &KELVIN,
];

const ALIASES: &[(&str, &NamedUnit)] = &[
    ("Solar_Mass", &MSUN),
    ("Msol", &MSUN),
    ("msun", &MSUN),
    ("year", &YR),
    ("Kelvin", &KELVIN),
];

/// Looks up a named unit by symbol or alias.
pub fn lookup(symbol: &str) -> Option<&'static NamedUnit> {
    NAMED_UNITS
        .iter()
        .copied()
        .find(|u| u.symbol == symbol)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == symbol)
                .map(|(_, u)| *u)
        })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Term {
    unit: &'static NamedUnit,
    power: i32,
}

/// A product of named units with a numeric multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    multiplier: f64,
    terms: Vec<Term>,
}

impl Default for Unit {
    fn default() -> Self {
        Self::dimensionless()
    }
}

impl Unit {
    pub fn dimensionless() -> Self {
        Self {
            multiplier: 1.0,
            terms: Vec::new(),
        }
    }

    /// Builds a unit from already-resolved named units.
    pub fn from_named(parts: &[(&'static NamedUnit, i32)]) -> Self {
        parts
            .iter()
            .fold(Self::dimensionless(), |acc, &(unit, power)| {
                acc.with_term(unit, power)
            })
    }

    /// Parses a single symbol such as `"kpc"`.
    pub fn named(symbol: &str) -> UnitResult<Self> {
        lookup(symbol)
            .map(|u| Self::from_named(&[(u, 1)]))
            .ok_or_else(|| UnitError::UnknownUnit(symbol.to_string()))
    }

    /// Returns the same unit multiplied by a pure number (`1e10*Msun`).
    pub fn scaled(mut self, factor: f64) -> Self {
        self.multiplier *= factor;
        self
    }

    /// Raises the unit to `power`. Term exponents saturate at the `i32`
    /// bounds; see [`checked_powi`](Self::checked_powi).
    pub fn powi(&self, power: i32) -> Self {
        Self {
            multiplier: self.multiplier.powi(power),
            terms: self
                .terms
                .iter()
                .filter(|_| power != 0)
                .map(|t| Term {
                    unit: t.unit,
                    power: t.power.saturating_mul(power),
                })
                .collect(),
        }
    }

    /// `None` if a term exponent overflows.
    pub fn checked_powi(&self, power: i32) -> Option<Self> {
        let mut terms = Vec::with_capacity(self.terms.len());
        if power != 0 {
            for t in &self.terms {
                terms.push(Term {
                    unit: t.unit,
                    power: t.power.checked_mul(power)?,
                });
            }
        }
        Some(Self {
            multiplier: self.multiplier.powi(power),
            terms,
        })
    }

    /// Product of two units, `None` if a term exponent overflows.
    pub fn checked_mul(self, rhs: &Unit) -> Option<Self> {
        let multiplier = self.multiplier * rhs.multiplier;
        let mut out = rhs
            .terms
            .iter()
            .try_fold(self, |acc, t| acc.try_with_term(t.unit, t.power))?;
        out.multiplier = multiplier;
        Some(out)
    }

    /// Quotient of two units, `None` if a term exponent overflows.
    pub fn checked_div(self, rhs: &Unit) -> Option<Self> {
        self.checked_mul(&rhs.checked_powi(-1)?)
    }

    fn with_term(mut self, unit: &'static NamedUnit, power: i32) -> Self {
        if power == 0 {
            return self;
        }
        match self.terms.iter().position(|t| t.unit.symbol == unit.symbol) {
            Some(idx) => {
                let combined = self.terms[idx].power.saturating_add(power);
                if combined == 0 {
                    self.terms.remove(idx);
                } else {
                    self.terms[idx].power = combined;
                }
            }
            None => self.terms.push(Term { unit, power }),
        }
        self
    }

    fn try_with_term(mut self, unit: &'static NamedUnit, power: i32) -> Option<Self> {
        if power == 0 {
            return Some(self);
        }
        match self.terms.iter().position(|t| t.unit.symbol == unit.symbol) {
            Some(idx) => {
                let combined = self.terms[idx].power.checked_add(power)?;
                if combined == 0 {
                    self.terms.remove(idx);
                } else {
                    self.terms[idx].power = combined;
                }
            }
            None => self.terms.push(Term { unit, power }),
        }
        Some(self)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Value of one of this unit in SI base units (kg, m, s, K).
    pub fn si_factor(&self) -> f64 {
        self.terms
            .iter()
            .fold(self.multiplier, |acc, t| acc * t.unit.si_factor.powi(t.power))
    }

    pub fn dimensions(&self) -> Dimensions {
        self.terms
            .iter()
            .fold(Dimensions::DIMENSIONLESS, |acc, t| {
                acc * t.unit.dimensions.powi(t.power)
            })
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimensions().is_dimensionless()
    }

    /// Factor `f` such that `x [self] == x * f [target]`.
    ///
    /// # Errors
    /// Returns [`UnitError::IncompatibleUnits`] if the dimensions differ.
    pub fn conversion_factor(&self, target: &Unit) -> UnitResult<f64> {
        let (from, to) = (self.dimensions(), target.dimensions());
        if from != to {
            return Err(UnitError::IncompatibleUnits {
                from: self.to_string(),
                to: target.to_string(),
                from_dims: from.to_string(),
                to_dims: to.to_string(),
            });
        }
        Ok(self.si_factor() / target.si_factor())
    }

    /// True when both units have the same dimensions and scale.
    pub fn is_equivalent(&self, other: &Unit) -> bool {
        if self.dimensions() != other.dimensions() {
            return false;
        }
        let (a, b) = (self.si_factor(), other.si_factor());
        (a - b).abs() <= UNIT_SCALE_RTOL * a.abs().max(b.abs())
    }

    /// The display unit resolved catalogue arrays are expressed in.
    ///
    /// Common halo quantities get astronomer-friendly units (`Msun`, `Mpc`,
    /// `km/s`, `Msun/yr`); anything else becomes a product of `Msun`, `Mpc`,
    /// `yr` and `K`.
    pub fn preferred(dimensions: Dimensions) -> Self {
        let velocity = Dimensions::LENGTH / Dimensions::TIME;
        let d = dimensions;
        if d.is_dimensionless() {
            Self::dimensionless()
        } else if d == Dimensions::MASS {
            Self::from_named(&[(&MSUN, 1)])
        } else if d == Dimensions::LENGTH {
            Self::from_named(&[(&MPC, 1)])
        } else if d == Dimensions::TIME {
            Self::from_named(&[(&YR, 1)])
        } else if d == Dimensions::TEMPERATURE {
            Self::from_named(&[(&KELVIN, 1)])
        } else if d == velocity {
            Self::from_named(&[(&KM, 1), (&S, -1)])
        } else if d == Dimensions::MASS / Dimensions::TIME {
            Self::from_named(&[(&MSUN, 1), (&YR, -1)])
        } else if d == Dimensions::MASS * velocity.powi(2) {
            Self::from_named(&[(&MSUN, 1), (&KM, 2), (&S, -2)])
        } else if d == Dimensions::MASS * Dimensions::LENGTH * velocity {
            Self::from_named(&[(&MSUN, 1), (&MPC, 1), (&KM, 1), (&S, -1)])
        } else {
            Self::from_named(&[
                (&MSUN, d.mass),
                (&MPC, d.length),
                (&YR, d.time),
                (&KELVIN, d.temperature),
            ])
        }
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        let multiplier = self.multiplier * rhs.multiplier;
        let mut out = rhs
            .terms
            .iter()
            .fold(self, |acc, t| acc.with_term(t.unit, t.power));
        out.multiplier = multiplier;
        out
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Unit) -> Unit {
        self * rhs.powi(-1)
    }
}

impl core::str::FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_unit(s)
    }
}

impl serde::Serialize for Unit {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Unit {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let expr = String::deserialize(d)?;
        parse_unit(&expr).map_err(serde::de::Error::custom)
    }
}
