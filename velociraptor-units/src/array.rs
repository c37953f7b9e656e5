//! Unit-aware arrays and scalar quantities.
//!
//! [`UnitAwareArray`] pairs a `Vec<f64>` with the [`Unit`] its values are
//! expressed in and, optionally, the catalogue field it was read from.
//!
//! # Conversion
//!
//! [`UnitAwareArray::to`] always returns a new array and leaves the receiver
//! untouched. [`UnitAwareArray::convert_to_units`] rewrites the receiver in
//! place; calling it on an array held by a cache mutates the cached values
//! for every later reader, so it is only available through `&mut`.
//!
//! ```
//! use velociraptor_units::{Unit, UnitAwareArray};
//!
//! let r = UnitAwareArray::new(vec![250.0, 1000.0], Unit::named("kpc").unwrap());
//! let r_mpc = r.to("Mpc").unwrap();
//! assert!((r_mpc.values()[1] - 1.0).abs() < 1e-12);
//! assert_eq!(r.values()[1], 1000.0);
//! ```

use crate::errors::UnitResult;
use crate::unit::{parse_unit, Unit};
use core::fmt;
use core::ops::Index;

#[derive(Debug, Clone, PartialEq)]
pub struct UnitAwareArray {
    values: Vec<f64>,
    unit: Unit,
    name: Option<String>,
}

impl UnitAwareArray {
    pub fn new(values: Vec<f64>, unit: Unit) -> Self {
        Self {
            values,
            unit,
            name: None,
        }
    }

    pub fn dimensionless(values: Vec<f64>) -> Self {
        Self::new(values, Unit::dimensionless())
    }

    /// Attaches the originating field name (e.g. `"Mass_200crit"`).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Element `index` as a scalar [`Quantity`] in this array's unit.
    pub fn quantity(&self, index: usize) -> Option<Quantity> {
        self.values.get(index).map(|&value| Quantity {
            value,
            unit: self.unit.clone(),
        })
    }

    /// Returns a converted copy. The receiver is not modified.
    pub fn to(&self, target: &str) -> UnitResult<Self> {
        self.to_unit(&parse_unit(target)?)
    }

    pub fn to_unit(&self, target: &Unit) -> UnitResult<Self> {
        let factor = self.unit.conversion_factor(target)?;
        Ok(Self {
            values: self.values.iter().map(|v| v * factor).collect(),
            unit: target.clone(),
            name: self.name.clone(),
        })
    }

    /// Plain values expressed in `target`, without the unit wrapper.
    pub fn to_value(&self, target: &str) -> UnitResult<Vec<f64>> {
        Ok(self.to(target)?.into_values())
    }

    /// Converts this array in place.
    ///
    /// Mutates the instance it is called on; on an array shared through a
    /// cache every holder observes the new unit.
    pub fn convert_to_units(&mut self, target: &str) -> UnitResult<()> {
        let target = parse_unit(target)?;
        let factor = self.unit.conversion_factor(&target)?;
        self.values.iter_mut().for_each(|v| *v *= factor);
        self.unit = target;
        Ok(())
    }

    /// Smallest and largest finite values, or `None` if there are none.
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl Index<usize> for UnitAwareArray {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl fmt::Display for UnitAwareArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 6;
        let head: Vec<String> = self.values.iter().take(SHOWN).map(|v| format!("{:e}", v)).collect();
        let ellipsis = if self.values.len() > SHOWN { ", ..." } else { "" };
        write!(f, "[{}{}] {}", head.join(", "), ellipsis, self.unit)
    }
}

/// A single value with a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn to(&self, target: &str) -> UnitResult<Self> {
        self.to_unit(&parse_unit(target)?)
    }

    pub fn to_unit(&self, target: &Unit) -> UnitResult<Self> {
        let factor = self.unit.conversion_factor(target)?;
        Ok(Self {
            value: self.value * factor,
            unit: target.clone(),
        })
    }

    pub fn to_value(&self, target: &str) -> UnitResult<f64> {
        Ok(self.to(target)?.value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_dimensionless() && (self.unit.multiplier() - 1.0).abs() < 1e-15 {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}
