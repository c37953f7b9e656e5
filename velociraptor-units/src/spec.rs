//! Per-field unit metadata with cosmological corrections.
//!
//! Catalogue values are stored in a file-native unit and may additionally be
//! comoving and/or carry powers of little-h. A [`UnitSpec`] records all three
//! and turns raw values into a physical [`UnitAwareArray`]:
//!
//! ```text
//! physical = raw * h^h_exponent * (a^scale_factor_exponent if comoving)
//! ```
//!
//! then re-expresses the result in [`Unit::preferred`] for its dimensions.

use crate::array::UnitAwareArray;
use crate::unit::Unit;
use crate::Dimensions;

#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    /// File-native unit; its dimensions are the physical exponents.
    pub unit: Unit,
    pub scale_factor_exponent: f64,
    pub h_exponent: f64,
    /// Stored values are comoving and need `a^scale_factor_exponent`.
    pub comoving: bool,
}

impl Default for UnitSpec {
    fn default() -> Self {
        Self::dimensionless()
    }
}

impl UnitSpec {
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            scale_factor_exponent: 0.0,
            h_exponent: 0.0,
            comoving: false,
        }
    }

    pub fn dimensionless() -> Self {
        Self::new(Unit::dimensionless())
    }

    pub fn with_scale_factor_exponent(mut self, exponent: f64) -> Self {
        self.scale_factor_exponent = exponent;
        self
    }

    pub fn with_h_exponent(mut self, exponent: f64) -> Self {
        self.h_exponent = exponent;
        self
    }

    pub fn with_comoving(mut self, comoving: bool) -> Self {
        self.comoving = comoving;
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        self.unit.dimensions()
    }

    /// The unit [`apply`](Self::apply) expresses its output in.
    pub fn output_unit(&self) -> Unit {
        Unit::preferred(self.dimensions())
    }

    /// Multiplicative cosmology correction for scale factor `a` and little-h `h`.
    pub fn correction(&self, a: f64, h: f64) -> f64 {
        let mut factor = if self.h_exponent != 0.0 { h.powf(self.h_exponent) } else { 1.0 };
        if self.comoving && self.scale_factor_exponent != 0.0 {
            factor *= a.powf(self.scale_factor_exponent);
        }
        factor
    }

    /// Builds the physical array for raw on-disk values.
    pub fn apply(&self, raw: Vec<f64>, a: f64, h: f64) -> UnitAwareArray {
        let output = self.output_unit();
        let factor = self.correction(a, h) * self.unit.si_factor() / output.si_factor();
        let values = if factor == 1.0 {
            raw
        } else {
            raw.into_iter().map(|v| v * factor).collect()
        };
        UnitAwareArray::new(values, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensionless_passes_values_through() {
        let arr = UnitSpec::dimensionless().apply(vec![1.0, 2.0], 0.5, 0.7);
        assert_eq!(arr.values(), &[1.0, 2.0]);
        assert!(arr.unit().is_dimensionless());
    }

    #[test]
    fn native_scale_is_folded_into_values() {
        let spec = UnitSpec::new(Unit::named("Msun").unwrap().scaled(1.0e10));
        let arr = spec.apply(vec![500.0], 1.0, 1.0);
        assert_eq!(arr.unit().to_string(), "Msun");
        assert!((arr[0] / 5.0e12 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn comoving_lengths_pick_up_scale_factor() {
        let spec = UnitSpec::new(Unit::named("Mpc").unwrap())
            .with_scale_factor_exponent(1.0)
            .with_comoving(true);
        let arr = spec.apply(vec![10.0], 0.5, 1.0);
        assert!((arr[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn physical_values_ignore_scale_factor() {
        let spec = UnitSpec::new(Unit::named("Mpc").unwrap()).with_scale_factor_exponent(1.0);
        let arr = spec.apply(vec![10.0], 0.5, 1.0);
        assert!((arr[0] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn little_h_exponent_applies() {
        let spec = UnitSpec::new(Unit::named("Msun").unwrap()).with_h_exponent(-1.0);
        assert!((spec.correction(1.0, 0.7) - 1.0 / 0.7).abs() < 1e-12);
    }
}
