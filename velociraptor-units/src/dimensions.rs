//! Physical dimensions as integer exponents of mass, length, time and temperature.
//!
//! Halo catalogues only ever need these four base quantities. Every named unit
//! and every unit expression reduces to one [`Dimensions`] value, and two units
//! are convertible exactly when their dimensions compare equal.
//!
//! ```
//! use velociraptor_units::Dimensions;
//!
//! let velocity = Dimensions::LENGTH / Dimensions::TIME;
//! let energy = Dimensions::MASS * velocity.powi(2);
//! assert_eq!(energy, Dimensions::new(1, 2, -2, 0));
//! ```

use core::fmt;
use core::ops::{Div, Mul};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions {
    pub mass: i32,
    pub length: i32,
    pub time: i32,
    pub temperature: i32,
}

impl Dimensions {
    pub const DIMENSIONLESS: Self = Self::new(0, 0, 0, 0);
    pub const MASS: Self = Self::new(1, 0, 0, 0);
    pub const LENGTH: Self = Self::new(0, 1, 0, 0);
    pub const TIME: Self = Self::new(0, 0, 1, 0);
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 1);

    pub const fn new(mass: i32, length: i32, time: i32, temperature: i32) -> Self {
        Self {
            mass,
            length,
            time,
            temperature,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }

    /// Exponents saturate at the `i32` bounds.
    pub fn powi(self, power: i32) -> Self {
        Self::new(
            self.mass.saturating_mul(power),
            self.length.saturating_mul(power),
            self.time.saturating_mul(power),
            self.temperature.saturating_mul(power),
        )
    }

    /// `None` if an exponent overflows.
    pub fn checked_powi(self, power: i32) -> Option<Self> {
        Some(Self::new(
            self.mass.checked_mul(power)?,
            self.length.checked_mul(power)?,
            self.time.checked_mul(power)?,
            self.temperature.checked_mul(power)?,
        ))
    }
}

impl Mul for Dimensions {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.mass.saturating_add(rhs.mass),
            self.length.saturating_add(rhs.length),
            self.time.saturating_add(rhs.time),
            self.temperature.saturating_add(rhs.temperature),
        )
    }
}

impl Div for Dimensions {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self * rhs.powi(-1)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "[1]");
        }
        let parts: Vec<String> = [
            ("M", self.mass),
            ("L", self.length),
            ("T", self.time),
            ("Θ", self.temperature),
        ]
        .iter()
        .filter(|(_, p)| *p != 0)
        .map(|(s, p)| if *p == 1 { s.to_string() } else { format!("{}^{}", s, p) })
        .collect();
        write!(f, "[{}]", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_is_length_over_time() {
        let v = Dimensions::LENGTH / Dimensions::TIME;
        assert_eq!(v, Dimensions::new(0, 1, -1, 0));
    }

    #[test]
    fn angular_momentum_composes() {
        let v = Dimensions::LENGTH / Dimensions::TIME;
        let l = Dimensions::MASS * Dimensions::LENGTH * v;
        assert_eq!(l, Dimensions::new(1, 2, -1, 0));
    }

    #[test]
    fn huge_powers_do_not_wrap() {
        assert_eq!(Dimensions::MASS.checked_powi(i32::MAX), Some(Dimensions::new(i32::MAX, 0, 0, 0)));
        assert_eq!(Dimensions::new(2, 0, 0, 0).checked_powi(i32::MAX), None);
        assert_eq!(Dimensions::new(2, 0, 0, 0).powi(i32::MAX).mass, i32::MAX);
        assert_eq!(Dimensions::new(i32::MAX, 0, 0, 0) * Dimensions::MASS, Dimensions::new(i32::MAX, 0, 0, 0));
    }

    #[test]
    fn display_lists_nonzero_exponents() {
        assert_eq!(Dimensions::new(1, 2, -2, 0).to_string(), "[M L^2 T^-2]");
        assert_eq!(Dimensions::DIMENSIONLESS.to_string(), "[1]");
    }
}
