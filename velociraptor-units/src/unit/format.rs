//! Plain-text and LaTeX rendering of units.
//!
//! Plain text follows the expression grammar accepted by the parser, so
//! `unit.to_string().parse()` gives back an equal unit:
//!
//! ```
//! use velociraptor_units::Unit;
//!
//! let u: Unit = "Msun*km**2/s**2".parse().unwrap();
//! assert_eq!(u.to_string(), "Msun*km**2/s**2");
//! assert_eq!(u.latex(), r"{\rm M}_\odot\,{\rm km}^{2}\,{\rm s}^{-2}");
//! ```

use super::Unit;
use core::fmt;

fn format_multiplier(m: f64) -> String {
    let exponent = m.abs().log10();
    if m > 0.0 && (exponent - exponent.round()).abs() < 1e-12 {
        format!("1e{}", exponent.round() as i32)
    } else {
        format!("{}", m)
    }
}

fn latex_multiplier(m: f64) -> String {
    let exponent = m.abs().log10();
    if m > 0.0 && (exponent - exponent.round()).abs() < 1e-12 {
        format!("10^{{{}}}", exponent.round() as i32)
    } else {
        format!("{}\\times", m)
    }
}

fn has_multiplier(m: f64) -> bool {
    (m - 1.0).abs() > 1e-15
}

impl Unit {
    /// LaTeX body for use inside math mode, without surrounding `$`.
    ///
    /// Dimensionless units render as an empty string.
    pub fn latex(&self) -> String {
        let mut parts = Vec::new();
        if has_multiplier(self.multiplier) {
            parts.push(latex_multiplier(self.multiplier));
        }
        for term in &self.terms {
            if term.power == 1 {
                parts.push(term.unit.latex.to_string());
            } else {
                parts.push(format!("{}^{{{}}}", term.unit.latex, term.power));
            }
        }
        parts.join("\\,")
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let power = |p: i32| if p == 1 { String::new() } else { format!("**{}", p) };

        let mut numerator: Vec<String> = Vec::new();
        if has_multiplier(self.multiplier) {
            numerator.push(format_multiplier(self.multiplier));
        }
        numerator.extend(
            self.terms
                .iter()
                .filter(|t| t.power > 0)
                .map(|t| format!("{}{}", t.unit.symbol, power(t.power))),
        );
        let denominator: Vec<String> = self
            .terms
            .iter()
            .filter(|t| t.power < 0)
            .map(|t| format!("{}{}", t.unit.symbol, power(-t.power)))
            .collect();

        if numerator.is_empty() && denominator.is_empty() {
            return write!(f, "dimensionless");
        }
        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", numerator.join("*"))?;
        }
        for d in denominator {
            write!(f, "/{}", d)?;
        }
        Ok(())
    }
}
