//! Unit expression parsing.
//!
//! Expressions are products and quotients of terms, evaluated left to right:
//!
//! ```text
//! Msun            named unit
//! km/s            quotient
//! Msun*km**2/s**2 powers with ** or ^
//! 1/Mpc**3        leading 1 for pure reciprocals
//! 1e10*Msun       numeric multipliers
//! ```
//!
//! An empty string, `"1"` and `"dimensionless"` all parse to the
//! dimensionless unit. Parentheses are not supported.

use super::{lookup, Unit};
use crate::errors::{UnitError, UnitResult};
use once_cell::sync::Lazy;
use regex::Regex;

static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<base>[A-Za-z_]+|[0-9]*\.?[0-9]+(?:[eE][+-]?[0-9]+)?)\s*(?:\^\s*\(?\s*(?P<power>[+-]?[0-9]+)\s*\)?)?\s*$",
    )
    .unwrap()
});

pub fn parse_unit(expression: &str) -> UnitResult<Unit> {
    let trimmed = expression.trim();
    if trimmed.is_empty() || trimmed == "1" || trimmed == "dimensionless" {
        return Ok(Unit::dimensionless());
    }

    let normalised = trimmed.replace("**", "^");
    let mut unit = Unit::dimensionless();
    let mut divide = false;
    let mut token = String::new();

    for c in normalised.chars().chain(core::iter::once('*')) {
        if c == '*' || c == '/' {
            let term = parse_term(expression, &token)?;
            let combined = if divide { unit.checked_div(&term) } else { unit.checked_mul(&term) };
            unit = combined.ok_or_else(|| UnitError::parse(expression, "exponent out of range"))?;
            divide = c == '/';
            token.clear();
        } else {
            token.push(c);
        }
    }

    Ok(unit)
}

fn parse_term(expression: &str, token: &str) -> UnitResult<Unit> {
    let caps = TERM_RE
        .captures(token)
        .ok_or_else(|| UnitError::parse(expression, &format!("invalid term '{}'", token.trim())))?;

    let power = match caps.name("power") {
        Some(p) => p
            .as_str()
            .parse::<i32>()
            .map_err(|_| UnitError::parse(expression, "invalid exponent"))?,
        None => 1,
    };

    let base = &caps["base"];
    if base.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        let value: f64 = base
            .parse()
            .map_err(|_| UnitError::parse(expression, &format!("invalid number '{}'", base)))?;
        return Ok(Unit::dimensionless().scaled(value.powi(power)));
    }

    let named = lookup(base).ok_or_else(|| UnitError::UnknownUnit(base.to_string()))?;
    Ok(Unit::from_named(&[(named, power)]))
}
