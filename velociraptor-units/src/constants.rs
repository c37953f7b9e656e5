/// IAU 2015 nominal solar mass, in kilograms.
pub const SOLAR_MASS_KG: f64 = 1.988_409_870_698_051e30;

/// IAU 2012 parsec, in metres.
#[allow(clippy::excessive_precision)]
pub const PARSEC_M: f64 = 3.085_677_581_491_367_3e16;

pub const KILOPARSEC_M: f64 = 1.0e3 * PARSEC_M;

pub const MEGAPARSEC_M: f64 = 1.0e6 * PARSEC_M;

pub const GIGAPARSEC_M: f64 = 1.0e9 * PARSEC_M;

/// Julian year, in seconds.
pub const YEAR_S: f64 = 365.25 * 86_400.0;

pub const MEGAYEAR_S: f64 = 1.0e6 * YEAR_S;

pub const GIGAYEAR_S: f64 = 1.0e9 * YEAR_S;

pub const KILOMETRE_M: f64 = 1.0e3;

pub const CENTIMETRE_M: f64 = 1.0e-2;

pub const GRAM_KG: f64 = 1.0e-3;

/// Relative tolerance used when comparing unit scale factors.
pub const UNIT_SCALE_RTOL: f64 = 1.0e-12;
