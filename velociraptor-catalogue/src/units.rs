//! Unit system and per-field unit registry.
//!
//! Velociraptor records its internal units once per file as attributes on
//! the `UnitInfo` group, and the cosmology on `SimulationInfo`. Newer
//! outputs also attach explicit dimensional exponents to each dataset.
//! [`build_registry`] combines both into one [`UnitSpec`] per field:
//!
//! 1. explicit dataset attributes (`U_M exponent`, `U_L exponent`,
//!    `U_t exponent`, `U_T exponent`, `a-scale exponent`,
//!    `h-scale exponent`);
//! 2. the unit kind the classifier assigned to the field name;
//! 3. dimensionless.
//!
//! Missing or malformed metadata never fails loading.

use crate::error::Result;
use crate::registration::{FieldDescriptor, UnitKind};
use crate::source::Source;
use std::collections::HashMap;
use velociraptor_units::unit::{KELVIN, KM, KPC, MSUN, S, YR};
use velociraptor_units::{Unit, UnitSpec};

const UNIT_INFO: &str = "UnitInfo";
const SIMULATION_INFO: &str = "SimulationInfo";

/// Cosmological parameters from the `SimulationInfo` header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cosmology {
    pub scale_factor: f64,
    pub h: f64,
    /// Box side length in file length units.
    pub period: f64,
    pub omega_m: f64,
    pub omega_b: f64,
    pub omega_lambda: f64,
    pub cosmological: bool,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            h: 1.0,
            period: 0.0,
            omega_m: 0.0,
            omega_b: 0.0,
            omega_lambda: 0.0,
            cosmological: false,
        }
    }
}

impl Cosmology {
    pub fn redshift(&self) -> f64 {
        1.0 / self.scale_factor - 1.0
    }
}

/// File-wide unit conventions from the `UnitInfo` header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSystem {
    pub length_to_kpc: f64,
    pub mass_to_msun: f64,
    pub velocity_to_kms: f64,
    pub sfr_to_msun_per_yr: f64,
    pub age_to_yr: f64,
    pub metallicity_to_solar: f64,
    /// `Comoving_or_Physical`: lengths are stored comoving.
    pub comoving: bool,
    pub cosmological: bool,
    pub cosmology: Cosmology,
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self {
            length_to_kpc: 1.0,
            mass_to_msun: 1.0,
            velocity_to_kms: 1.0,
            sfr_to_msun_per_yr: 1.0,
            age_to_yr: 1.0,
            metallicity_to_solar: 1.0,
            comoving: false,
            cosmological: false,
            cosmology: Cosmology::default(),
        }
    }
}

/// Reads a numeric header attribute, falling back to `default` when it is
/// absent, unreadable or not finite.
fn header_value(source: &dyn Source, group: &str, name: &str, default: f64) -> f64 {
    match source.header_attribute(group, name) {
        Ok(Some(v)) if v.is_finite() => v,
        Ok(Some(v)) => {
            tracing::debug!(group, name, value = v, "non-finite header attribute, using default");
            default
        }
        Ok(None) => default,
        Err(e) => {
            tracing::debug!(group, name, error = %e, "unreadable header attribute, using default");
            default
        }
    }
}

fn header_flag(source: &dyn Source, group: &str, name: &str) -> bool {
    header_value(source, group, name, 0.0) != 0.0
}

/// Factor values are positive; anything else is treated as missing.
fn header_factor(source: &dyn Source, name: &str) -> f64 {
    let v = header_value(source, UNIT_INFO, name, 1.0);
    if v > 0.0 {
        v
    } else {
        tracing::debug!(name, value = v, "non-positive unit factor, using 1");
        1.0
    }
}

impl UnitSystem {
    pub fn from_source(source: &dyn Source) -> Self {
        let cosmological = header_flag(source, UNIT_INFO, "Cosmological_Sim")
            || header_flag(source, SIMULATION_INFO, "Cosmological_Sim");
        let scale_factor = match header_value(source, SIMULATION_INFO, "ScaleFactor", 1.0) {
            a if a > 0.0 => a,
            _ => 1.0,
        };
        let h = match header_value(source, SIMULATION_INFO, "h_val", 1.0) {
            h if h > 0.0 => h,
            _ => 1.0,
        };
        let cosmology = Cosmology {
            scale_factor,
            h,
            period: header_value(source, SIMULATION_INFO, "Period", 0.0),
            omega_m: header_value(source, SIMULATION_INFO, "Omega_m", 0.0),
            omega_b: header_value(source, SIMULATION_INFO, "Omega_b", 0.0),
            omega_lambda: header_value(source, SIMULATION_INFO, "Omega_Lambda", 0.0),
            cosmological,
        };
        Self {
            length_to_kpc: header_factor(source, "Length_unit_to_kpc"),
            mass_to_msun: header_factor(source, "Mass_unit_to_solarmass"),
            velocity_to_kms: header_factor(source, "Velocity_unit_to_kms"),
            sfr_to_msun_per_yr: header_factor(source, "SFR_unit_to_solarmassperyear"),
            age_to_yr: header_factor(source, "Stellar_age_unit_to_yr"),
            metallicity_to_solar: header_factor(source, "Metallicity_unit_to_solar"),
            comoving: header_flag(source, UNIT_INFO, "Comoving_or_Physical"),
            cosmological,
            cosmology,
        }
    }

    /// Stored lengths need a factor of `a` to become physical.
    pub fn comoving_lengths(&self) -> bool {
        self.cosmological && self.comoving
    }

    pub fn mass(&self) -> Unit {
        Unit::from_named(&[(&MSUN, 1)]).scaled(self.mass_to_msun)
    }

    pub fn length(&self) -> Unit {
        Unit::from_named(&[(&KPC, 1)]).scaled(self.length_to_kpc)
    }

    pub fn velocity(&self) -> Unit {
        Unit::from_named(&[(&KM, 1), (&S, -1)]).scaled(self.velocity_to_kms)
    }

    /// Internal time unit, length over velocity.
    pub fn time(&self) -> Unit {
        self.length() / self.velocity()
    }

    pub fn age(&self) -> Unit {
        Unit::from_named(&[(&YR, 1)]).scaled(self.age_to_yr)
    }

    pub fn star_formation_rate(&self) -> Unit {
        Unit::from_named(&[(&MSUN, 1), (&YR, -1)]).scaled(self.sfr_to_msun_per_yr)
    }

    pub fn temperature(&self) -> Unit {
        Unit::from_named(&[(&KELVIN, 1)])
    }

    /// Default spec for fields classified with `kind`.
    pub fn spec_for_kind(&self, kind: UnitKind) -> UnitSpec {
        let comoving_length = |unit: Unit| {
            UnitSpec::new(unit)
                .with_scale_factor_exponent(1.0)
                .with_comoving(self.comoving_lengths())
        };
        match kind {
            UnitKind::Dimensionless => UnitSpec::dimensionless(),
            UnitKind::Mass => UnitSpec::new(self.mass()),
            UnitKind::Length => comoving_length(self.length()),
            UnitKind::Velocity => UnitSpec::new(self.velocity()),
            UnitKind::Age => UnitSpec::new(self.age()),
            UnitKind::StarFormationRate => UnitSpec::new(self.star_formation_rate()),
            UnitKind::Temperature => UnitSpec::new(self.temperature()),
            UnitKind::Energy => UnitSpec::new(self.mass() * self.velocity().powi(2)),
            UnitKind::AngularMomentum => {
                comoving_length(self.mass() * self.length() * self.velocity())
            }
            UnitKind::Metallicity => {
                UnitSpec::new(Unit::dimensionless().scaled(self.metallicity_to_solar))
            }
        }
    }

    /// Spec built from explicit dimensional exponents in internal units.
    pub fn spec_from_exponents(&self, exponents: &Exponents) -> UnitSpec {
        let unit = self.mass().powi(exponents.mass)
            * self.length().powi(exponents.length)
            * self.time().powi(exponents.time)
            * self.temperature().powi(exponents.temperature);
        UnitSpec::new(unit)
            .with_scale_factor_exponent(exponents.scale_factor)
            .with_h_exponent(exponents.h)
            .with_comoving(self.comoving_lengths())
    }
}

/// Explicit unit exponents attached to one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Exponents {
    pub mass: i32,
    pub length: i32,
    pub time: i32,
    pub temperature: i32,
    pub scale_factor: f64,
    pub h: f64,
}

const DIMENSION_ATTRIBUTES: [&str; 4] =
    ["U_M exponent", "U_L exponent", "U_t exponent", "U_T exponent"];

enum Explicit {
    Absent,
    Present(Exponents),
    Malformed(String),
}

/// Largest dimensional exponent accepted from file metadata.
const MAX_EXPONENT: f64 = 16.0;

fn integer_exponent(value: f64) -> Option<i32> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXPONENT)
        .then_some(value as i32)
}

fn read_explicit(source: &dyn Source, dataset: &str) -> Explicit {
    let read = |name: &str| source.dataset_attribute(dataset, name);

    let mut dims = [0i32; 4];
    let mut any = false;
    for (slot, name) in dims.iter_mut().zip(DIMENSION_ATTRIBUTES) {
        match read(name) {
            Ok(Some(v)) => match integer_exponent(v) {
                Some(p) => {
                    *slot = p;
                    any = true;
                }
                None => return Explicit::Malformed(format!("{} = {}", name, v)),
            },
            Ok(None) => {}
            Err(e) => return Explicit::Malformed(format!("{}: {}", name, e)),
        }
    }

    let mut scaling = [0.0f64; 2];
    for (slot, name) in scaling.iter_mut().zip(["a-scale exponent", "h-scale exponent"]) {
        match read(name) {
            Ok(Some(v)) if v.is_finite() => {
                *slot = v;
                any = true;
            }
            Ok(Some(v)) => return Explicit::Malformed(format!("{} = {}", name, v)),
            Ok(None) => {}
            Err(e) => return Explicit::Malformed(format!("{}: {}", name, e)),
        }
    }

    if !any {
        return Explicit::Absent;
    }
    Explicit::Present(Exponents {
        mass: dims[0],
        length: dims[1],
        time: dims[2],
        temperature: dims[3],
        scale_factor: scaling[0],
        h: scaling[1],
    })
}

/// Raw field name to [`UnitSpec`], built once when a catalogue opens.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    specs: HashMap<String, UnitSpec>,
}

impl UnitRegistry {
    pub fn get(&self, raw_name: &str) -> Option<&UnitSpec> {
        self.specs.get(raw_name)
    }

    /// Spec for `raw_name`, dimensionless if the field is unknown.
    pub fn spec(&self, raw_name: &str) -> UnitSpec {
        self.get(raw_name).cloned().unwrap_or_default()
    }

    pub fn insert(&mut self, raw_name: impl Into<String>, spec: UnitSpec) {
        self.specs.insert(raw_name.into(), spec);
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitSpec)> {
        self.specs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Builds the registry for `descriptors`. Only attribute metadata is read.
pub fn build_registry(
    source: &dyn Source,
    system: &UnitSystem,
    descriptors: &[FieldDescriptor],
) -> Result<UnitRegistry> {
    let mut registry = UnitRegistry::default();
    for descriptor in descriptors {
        let raw = descriptor.raw_name.as_str();
        let spec = match read_explicit(source, raw) {
            Explicit::Present(exponents) => system.spec_from_exponents(&exponents),
            Explicit::Absent => system.spec_for_kind(descriptor.unit_kind),
            Explicit::Malformed(reason) => {
                tracing::debug!(field = raw, %reason, "malformed unit metadata, treating as dimensionless");
                UnitSpec::dimensionless()
            }
        };
        registry.insert(raw, spec);
    }
    tracing::debug!(fields = registry.len(), "built unit registry");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::classify;
    use crate::source::MemorySource;
    use velociraptor_units::Dimensions;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0), "{} != {}", a, b);
    }

    fn cosmological_source() -> MemorySource {
        MemorySource::new("units")
            .with_header_attribute("UnitInfo", "Length_unit_to_kpc", 1000.0)
            .with_header_attribute("UnitInfo", "Mass_unit_to_solarmass", 1.0e10)
            .with_header_attribute("UnitInfo", "Velocity_unit_to_kms", 1.0)
            .with_header_attribute("UnitInfo", "Comoving_or_Physical", 1.0)
            .with_header_attribute("UnitInfo", "Cosmological_Sim", 1.0)
            .with_header_attribute("SimulationInfo", "ScaleFactor", 0.5)
            .with_header_attribute("SimulationInfo", "h_val", 0.7)
            .with_header_attribute("SimulationInfo", "Period", 100.0)
            .with_header_attribute("SimulationInfo", "Omega_m", 0.3)
    }

    #[test]
    fn missing_header_uses_defaults() {
        let system = UnitSystem::from_source(&MemorySource::new("empty"));
        assert_eq!(system, UnitSystem::default());
        assert_eq!(system.cosmology.redshift(), 0.0);
    }

    #[test]
    fn reads_unit_info_and_cosmology() {
        let system = UnitSystem::from_source(&cosmological_source());
        assert_eq!(system.length_to_kpc, 1000.0);
        assert_eq!(system.mass_to_msun, 1.0e10);
        assert!(system.comoving_lengths());
        assert_close(system.cosmology.redshift(), 1.0);
        assert_eq!(system.cosmology.h, 0.7);
        assert_eq!(system.cosmology.omega_m, 0.3);
        assert_eq!(system.cosmology.omega_b, 0.0);
    }

    #[test]
    fn non_finite_header_values_fall_back() {
        let source = MemorySource::new("bad")
            .with_header_attribute("UnitInfo", "Mass_unit_to_solarmass", f64::NAN)
            .with_header_attribute("SimulationInfo", "ScaleFactor", -1.0);
        let system = UnitSystem::from_source(&source);
        assert_eq!(system.mass_to_msun, 1.0);
        assert_eq!(system.cosmology.scale_factor, 1.0);
    }

    #[test]
    fn kind_default_scales_masses() {
        let source = cosmological_source().with_f64("Mass_200crit", vec![500.0]);
        let system = UnitSystem::from_source(&source);
        let registry = build_registry(&source, &system, &[classify("Mass_200crit")]).unwrap();
        let out = registry.spec("Mass_200crit").apply(vec![500.0], 0.5, 0.7);
        assert_eq!(out.unit().to_string(), "Msun");
        assert_close(out[0], 5.0e12);
    }

    #[test]
    fn comoving_lengths_pick_up_scale_factor() {
        let source = cosmological_source().with_f64("R_200crit", vec![1.0]);
        let system = UnitSystem::from_source(&source);
        let registry = build_registry(&source, &system, &[classify("R_200crit")]).unwrap();
        let spec = registry.spec("R_200crit");
        assert!(spec.comoving);
        // 1 internal unit = 1000 kpc = 1 Mpc comoving; physical at a = 0.5.
        let out = spec.apply(vec![1.0], 0.5, 0.7);
        assert_eq!(out.unit().to_string(), "Mpc");
        assert_close(out[0], 0.5);
    }

    #[test]
    fn physical_files_do_not_apply_scale_factor() {
        let source = MemorySource::new("physical")
            .with_header_attribute("UnitInfo", "Cosmological_Sim", 1.0)
            .with_header_attribute("UnitInfo", "Comoving_or_Physical", 0.0);
        let system = UnitSystem::from_source(&source);
        let spec = system.spec_for_kind(UnitKind::Length);
        assert_close(spec.correction(0.5, 0.7), 1.0);
    }

    #[test]
    fn explicit_attributes_win_over_kind() {
        // Classified as a velocity, but the file says it is a mass.
        let source = MemorySource::new("explicit")
            .with_f64("Vmax", vec![1.0])
            .with_dataset_attribute("Vmax", "U_M exponent", 1.0)
            .with_dataset_attribute("Vmax", "h-scale exponent", -1.0);
        let system = UnitSystem::from_source(&source);
        let registry = build_registry(&source, &system, &[classify("Vmax")]).unwrap();
        let spec = registry.spec("Vmax");
        assert_eq!(spec.dimensions(), Dimensions::MASS);
        assert_eq!(spec.h_exponent, -1.0);
    }

    #[test]
    fn explicit_exponents_compose_internal_units() {
        let system = UnitSystem {
            length_to_kpc: 1000.0,
            ..UnitSystem::default()
        };
        let spec = system.spec_from_exponents(&Exponents {
            mass: 1,
            length: 2,
            time: -2,
            ..Exponents::default()
        });
        assert_eq!(spec.dimensions(), Dimensions::MASS * Dimensions::LENGTH.powi(2) / Dimensions::TIME.powi(2));
        assert_eq!(spec.output_unit().to_string(), "Msun*km**2/s**2");
    }

    #[test]
    fn malformed_exponent_degrades_to_dimensionless() {
        let source = MemorySource::new("malformed")
            .with_f64("Mass_tot", vec![1.0])
            .with_dataset_attribute("Mass_tot", "U_M exponent", 0.5);
        let system = UnitSystem::from_source(&source);
        let registry = build_registry(&source, &system, &[classify("Mass_tot")]).unwrap();
        assert_eq!(registry.spec("Mass_tot"), UnitSpec::dimensionless());
    }

    #[test]
    fn out_of_range_exponents_are_malformed() {
        let source = MemorySource::new("huge")
            .with_f64("Mass_tot", vec![1.0])
            .with_dataset_attribute("Mass_tot", "U_L exponent", 2.0e9)
            .with_dataset_attribute("Mass_tot", "U_t exponent", 2.0e9)
            .with_f64("Lx", vec![1.0])
            .with_dataset_attribute("Lx", "U_L exponent", 16.0);
        let system = UnitSystem::from_source(&source);
        let registry = build_registry(&source, &system, &[classify("Mass_tot"), classify("Lx")]).unwrap();
        assert_eq!(registry.spec("Mass_tot"), UnitSpec::dimensionless());
        assert_eq!(registry.spec("Lx").dimensions(), Dimensions::LENGTH.powi(16));
    }

    #[test]
    fn unknown_kind_is_dimensionless() {
        let source = MemorySource::new("plain").with_f64("Mystery", vec![1.0]);
        let system = UnitSystem::from_source(&source);
        let registry = build_registry(&source, &system, &[classify("Mystery")]).unwrap();
        assert!(registry.spec("Mystery").unit.is_dimensionless());
        assert!(registry.spec("NotEvenThere").unit.is_dimensionless());
    }

    #[test]
    fn metallicity_is_scaled_dimensionless() {
        let system = UnitSystem {
            metallicity_to_solar: 50.0,
            ..UnitSystem::default()
        };
        let out = system.spec_for_kind(UnitKind::Metallicity).apply(vec![0.02], 1.0, 1.0);
        assert!(out.unit().is_dimensionless());
        assert_close(out[0], 1.0);
    }
}
