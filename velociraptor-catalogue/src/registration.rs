//! Field classification.
//!
//! Every dataset name in a Velociraptor `.properties` file is sorted into one
//! [`Category`] by an ordered table of rules. Each rule inspects the raw name
//! and, on a match, returns the normalized attribute name and the kind of
//! unit the field carries. The first matching rule wins, so the order of
//! [`RULES`] is part of the contract: `SO_Mass_500_rhocrit` belongs to the
//! spherical overdensities even though it also looks like a mass, and
//! `RVmax_sigV` belongs to the rvmax quantities rather than the radii.
//!
//! Names no rule claims fall into [`Category::Unclassified`] under their
//! lowercased raw name, so they stay reachable.
//!
//! ```
//! use velociraptor_catalogue::registration::{classify, Category};
//!
//! let field = classify("Mass_200crit");
//! assert_eq!(field.category, Category::Masses);
//! assert_eq!(field.normalized_name, "mass_200crit");
//! ```

use core::fmt;
use core::str::FromStr;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Metallicity,
    Ids,
    Energies,
    StellarAge,
    SphericalOverdensities,
    RotationalSupport,
    StarFormationRate,
    RvmaxQuantities,
    Masses,
    Eigenvectors,
    Radii,
    Temperature,
    VelocityDispersion,
    AngularMomentum,
    Spin,
    ProjectedApertures,
    Apertures,
    Number,
    Velocities,
    Positions,
    Concentration,
    StructureType,
    Unclassified,
}

impl Category {
    pub const ALL: [Category; 23] = [
        Category::Metallicity,
        Category::Ids,
        Category::Energies,
        Category::StellarAge,
        Category::SphericalOverdensities,
        Category::RotationalSupport,
        Category::StarFormationRate,
        Category::RvmaxQuantities,
        Category::Masses,
        Category::Eigenvectors,
        Category::Radii,
        Category::Temperature,
        Category::VelocityDispersion,
        Category::AngularMomentum,
        Category::Spin,
        Category::ProjectedApertures,
        Category::Apertures,
        Category::Number,
        Category::Velocities,
        Category::Positions,
        Category::Concentration,
        Category::StructureType,
        Category::Unclassified,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Metallicity => "metallicity",
            Category::Ids => "ids",
            Category::Energies => "energies",
            Category::StellarAge => "stellar_age",
            Category::SphericalOverdensities => "spherical_overdensities",
            Category::RotationalSupport => "rotational_support",
            Category::StarFormationRate => "star_formation_rate",
            Category::RvmaxQuantities => "rvmax_quantities",
            Category::Masses => "masses",
            Category::Eigenvectors => "eigenvectors",
            Category::Radii => "radii",
            Category::Temperature => "temperature",
            Category::VelocityDispersion => "velocity_dispersion",
            Category::AngularMomentum => "angular_momentum",
            Category::Spin => "spin",
            Category::ProjectedApertures => "projected_apertures",
            Category::Apertures => "apertures",
            Category::Number => "number",
            Category::Velocities => "velocities",
            Category::Positions => "positions",
            Category::Concentration => "concentration",
            Category::StructureType => "structure_type",
            Category::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// The kind of physical unit a field is stored in.
///
/// The registry turns this into a concrete file-native unit using the
/// catalogue's `UnitInfo` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Dimensionless,
    Mass,
    Length,
    Velocity,
    Age,
    StarFormationRate,
    Temperature,
    Energy,
    AngularMomentum,
    Metallicity,
}

/// Classification result for one raw field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub raw_name: String,
    pub category: Category,
    pub normalized_name: String,
    pub unit_kind: UnitKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub normalized_name: String,
    pub unit_kind: UnitKind,
}

impl Match {
    fn new(normalized_name: impl Into<String>, unit_kind: UnitKind) -> Self {
        Self {
            normalized_name: normalized_name.into(),
            unit_kind,
        }
    }

    fn lowercase(raw: &str, unit_kind: UnitKind) -> Self {
        Self::new(raw.to_lowercase(), unit_kind)
    }
}

/// One entry of the classification table.
pub struct Rule {
    pub category: Category,
    pub matcher: fn(&str) -> Option<Match>,
}

impl Rule {
    pub fn apply(&self, raw_name: &str) -> Option<FieldDescriptor> {
        (self.matcher)(raw_name).map(|m| FieldDescriptor {
            raw_name: raw_name.to_string(),
            category: self.category,
            normalized_name: m.normalized_name,
            unit_kind: m.unit_kind,
        })
    }
}

/// Production rules, in evaluation order.
pub static RULES: &[Rule] = &[
    Rule { category: Category::Metallicity, matcher: metallicity },
    Rule { category: Category::Ids, matcher: ids },
    Rule { category: Category::Energies, matcher: energies },
    Rule { category: Category::StellarAge, matcher: stellar_age },
    Rule { category: Category::SphericalOverdensities, matcher: spherical_overdensities },
    Rule { category: Category::RotationalSupport, matcher: rotational_support },
    Rule { category: Category::StarFormationRate, matcher: star_formation_rate },
    Rule { category: Category::RvmaxQuantities, matcher: rvmax_quantities },
    Rule { category: Category::Masses, matcher: masses },
    Rule { category: Category::Eigenvectors, matcher: eigenvectors },
    Rule { category: Category::Radii, matcher: radii },
    Rule { category: Category::Temperature, matcher: temperature },
    Rule { category: Category::VelocityDispersion, matcher: velocity_dispersion },
    Rule { category: Category::AngularMomentum, matcher: angular_momentum },
    Rule { category: Category::Spin, matcher: spin },
    Rule { category: Category::ProjectedApertures, matcher: projected_apertures },
    Rule { category: Category::Apertures, matcher: apertures },
    Rule { category: Category::Number, matcher: number },
    Rule { category: Category::Velocities, matcher: velocities },
    Rule { category: Category::Positions, matcher: positions },
    Rule { category: Category::Concentration, matcher: concentration },
    Rule { category: Category::StructureType, matcher: structure_type },
];

/// Classifies `raw_name` against `rules`, returning `None` if nothing matches.
pub fn classify_with(rules: &[Rule], raw_name: &str) -> Option<FieldDescriptor> {
    rules.iter().find_map(|rule| rule.apply(raw_name))
}

/// Classifies a raw field name. Total: unmatched names are `Unclassified`.
pub fn classify(raw_name: &str) -> FieldDescriptor {
    classify_with(RULES, raw_name).unwrap_or_else(|| FieldDescriptor {
        raw_name: raw_name.to_string(),
        category: Category::Unclassified,
        normalized_name: raw_name.to_lowercase(),
        unit_kind: UnitKind::Dimensionless,
    })
}

static APERTURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Aperture_([^_]+)_(?:([A-Za-z]+)_)?(?:(sf|nsf)_)?([0-9]+)_kpc$").unwrap()
});

static PROJECTED_APERTURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Projected_aperture_([0-9])_([^_]+)_(?:([A-Za-z]+)_)?(?:(sf|nsf)_)?([0-9]+)_kpc$")
        .unwrap()
});

static SHAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[qs](_[A-Za-z]+)?$").unwrap());

static TEMPERATURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^T(_[A-Za-z]+)?$").unwrap());

static ANGULAR_MOMENTUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^L[xyz](_|$)").unwrap());

/// Unit carried by an aperture-style quantity token (`mass`, `SFR`, ...).
fn quantity_unit(quantity: &str) -> UnitKind {
    match quantity {
        "mass" | "Mass" | "M" => UnitKind::Mass,
        "rhalfmass" | "R" => UnitKind::Length,
        "veldisp" | "sigV" => UnitKind::Velocity,
        "SFR" => UnitKind::StarFormationRate,
        "Zmet" => UnitKind::Metallicity,
        q if ANGULAR_MOMENTUM_RE.is_match(q) => UnitKind::AngularMomentum,
        _ => UnitKind::Dimensionless,
    }
}

fn join_tokens(tokens: &[Option<&str>]) -> String {
    tokens
        .iter()
        .flatten()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

fn metallicity(raw: &str) -> Option<Match> {
    raw.starts_with("Zmet")
        .then(|| Match::lowercase(raw, UnitKind::Metallicity))
}

fn ids(raw: &str) -> Option<Match> {
    (raw == "ID" || raw.starts_with("ID_") || raw == "hostHaloID")
        .then(|| Match::lowercase(raw, UnitKind::Dimensionless))
}

fn energies(raw: &str) -> Option<Match> {
    if raw.starts_with("Ekin") || raw.starts_with("Epot") {
        Some(Match::lowercase(raw, UnitKind::Energy))
    } else if raw.starts_with("Efrac") {
        Some(Match::lowercase(raw, UnitKind::Dimensionless))
    } else {
        None
    }
}

fn stellar_age(raw: &str) -> Option<Match> {
    raw.starts_with("tage_")
        .then(|| Match::lowercase(raw, UnitKind::Age))
}

fn spherical_overdensities(raw: &str) -> Option<Match> {
    let rest = raw.strip_prefix("SO_")?;
    let quantity = rest.split('_').next().unwrap_or_default();
    Some(Match::lowercase(rest, quantity_unit(quantity)))
}

fn rotational_support(raw: &str) -> Option<Match> {
    raw.starts_with("Krot")
        .then(|| Match::lowercase(raw, UnitKind::Dimensionless))
}

fn star_formation_rate(raw: &str) -> Option<Match> {
    raw.starts_with("SFR")
        .then(|| Match::lowercase(raw, UnitKind::StarFormationRate))
}

fn rvmax_quantities(raw: &str) -> Option<Match> {
    let rest = raw.strip_prefix("RVmax_")?;
    let unit = if rest.starts_with("sigV") || rest.starts_with("veldisp_") {
        UnitKind::Velocity
    } else if ANGULAR_MOMENTUM_RE.is_match(rest) {
        UnitKind::AngularMomentum
    } else {
        UnitKind::Dimensionless
    };
    Some(Match::lowercase(rest, unit))
}

fn masses(raw: &str) -> Option<Match> {
    (raw.starts_with("Mass") || raw.starts_with("M_") || raw == "Mvir")
        .then(|| Match::lowercase(raw, UnitKind::Mass))
}

fn eigenvectors(raw: &str) -> Option<Match> {
    (raw.starts_with("eig_") || SHAPE_RE.is_match(raw))
        .then(|| Match::lowercase(raw, UnitKind::Dimensionless))
}

fn radii(raw: &str) -> Option<Match> {
    (raw.starts_with("R_") || raw == "Rmax" || raw == "Rvir")
        .then(|| Match::lowercase(raw, UnitKind::Length))
}

fn temperature(raw: &str) -> Option<Match> {
    TEMPERATURE_RE
        .is_match(raw)
        .then(|| Match::lowercase(raw, UnitKind::Temperature))
}

fn velocity_dispersion(raw: &str) -> Option<Match> {
    (raw.starts_with("sigV") || raw.starts_with("veldisp_"))
        .then(|| Match::lowercase(raw, UnitKind::Velocity))
}

fn angular_momentum(raw: &str) -> Option<Match> {
    ANGULAR_MOMENTUM_RE
        .is_match(raw)
        .then(|| Match::lowercase(raw, UnitKind::AngularMomentum))
}

fn spin(raw: &str) -> Option<Match> {
    raw.starts_with("lambda_")
        .then(|| Match::lowercase(raw, UnitKind::Dimensionless))
}

fn projected_apertures(raw: &str) -> Option<Match> {
    let caps = PROJECTED_APERTURE_RE.captures(raw)?;
    let get = |i| caps.get(i).map(|m| m.as_str());
    let name = join_tokens(&[
        Some("projection"),
        get(1),
        get(2),
        get(3),
        get(4),
        get(5),
        Some("kpc"),
    ]);
    Some(Match::new(name, quantity_unit(&caps[2])))
}

fn apertures(raw: &str) -> Option<Match> {
    let caps = APERTURE_RE.captures(raw)?;
    let get = |i| caps.get(i).map(|m| m.as_str());
    let name = join_tokens(&[get(1), get(2), get(3), get(4), Some("kpc")]);
    Some(Match::new(name, quantity_unit(&caps[1])))
}

fn number(raw: &str) -> Option<Match> {
    (raw.starts_with("n_") || raw == "npart" || raw == "numSubStruct" || raw.starts_with("Num_"))
        .then(|| Match::lowercase(raw, UnitKind::Dimensionless))
}

fn velocities(raw: &str) -> Option<Match> {
    raw.starts_with('V')
        .then(|| Match::lowercase(raw, UnitKind::Velocity))
}

fn positions(raw: &str) -> Option<Match> {
    (raw.starts_with("Xc") || raw.starts_with("Yc") || raw.starts_with("Zc"))
        .then(|| Match::lowercase(raw, UnitKind::Length))
}

fn concentration(raw: &str) -> Option<Match> {
    raw.starts_with("cNFW")
        .then(|| Match::lowercase(raw, UnitKind::Dimensionless))
}

fn structure_type(raw: &str) -> Option<Match> {
    (raw == "Structuretype").then(|| Match::lowercase(raw, UnitKind::Dimensionless))
}
