//! Axis labels for catalogue quantities.
//!
//! A label has three parts, each omitted when it does not apply:
//!
//! ```text
//! Stellar Mass $M_{\rm star, 30 kpc}$ $\left[{\rm M}_\odot\right]$
//! ```
//!
//! The symbol is built from the first token of the normalized name (`mass`
//! becomes `M`, `sigv` becomes `\sigma`) with the remaining tokens as a roman
//! subscript. Labels are pure functions of the field name and unit.

use crate::registration::{classify, Category, FieldDescriptor, UnitKind};
use velociraptor_units::{Unit, UnitAwareArray};

/// `(stem, base symbol, implied subscript)`. A stem matches as a prefix of the
/// first name token, so longer stems come before their own prefixes.
const STEMS: &[(&str, &str, &str)] = &[
    ("mass", "M", ""),
    ("rhalfmass", "R", "1/2"),
    ("npart", "N", ""),
    ("numsubstruct", "N", "sub"),
    ("num", "N", ""),
    ("sigv", r"\sigma", ""),
    ("veldisp", r"\sigma", ""),
    ("sfr", r"{\rm SFR}", ""),
    ("zmet", "Z", ""),
    ("tage", "t", ""),
    ("cnfw", "c", ""),
    ("krot", r"\kappa", "rot"),
    ("lambda", r"\lambda", ""),
    ("eig", "e", ""),
    ("xc", "x", ""),
    ("yc", "y", ""),
    ("zc", "z", ""),
    ("m", "M", ""),
    ("r", "R", ""),
    ("v", "v", ""),
    ("l", "L", ""),
    ("e", "E", ""),
    ("t", "T", ""),
    ("n", "N", ""),
    ("q", "q", ""),
    ("s", "s", ""),
];

/// Whole-name symbols that the stem rules get wrong.
const SYMBOL_OVERRIDES: &[(&str, &str)] = &[("cnfw", r"c_{\rm NFW}")];

const PARTICLE_TYPES: &[(&str, &str)] = &[
    ("gas", "Gas"),
    ("star", "Stellar"),
    ("bh", "Black Hole"),
    ("dm", "Dark Matter"),
];

fn category_prose(category: Category, kind: UnitKind) -> Option<&'static str> {
    Some(match category {
        Category::Metallicity => "Metallicity",
        Category::Ids => "Halo ID",
        Category::Energies => "Energy",
        Category::StellarAge => "Stellar Age",
        Category::RotationalSupport => "Rotational Support",
        Category::StarFormationRate => "Star Formation Rate",
        Category::Masses => "Mass",
        Category::Eigenvectors => "Shape",
        Category::Radii => "Radius",
        Category::Temperature => "Temperature",
        Category::VelocityDispersion => "Velocity Dispersion",
        Category::AngularMomentum => "Angular Momentum",
        Category::Spin => "Spin Parameter",
        Category::Number => "Number of Particles",
        Category::Velocities => "Velocity",
        Category::Positions => "Position",
        Category::Concentration => "Concentration",
        Category::StructureType => "Structure Type",
        Category::Unclassified => return None,
        Category::SphericalOverdensities
        | Category::RvmaxQuantities
        | Category::Apertures
        | Category::ProjectedApertures => kind_prose(kind)?,
    })
}

fn kind_prose(kind: UnitKind) -> Option<&'static str> {
    Some(match kind {
        UnitKind::Mass => "Mass",
        UnitKind::Length => "Radius",
        UnitKind::Velocity => "Velocity Dispersion",
        UnitKind::Age => "Age",
        UnitKind::StarFormationRate => "Star Formation Rate",
        UnitKind::Temperature => "Temperature",
        UnitKind::Energy => "Energy",
        UnitKind::AngularMomentum => "Angular Momentum",
        UnitKind::Metallicity => "Metallicity",
        UnitKind::Dimensionless => return None,
    })
}

fn descriptor_text(descriptor: &FieldDescriptor) -> Option<String> {
    let prose = category_prose(descriptor.category, descriptor.unit_kind)?;
    let particle = descriptor
        .normalized_name
        .split('_')
        .find_map(|t| PARTICLE_TYPES.iter().find(|(k, _)| *k == t).map(|(_, v)| *v));
    Some(match particle {
        Some(p) => format!("{} {}", p, prose),
        None => prose.to_string(),
    })
}

fn symbol(descriptor: &FieldDescriptor) -> Option<String> {
    if matches!(
        descriptor.category,
        Category::Ids | Category::StructureType | Category::Unclassified
    ) {
        return None;
    }
    let name = descriptor.normalized_name.as_str();
    if let Some((_, s)) = SYMBOL_OVERRIDES.iter().find(|(k, _)| *k == name) {
        return Some(s.to_string());
    }

    let mut tokens: Vec<&str> = name.split('_').collect();
    let mut trailing: Vec<String> = Vec::new();
    match descriptor.category {
        Category::ProjectedApertures if tokens.len() > 2 => {
            trailing.push(format!("proj {}", tokens[1]));
            tokens.drain(..2);
        }
        Category::RvmaxQuantities => trailing.push("RVmax".to_string()),
        _ => {}
    }

    let first = tokens.first().copied().unwrap_or_default();
    let (stem, base, implied) = STEMS.iter().find(|(stem, _, _)| first.starts_with(stem))?;

    let mut subscript: Vec<String> = Vec::new();
    if !implied.is_empty() {
        subscript.push(implied.to_string());
    }
    let leftover = &first[stem.len()..];
    if !leftover.is_empty() {
        subscript.push(leftover.to_string());
    }
    for token in tokens.iter().skip(1) {
        match (*token, subscript.last_mut()) {
            ("kpc", Some(last)) => last.push_str(" kpc"),
            _ => subscript.push(token.to_string()),
        }
    }
    subscript.extend(trailing);

    Some(if subscript.is_empty() {
        base.to_string()
    } else {
        format!(r"{}_{{\rm {}}}", base, subscript.join(", "))
    })
}

/// Label for a field descriptor expressed in `unit`.
pub fn label_for_descriptor(descriptor: &FieldDescriptor, unit: &Unit) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(text) = descriptor_text(descriptor) {
        parts.push(text);
    }
    if let Some(sym) = symbol(descriptor) {
        parts.push(format!("${}$", sym));
    }
    if !unit.is_dimensionless() {
        parts.push(format!(r"$\left[{}\right]$", unit.latex()));
    }
    parts.join(" ")
}

/// Label for a raw dataset name such as `"M_200crit"`.
pub fn label_for(raw_name: &str, unit: &Unit) -> String {
    label_for_descriptor(&classify(raw_name), unit)
}

/// Label for a resolved array, using its originating field name.
pub fn label(array: &UnitAwareArray) -> String {
    match array.name() {
        Some(raw) => label_for(raw, array.unit()),
        None if array.unit().is_dimensionless() => String::new(),
        None => format!(r"$\left[{}\right]$", array.unit().latex()),
    }
}

/// Y-axis label for a mass function binned in `M_{sub_label}`.
pub fn mass_function_label(sub_label: &str, unit: &Unit) -> String {
    let mass = if sub_label.is_empty() {
        "M".to_string()
    } else {
        format!(r"M_{{\rm {}}}", sub_label)
    };
    format!(
        r"${{\rm d}}n({m})/{{\rm d}}\log_{{10}}{m}$ $\left[{u}\right]$",
        m = mass,
        u = unit.latex()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msun() -> Unit {
        Unit::named("Msun").unwrap()
    }

    #[test]
    fn mass_label_has_symbol_and_unit() {
        let label = label_for("M_200crit", &msun());
        assert_eq!(label, r"Mass $M_{\rm 200crit}$ $\left[{\rm M}_\odot\right]$");
    }

    #[test]
    fn particle_type_prefixes_descriptor() {
        let label = label_for("Aperture_mass_star_30_kpc", &msun());
        assert!(label.starts_with("Stellar Mass $M_{\\rm star, 30 kpc}$"), "{}", label);
        let label = label_for("Mass_bh", &msun());
        assert!(label.starts_with("Black Hole Mass"), "{}", label);
    }

    #[test]
    fn dimensionless_omits_bracket() {
        let label = label_for("cNFW", &Unit::dimensionless());
        assert_eq!(label, r"Concentration $c_{\rm NFW}$");
    }

    #[test]
    fn unknown_fields_keep_only_the_unit() {
        let kpc = Unit::named("kpc").unwrap();
        assert_eq!(label_for("Mystery", &kpc), r"$\left[{\rm kpc}\right]$");
        assert_eq!(label_for("Mystery", &Unit::dimensionless()), "");
    }

    #[test]
    fn stems_strip_prefixes() {
        let kms: Unit = "km/s".parse().unwrap();
        assert!(label_for("Vmax", &kms).contains(r"$v_{\rm max}$"));
        assert!(label_for("sigV_gas", &kms).contains(r"$\sigma_{\rm gas}$"));
        assert!(label_for("RVmax_sigV", &kms).contains(r"$\sigma_{\rm RVmax}$"));
        let mpc = Unit::named("Mpc").unwrap();
        assert!(label_for("Xcmbp", &mpc).contains(r"$x_{\rm mbp}$"));
        assert!(label_for("Projected_aperture_2_rhalfmass_star_30_kpc", &mpc)
            .contains(r"$R_{\rm 1/2, star, 30 kpc, proj 2}$"));
    }

    #[test]
    fn array_label_uses_field_name() {
        let arr = UnitAwareArray::new(vec![1.0], msun()).with_name("Mass_200crit");
        assert!(label(&arr).contains(r"M_{\rm 200crit}"));
        let unnamed = UnitAwareArray::new(vec![1.0], msun());
        assert_eq!(label(&unnamed), r"$\left[{\rm M}_\odot\right]$");
    }

    #[test]
    fn mass_function_label_renders_inverse_volume() {
        let unit: Unit = "1/Mpc**3".parse().unwrap();
        let label = mass_function_label("200crit", &unit);
        assert_eq!(
            label,
            r"${\rm d}n(M_{\rm 200crit})/{\rm d}\log_{10}M_{\rm 200crit}$ $\left[{\rm Mpc}^{-3}\right]$"
        );
    }
}
