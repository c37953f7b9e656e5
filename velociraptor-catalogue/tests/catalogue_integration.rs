use velociraptor_catalogue::source::MemorySource;
use velociraptor_catalogue::{labels, Catalogue, Category, Error};

fn synthetic() -> MemorySource {
    MemorySource::new("synthetic.properties")
        .with_u64("ID", vec![1, 2, 3])
        .with_f64("M_200crit", vec![5.0e12, 1.0e11, 3.0e13])
        .with_dataset_attribute("M_200crit", "U_M exponent", 1.0)
        .with_f64("R_200crit", vec![0.2, 0.05, 0.4])
        .with_f64("Vmax", vec![150.0, 60.0, 400.0])
        .with_f64("Structuretype", vec![10.0, 10.0, 20.0])
        .with_header_attribute("UnitInfo", "Mass_unit_to_solarmass", 1.0)
        .with_header_attribute("UnitInfo", "Length_unit_to_kpc", 1000.0)
        .with_header_attribute("UnitInfo", "Velocity_unit_to_kms", 1.0)
        .with_header_attribute("SimulationInfo", "ScaleFactor", 1.0)
        .with_header_attribute("SimulationInfo", "h_val", 0.7)
        .with_header_attribute("SimulationInfo", "Period", 50.0)
}

#[test]
fn test_mass_resolves_to_solar_masses_with_label() {
    let catalogue = Catalogue::from_source(synthetic()).expect("Failed to open catalogue");

    let masses = catalogue.masses().get("m_200crit").expect("m_200crit missing");
    let msun = masses.to_value("Msun").expect("not a mass");
    assert!((msun[0] / 5.0e12 - 1.0).abs() < 1e-12, "got {}", msun[0]);

    let label = labels::label(masses);
    assert!(label.contains("M_{"), "no mass symbol in {}", label);
    assert!(label.contains(r"{\rm M}_\odot"), "no solar-mass unit in {}", label);
}

#[test]
fn test_fields_are_read_at_most_once() {
    let source = synthetic();
    let reads = source.counter();
    let catalogue = Catalogue::from_source(source).expect("Failed to open catalogue");
    assert_eq!(reads.full_reads("Vmax"), 0, "opening must not read values");

    let first = catalogue.velocities().get("vmax").expect("vmax missing");
    let second = catalogue.get("velocities.vmax").expect("vmax missing");
    assert!(std::ptr::eq(first, second), "cached array must be returned");
    assert_eq!(reads.full_reads("Vmax"), 1);
}

#[test]
fn test_closed_catalogue_refuses_access() {
    let catalogue = Catalogue::from_source(synthetic()).expect("Failed to open catalogue");
    catalogue.radii().get("r_200crit").expect("r_200crit missing");
    catalogue.close();

    assert!(!catalogue.is_open());
    assert!(matches!(catalogue.radii().get("r_200crit"), Err(Error::UseAfterClose)));
    assert!(matches!(catalogue.masses().get("m_200crit"), Err(Error::UseAfterClose)));
}

#[test]
fn test_unknown_field_suggests_close_names() {
    let catalogue = Catalogue::from_source(synthetic()).expect("Failed to open catalogue");
    match catalogue.masses().get("m_200crt") {
        Err(Error::AttributeNotFound {
            category,
            suggestions,
            ..
        }) => {
            assert_eq!(category, "masses");
            assert_eq!(suggestions.first().map(String::as_str), Some("m_200crit"));
        }
        other => panic!("expected AttributeNotFound, got {:?}", other.map(|a| a.len())),
    }
    assert!(matches!(
        catalogue.get("mases.m_200crit"),
        Err(Error::AttributeNotFound { .. })
    ));
}

#[test]
fn test_catalogue_metadata() {
    let catalogue = Catalogue::from_source(synthetic()).expect("Failed to open catalogue");
    assert_eq!(catalogue.number_of_haloes(), 3);
    assert!(catalogue.redshift().abs() < 1e-12);
    assert!(catalogue.group(Category::StructureType).contains("structuretype"));

    let size = catalogue.box_size().to_value("Mpc").expect("not a length");
    assert!((size - 50.0).abs() < 1e-9, "box size {}", size);

    let summary = catalogue.to_string();
    assert!(summary.contains("Haloes: 3"), "{}", summary);
}

#[test]
fn test_absurd_unit_exponents_load_as_dimensionless() {
    let source = synthetic()
        .with_f64("Mass_tot", vec![1.0, 2.0, 3.0])
        .with_dataset_attribute("Mass_tot", "U_L exponent", 2.0e9)
        .with_dataset_attribute("Mass_tot", "U_t exponent", 2.0e9);
    let catalogue = Catalogue::from_source(source).expect("Failed to open catalogue");

    let mass = catalogue.masses().get("mass_tot").expect("mass_tot missing");
    assert!(mass.unit().is_dimensionless(), "unit {}", mass.unit());
    assert_eq!(mass.values(), &[1.0, 2.0, 3.0]);
    assert!(catalogue.masses().get("m_200crit").is_ok());
}
