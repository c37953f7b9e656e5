#![cfg(feature = "hdf5")]

use hdf5::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use velociraptor_catalogue::particles::load_groups;
use velociraptor_catalogue::{Catalogue, Error};

fn write_f64(file: &File, name: &str, values: &[f64]) -> hdf5::Result<hdf5::Dataset> {
    file.new_dataset_builder().with_data(values).create(name)
}

fn write_u64(file: &File, name: &str, values: &[u64]) -> hdf5::Result<hdf5::Dataset> {
    file.new_dataset_builder().with_data(values).create(name)
}

fn write_header(file: &File, group: &str, attributes: &[(&str, f64)]) -> hdf5::Result<()> {
    let group = file.create_group(group)?;
    for (name, value) in attributes {
        group.new_attr::<f64>().create(*name)?.write_scalar(value)?;
    }
    Ok(())
}

fn write_properties(path: &Path) -> hdf5::Result<()> {
    let file = File::create(path)?;
    write_u64(&file, "ID", &[7, 123, 200])?;
    write_f64(&file, "Mass_200crit", &[1.0, 2.0, 3.0])?;
    let radius = write_f64(&file, "R_200crit", &[0.2, 0.4, 0.6])?;
    radius.new_attr::<f64>().create("U_L exponent")?.write_scalar(&1.0)?;
    radius.new_attr::<f64>().create("a-scale exponent")?.write_scalar(&1.0)?;
    write_header(
        &file,
        "UnitInfo",
        &[
            ("Mass_unit_to_solarmass", 1.0e10),
            ("Length_unit_to_kpc", 1000.0),
            ("Velocity_unit_to_kms", 1.0),
            ("Comoving_or_Physical", 1.0),
            ("Cosmological_Sim", 1.0),
        ],
    )?;
    write_header(
        &file,
        "SimulationInfo",
        &[("ScaleFactor", 0.5), ("h_val", 0.7), ("Period", 100.0)],
    )
}

/// Halo ids are stored in a different order than the properties file.
fn write_groups(groups: &Path, particles: &Path) -> hdf5::Result<()> {
    let file = File::create(groups)?;
    write_u64(&file, "Halo_ID", &[123, 7, 200])?;
    write_u64(&file, "Offset", &[0, 3, 5])?;
    write_u64(&file, "Offset_unbound", &[2, 5, 6])?;
    write_u64(&file, "Group_Size", &[3, 2, 2])?;

    let file = File::create(particles)?;
    write_u64(&file, "Particle_IDs", &(1000..1007).collect::<Vec<u64>>())?;
    Ok(())
}

struct Fixture {
    _dir: TempDir,
    properties: PathBuf,
    groups: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let properties = dir.path().join("halos_0008.properties.0");
    let groups = dir.path().join("halos_0008.catalog_groups.0");
    let particles = dir.path().join("halos_0008.catalog_particles.0");
    write_properties(&properties).expect("Failed to write properties file");
    write_groups(&groups, &particles).expect("Failed to write groups files");
    Fixture {
        _dir: dir,
        properties,
        groups,
    }
}

#[test]
fn test_hdf5_catalogue_reads_headers_and_fields() {
    let fixture = fixture();
    let catalogue = Catalogue::load(&fixture.properties).expect("Failed to open catalogue");

    assert_eq!(catalogue.number_of_haloes(), 3);
    assert!((catalogue.redshift() - 1.0).abs() < 1e-12);
    assert_eq!(catalogue.h(), 0.7);
    let size = catalogue.box_size().to_value("Mpc").expect("not a length");
    assert!((size - 50.0).abs() < 1e-9, "box size {}", size);

    let masses = catalogue.masses().get("mass_200crit").expect("mass_200crit missing");
    assert_eq!(masses.to_value("Msun").expect("not a mass"), vec![1.0e10, 2.0e10, 3.0e10]);

    // Explicit length exponent, comoving: 0.2 Mpc at a = 0.5.
    let radii = catalogue.radii().get("r_200crit").expect("r_200crit missing");
    let mpc = radii.to_value("Mpc").expect("not a length");
    assert!((mpc[0] - 0.1).abs() < 1e-12, "radius {}", mpc[0]);
}

#[test]
fn test_hdf5_fields_are_read_on_first_access() {
    let fixture = fixture();
    let catalogue = Catalogue::load(&fixture.properties).expect("Failed to open catalogue");
    catalogue.masses().get("mass_200crit").expect("mass_200crit missing");
    catalogue.close();

    assert!(catalogue.masses().get("mass_200crit").is_err());
    assert!(matches!(catalogue.radii().get("r_200crit"), Err(Error::UseAfterClose)));
}

#[test]
fn test_hdf5_groups_extract_halo_with_properties() {
    let fixture = fixture();
    let catalogue = Catalogue::load(&fixture.properties).expect("Failed to open catalogue");
    let handle = load_groups(&fixture.groups, Some(&catalogue)).expect("Failed to open groups");
    assert_eq!(handle.table().len(), 3);

    let (bound, unbound) = handle.extract_halo(123).expect("halo 123 missing");
    assert_eq!(bound.particle_ids, vec![1000, 1001]);
    assert_eq!(unbound.particle_ids, vec![1002]);
    let mass = bound
        .properties
        .expect("properties should be joined")
        .mass_200crit
        .expect("mass_200crit missing");
    assert!((mass.to_value("Msun").unwrap() - 2.0e10).abs() < 1.0);

    let (bound, unbound) = handle.extract_halo(200).expect("halo 200 missing");
    assert_eq!((bound.particle_ids, unbound.particle_ids), (vec![1005], vec![1006]));
    assert!(matches!(handle.extract_halo(8), Err(Error::HaloNotFound(8))));
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("halos_0008.properties.0");
    match Catalogue::load(&missing) {
        Err(Error::FileNotFound { path }) => assert_eq!(path, missing),
        other => panic!("expected FileNotFound, got {:?}", other.map(|c| c.number_of_haloes())),
    }
}

#[test]
fn test_non_hdf5_file_is_format_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let text = dir.path().join("halos_0008.properties.0");
    std::fs::write(&text, "not an hdf5 file\n").expect("Failed to write text file");
    assert!(matches!(Catalogue::load(&text), Err(Error::Format { .. })));
}
