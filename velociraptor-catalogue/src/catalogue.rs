//! The catalogue facade.
//!
//! Opening a catalogue reads only metadata: the `UnitInfo` and
//! `SimulationInfo` headers, the list of datasets and their unit attributes.
//! Each dataset is classified into a [`Category`] and registered in that
//! category's [`PropertyGroup`], where it stays unread until first access.
//!
//! ```
//! use velociraptor_catalogue::source::MemorySource;
//! use velociraptor_catalogue::Catalogue;
//!
//! let source = MemorySource::new("synthetic")
//!     .with_f64("Mass_200crit", vec![1.0, 2.0])
//!     .with_header_attribute("UnitInfo", "Mass_unit_to_solarmass", 1.0e10);
//! let catalogue = Catalogue::from_source(source).unwrap();
//!
//! let masses = catalogue.get("masses.mass_200crit").unwrap();
//! assert_eq!(masses.to_value("Msun").unwrap(), vec![1.0e10, 2.0e10]);
//! ```

use crate::error::{Error, Result};
use crate::properties::PropertyGroup;
use crate::registration::{classify, Category, FieldDescriptor, UnitKind};
use crate::source::Source;
use crate::units::{build_registry, Cosmology, UnitRegistry, UnitSystem};
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use velociraptor_units::{Quantity, UnitAwareArray};

#[cfg(feature = "hdf5")]
use std::path::Path;

/// Shared owner of an open [`Source`].
///
/// Every [`PropertyGroup`] of a catalogue holds an `Rc` to the same handle.
/// [`close`](Self::close) drops the source; the groups see it immediately.
pub struct CatalogueHandle {
    source: RefCell<Option<Box<dyn Source>>>,
    description: String,
    scale_factor: f64,
    h: f64,
}

impl CatalogueHandle {
    pub fn new(source: Box<dyn Source>, scale_factor: f64, h: f64) -> Self {
        Self {
            description: source.describe(),
            source: RefCell::new(Some(source)),
            scale_factor,
            h,
        }
    }

    pub fn is_open(&self) -> bool {
        self.source.borrow().is_some()
    }

    pub fn close(&self) {
        if self.source.borrow_mut().take().is_some() {
            tracing::debug!(source = %self.description, "closed catalogue source");
        }
    }

    /// Runs `f` against the open source.
    pub fn with_source<T>(&self, f: impl FnOnce(&dyn Source) -> Result<T>) -> Result<T> {
        let guard = self.source.borrow();
        let source = guard.as_deref().ok_or(Error::UseAfterClose)?;
        f(source)
    }

    /// `(a, h)` used when resolving values.
    pub fn scaling(&self) -> (f64, f64) {
        (self.scale_factor, self.h)
    }

    pub fn describe(&self) -> &str {
        &self.description
    }
}

/// A Velociraptor `.properties` catalogue.
pub struct Catalogue {
    handle: Rc<CatalogueHandle>,
    units: UnitSystem,
    registry: UnitRegistry,
    descriptors: Vec<FieldDescriptor>,
    /// One group per category, indexed by `Category as usize`.
    groups: Vec<PropertyGroup>,
    number_of_haloes: usize,
    has_halo_ids: bool,
    /// `ID` value to row, built on the first [`Catalogue::row_of_halo`].
    halo_rows: OnceCell<HashMap<u64, usize>>,
}

/// Datasets that hold exactly one value per halo, tried in order when
/// counting haloes.
const PER_HALO_FIELDS: &[&str] = &["ID", "Structuretype", "npart", "Mass_tot", "hostHaloID"];

impl Catalogue {
    /// Opens a catalogue file on disk.
    ///
    /// # Errors
    /// [`Error::FileNotFound`] or [`Error::Format`] if the file cannot be
    /// opened; errors reading dataset metadata.
    #[cfg(feature = "hdf5")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(crate::source::Hdf5Source::open(path)?)
    }

    /// Builds a catalogue over any [`Source`].
    pub fn from_source<S: Source + 'static>(source: S) -> Result<Self> {
        let units = UnitSystem::from_source(&source);
        let names = source.dataset_names()?;
        let descriptors: Vec<FieldDescriptor> = names.iter().map(|n| classify(n)).collect();
        let registry = build_registry(&source, &units, &descriptors)?;

        let number_of_haloes = match halo_count_field(&names) {
            Some(name) => source.dataset_len(name)?,
            None => 0,
        };
        let has_halo_ids = names.iter().any(|n| n == "ID");

        let handle = Rc::new(CatalogueHandle::new(
            Box::new(source),
            units.cosmology.scale_factor,
            units.cosmology.h,
        ));
        let mut groups: Vec<PropertyGroup> = Category::ALL
            .iter()
            .map(|&c| PropertyGroup::new(c, Rc::clone(&handle)))
            .collect();
        for descriptor in &descriptors {
            let spec = registry.spec(&descriptor.raw_name);
            groups[descriptor.category as usize].insert(descriptor.clone(), spec);
        }

        tracing::info!(
            source = %handle.describe(),
            fields = descriptors.len(),
            haloes = number_of_haloes,
            redshift = units.cosmology.redshift(),
            "opened Velociraptor catalogue"
        );

        Ok(Self {
            handle,
            units,
            registry,
            descriptors,
            groups,
            number_of_haloes,
            has_halo_ids,
            halo_rows: OnceCell::new(),
        })
    }

    pub fn group(&self, category: Category) -> &PropertyGroup {
        &self.groups[category as usize]
    }

    /// Looks a group up by its category name (`"masses"`).
    pub fn group_by_name(&self, name: &str) -> Result<&PropertyGroup> {
        name.parse::<Category>()
            .map(|c| self.group(c))
            .map_err(|_| Error::AttributeNotFound {
                category: "catalogue".to_string(),
                name: name.to_string(),
                suggestions: closest(name, Category::ALL.iter().map(|c| c.name())),
            })
    }

    /// Resolves a dotted path such as `"masses.mass_200crit"`.
    pub fn get(&self, path: &str) -> Result<&UnitAwareArray> {
        let (group, name) = path.split_once('.').ok_or_else(|| Error::AttributeNotFound {
            category: "catalogue".to_string(),
            name: path.to_string(),
            suggestions: Vec::new(),
        })?;
        self.group_by_name(group)?.get(name)
    }

    pub fn redshift(&self) -> f64 {
        self.units.cosmology.redshift()
    }

    pub fn scale_factor(&self) -> f64 {
        self.units.cosmology.scale_factor
    }

    pub fn h(&self) -> f64 {
        self.units.cosmology.h
    }

    /// Box side length, physical, in Mpc.
    pub fn box_size(&self) -> Quantity {
        let spec = self.units.spec_for_kind(UnitKind::Length);
        let (a, h) = self.handle.scaling();
        let size = spec.apply(vec![self.units.cosmology.period], a, h);
        Quantity::new(size[0], size.unit().clone())
    }

    /// Box volume, physical, in Mpc**3.
    pub fn box_volume(&self) -> Quantity {
        let size = self.box_size();
        Quantity::new(size.value.powi(3), size.unit.powi(3))
    }

    pub fn cosmology(&self) -> &Cosmology {
        &self.units.cosmology
    }

    pub fn units(&self) -> &UnitSystem {
        &self.units
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Number of haloes, taken from the length of `ID`.
    ///
    /// Catalogues without `ID` fall back to another per-halo field and, if
    /// none is present, to the first dataset in file order.
    pub fn number_of_haloes(&self) -> usize {
        self.number_of_haloes
    }

    /// Whether the file carries an `ID` dataset.
    pub fn has_halo_ids(&self) -> bool {
        self.has_halo_ids
    }

    /// Row holding `halo_id`, or `None` if no halo has that id.
    ///
    /// The `ID` dataset is read once, on the first call. Without `ID`, halo
    /// ids are `row + 1`.
    ///
    /// # Errors
    /// [`Error::UseAfterClose`] if the catalogue was closed before the index
    /// was built; read errors for `ID`.
    pub fn row_of_halo(&self, halo_id: u64) -> Result<Option<usize>> {
        if !self.has_halo_ids {
            let row = halo_id
                .checked_sub(1)
                .and_then(|r| usize::try_from(r).ok())
                .filter(|&r| r < self.number_of_haloes);
            return Ok(row);
        }
        let rows = self.halo_rows.get_or_try_init(|| {
            let ids = self.handle.with_source(|s| s.read_u64("ID"))?;
            tracing::debug!(haloes = ids.len(), "indexed catalogue halo ids");
            Ok::<_, Error>(ids.into_iter().enumerate().map(|(row, id)| (id, row)).collect())
        })?;
        Ok(rows.get(&halo_id).copied())
    }

    /// Classification of every dataset, in file order.
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    pub fn describe(&self) -> &str {
        self.handle.describe()
    }

    /// Releases the file. Every later property access fails with
    /// [`Error::UseAfterClose`].
    pub fn close(&self) {
        self.handle.close();
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }
}

macro_rules! group_accessors {
    ($($method:ident => $category:ident),* $(,)?) => {
        impl Catalogue {
            $(
                pub fn $method(&self) -> &PropertyGroup {
                    self.group(Category::$category)
                }
            )*
        }
    };
}

group_accessors! {
    metallicity => Metallicity,
    ids => Ids,
    energies => Energies,
    stellar_age => StellarAge,
    spherical_overdensities => SphericalOverdensities,
    rotational_support => RotationalSupport,
    star_formation_rate => StarFormationRate,
    rvmax_quantities => RvmaxQuantities,
    masses => Masses,
    eigenvectors => Eigenvectors,
    radii => Radii,
    temperature => Temperature,
    velocity_dispersion => VelocityDispersion,
    angular_momentum => AngularMomentum,
    spin => Spin,
    projected_apertures => ProjectedApertures,
    apertures => Apertures,
    number => Number,
    velocities => Velocities,
    positions => Positions,
    concentration => Concentration,
    structure_type => StructureType,
    unclassified => Unclassified,
}

fn halo_count_field(names: &[String]) -> Option<&str> {
    PER_HALO_FIELDS
        .iter()
        .find_map(|field| names.iter().find(|n| n == field))
        .or(names.first())
        .map(String::as_str)
}

fn closest<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut ranked: Vec<(usize, &str)> = candidates
        .map(|c| (strsim::levenshtein(name, c), c))
        .collect();
    ranked.sort();
    ranked.into_iter().take(3).map(|(_, c)| c.to_string()).collect()
}

impl fmt::Display for Catalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Velociraptor catalogue: {}", self.describe())?;
        writeln!(
            f,
            "Redshift: {:.3} (a = {:.3}, h = {:.3})",
            self.redshift(),
            self.scale_factor(),
            self.h()
        )?;
        writeln!(f, "Haloes: {}", self.number_of_haloes)?;
        write!(f, "Fields:")?;
        for group in self.groups.iter().filter(|g| !g.is_empty()) {
            write!(f, "\n  {} ({})", group.category(), group.len())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalogue")
            .field("source", &self.describe())
            .field("open", &self.is_open())
            .field("fields", &self.descriptors.len())
            .finish()
    }
}
